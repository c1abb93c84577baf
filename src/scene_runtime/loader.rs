use std::fmt;

use anyhow::{ensure, Context, Result};

use crate::renderer_wgpu::model_loader::{load_model_bytes, ModelData};
use crate::renderer_wgpu::texture::RgbaImage;
use crate::scene_core::config::LaunchConfig;

pub const GROUND_TEXTURE: &str = "texture/grass.jpg";
pub const ROAD_TEXTURE: &str = "texture/road.jpg";
/// Cube faces in +X, -X, +Y, -Y, +Z, -Z order. The side faces share one image.
pub const SKY_FACES: [&str; 6] = [
    "texture/sky/posx.jpg",
    "texture/sky/posx.jpg",
    "texture/sky/posy.jpg",
    "texture/sky/negy.jpg",
    "texture/sky/posx.jpg",
    "texture/sky/posx.jpg",
];
pub const CAR_MODEL: &str = "model/car/scene.gltf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Ground,
    Road,
    Sky,
    Car,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [Self::Ground, Self::Road, Self::Sky, Self::Car];

    /// Asset-relative paths this kind is built from.
    pub fn paths(self) -> &'static [&'static str] {
        match self {
            Self::Ground => &[GROUND_TEXTURE],
            Self::Road => &[ROAD_TEXTURE],
            Self::Sky => &SKY_FACES,
            Self::Car => &[CAR_MODEL],
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ground => "ground texture",
            Self::Road => "road texture",
            Self::Sky => "sky box",
            Self::Car => "car model",
        })
    }
}

pub enum AssetPayload {
    Texture(RgbaImage),
    SkyFaces(Box<[RgbaImage; 6]>),
    Model(ModelData),
}

pub struct LoadedAsset {
    pub kind: AssetKind,
    pub result: Result<AssetPayload>,
}

/// Turn the raw bytes of every path in `kind.paths()` into a payload.
pub fn decode(kind: AssetKind, files: Vec<Vec<u8>>) -> Result<AssetPayload> {
    let paths = kind.paths();
    ensure!(
        files.len() == paths.len(),
        "{kind} needs {} files, got {}",
        paths.len(),
        files.len()
    );

    match kind {
        AssetKind::Ground | AssetKind::Road => {
            let image = RgbaImage::decode(&files[0])
                .with_context(|| format!("failed to decode {}", paths[0]))?;
            Ok(AssetPayload::Texture(image))
        }
        AssetKind::Sky => {
            let faces = files
                .iter()
                .zip(paths)
                .map(|(bytes, path)| {
                    RgbaImage::decode(bytes).with_context(|| format!("failed to decode {path}"))
                })
                .collect::<Result<Vec<_>>>()?;
            let faces: [RgbaImage; 6] = faces
                .try_into()
                .map_err(|_| anyhow::anyhow!("sky box needs exactly six faces"))?;
            Ok(AssetPayload::SkyFaces(Box::new(faces)))
        }
        AssetKind::Car => {
            let model = load_model_bytes(&files[0])
                .with_context(|| format!("failed to parse {}", paths[0]))?;
            Ok(AssetPayload::Model(model))
        }
    }
}

// ---------------------------------------------------------------------------
// AssetFetcher trait: platform-specific background loading
// ---------------------------------------------------------------------------

trait AssetFetcher {
    fn new_fetcher(config: &LaunchConfig) -> Result<Self>
    where
        Self: Sized;
    fn request(&mut self, kind: AssetKind);
    fn poll(&mut self) -> Vec<LoadedAsset>;
    fn pending_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Native: file reads and decoding on a rayon pool
// ---------------------------------------------------------------------------

#[cfg(not(target_arch = "wasm32"))]
mod threaded {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::mpsc::{self, Receiver, Sender};

    use rayon::{ThreadPool, ThreadPoolBuilder};

    use crate::renderer_wgpu::model_loader::load_model_file;

    pub struct ThreadedFetcher {
        pool: ThreadPool,
        sender: Sender<LoadedAsset>,
        receiver: Receiver<LoadedAsset>,
        pending: HashSet<AssetKind>,
        config: LaunchConfig,
    }

    fn load(config: &LaunchConfig, kind: AssetKind) -> Result<AssetPayload> {
        if kind == AssetKind::Car {
            // external buffers and images resolve relative to the file
            let path = config.asset_path(CAR_MODEL);
            return load_model_file(Path::new(&path)).map(AssetPayload::Model);
        }

        let files = kind
            .paths()
            .iter()
            .map(|relative| {
                let path = config.asset_path(relative);
                std::fs::read(&path).with_context(|| format!("failed to read {path}"))
            })
            .collect::<Result<Vec<_>>>()?;
        decode(kind, files)
    }

    impl AssetFetcher for ThreadedFetcher {
        fn new_fetcher(config: &LaunchConfig) -> Result<Self> {
            let pool = ThreadPoolBuilder::new()
                .num_threads(AssetKind::ALL.len())
                .thread_name(|i| format!("asset-load-{i}"))
                .build()?;
            let (sender, receiver) = mpsc::channel();
            Ok(Self {
                pool,
                sender,
                receiver,
                pending: HashSet::new(),
                config: config.clone(),
            })
        }

        fn request(&mut self, kind: AssetKind) {
            if !self.pending.insert(kind) {
                return;
            }
            let tx = self.sender.clone();
            let config = self.config.clone();
            self.pool.spawn(move || {
                let result = load(&config, kind);
                let _ = tx.send(LoadedAsset { kind, result });
            });
        }

        fn poll(&mut self) -> Vec<LoadedAsset> {
            let mut completed = Vec::new();
            while let Ok(asset) = self.receiver.try_recv() {
                self.pending.remove(&asset.kind);
                completed.push(asset);
            }
            completed
        }

        fn pending_count(&self) -> usize {
            self.pending.len()
        }
    }
}

// ---------------------------------------------------------------------------
// Wasm: browser fetch driven by spawn_local
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use anyhow::anyhow;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    pub struct WebFetcher {
        completed: Rc<RefCell<Vec<LoadedAsset>>>,
        pending: HashSet<AssetKind>,
        config: LaunchConfig,
    }

    fn js_error(value: JsValue) -> anyhow::Error {
        anyhow!("{value:?}")
    }

    async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
        let window = web_sys::window().context("no browser window")?;
        let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        ensure!(response.ok(), "HTTP {} fetching {url}", response.status());
        let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    async fn load(config: LaunchConfig, kind: AssetKind) -> Result<AssetPayload> {
        let mut files = Vec::with_capacity(kind.paths().len());
        for relative in kind.paths() {
            let url = config.asset_path(relative);
            files.push(
                fetch_bytes(&url)
                    .await
                    .with_context(|| format!("failed to fetch {url}"))?,
            );
        }
        decode(kind, files)
    }

    impl AssetFetcher for WebFetcher {
        fn new_fetcher(config: &LaunchConfig) -> Result<Self> {
            Ok(Self {
                completed: Rc::new(RefCell::new(Vec::new())),
                pending: HashSet::new(),
                config: config.clone(),
            })
        }

        fn request(&mut self, kind: AssetKind) {
            if !self.pending.insert(kind) {
                return;
            }
            let completed = Rc::clone(&self.completed);
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = load(config, kind).await;
                completed.borrow_mut().push(LoadedAsset { kind, result });
            });
        }

        fn poll(&mut self) -> Vec<LoadedAsset> {
            let completed: Vec<LoadedAsset> = self.completed.borrow_mut().drain(..).collect();
            for asset in &completed {
                self.pending.remove(&asset.kind);
            }
            completed
        }

        fn pending_count(&self) -> usize {
            self.pending.len()
        }
    }
}

// ---------------------------------------------------------------------------
// SceneAssets: the frame loop's view of loading
// ---------------------------------------------------------------------------

#[cfg(not(target_arch = "wasm32"))]
type PlatformFetcher = threaded::ThreadedFetcher;
#[cfg(target_arch = "wasm32")]
type PlatformFetcher = web::WebFetcher;

pub struct SceneAssets {
    fetcher: PlatformFetcher,
}

impl SceneAssets {
    pub fn new(config: &LaunchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: PlatformFetcher::new_fetcher(config)?,
        })
    }

    pub fn request_all(&mut self) {
        for kind in AssetKind::ALL {
            log::info!("loading {kind} from {:?}", kind.paths());
            self.fetcher.request(kind);
        }
    }

    /// Loads that finished since the last poll, in completion order.
    pub fn poll(&mut self) -> Vec<LoadedAsset> {
        self.fetcher.poll()
    }

    pub fn pending_count(&self) -> usize {
        self.fetcher.pending_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(rgb: [u8; 3]) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::from_pixel(2, 2, image::Rgb(rgb))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn every_kind_has_paths() {
        assert_eq!(AssetKind::Sky.paths().len(), 6);
        for kind in AssetKind::ALL {
            assert!(!kind.paths().is_empty());
        }
        assert_eq!(AssetKind::Sky.paths()[2], "texture/sky/posy.jpg");
        assert_eq!(AssetKind::Sky.paths()[3], "texture/sky/negy.jpg");
    }

    #[test]
    fn decodes_a_texture() {
        let payload = decode(AssetKind::Road, vec![png([1, 2, 3])]).unwrap();
        let AssetPayload::Texture(image) = payload else {
            panic!("expected a texture");
        };
        assert_eq!((image.width, image.height), (2, 2));
    }

    #[test]
    fn decodes_six_sky_faces_in_order() {
        let files = (0..6u8).map(|i| png([i, 0, 0])).collect();
        let AssetPayload::SkyFaces(faces) = decode(AssetKind::Sky, files).unwrap() else {
            panic!("expected sky faces");
        };
        for (i, face) in faces.iter().enumerate() {
            assert_eq!(face.pixels[0], i as u8);
        }
    }

    #[test]
    fn wrong_file_count_is_an_error() {
        assert!(decode(AssetKind::Sky, vec![png([0, 0, 0])]).is_err());
        assert!(decode(AssetKind::Ground, Vec::new()).is_err());
    }

    #[test]
    fn corrupt_texture_reports_its_path() {
        let err = decode(AssetKind::Ground, vec![b"junk".to_vec()])
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("texture/grass.jpg"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_files_arrive_as_errors() {
        let config = LaunchConfig {
            asset_root: "/nonexistent/car-road-assets".to_string(),
        };
        let mut assets = SceneAssets::new(&config).unwrap();
        assets.request_all();
        assets.request_all();
        assert!(assets.pending_count() <= AssetKind::ALL.len());

        let mut results = Vec::new();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while results.len() < AssetKind::ALL.len() && std::time::Instant::now() < deadline {
            results.extend(assets.poll());
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(results.len(), AssetKind::ALL.len());
        assert!(results.iter().all(|r| r.result.is_err()));
        assert_eq!(assets.pending_count(), 0);
    }
}

pub mod loader;

pub use loader::{AssetKind, AssetPayload, LoadedAsset, SceneAssets};

use anyhow::{ensure, Result};

/// Decoded RGBA8 pixels, ready to upload.
#[derive(Debug, Clone)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "image has zero size {width}x{height}");
        ensure!(
            pixels.len() == (width * height * 4) as usize,
            "expected {} RGBA bytes for {width}x{height}, got {}",
            width * height * 4,
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    /// Fails when either side exceeds `max_dimension`.
    pub fn check_fits(&self, max_dimension: u32) -> Result<()> {
        ensure!(
            self.width <= max_dimension && self.height <= max_dimension,
            "image is {}x{}, device limit is {max_dimension}",
            self.width,
            self.height
        );
        Ok(())
    }
}

/// Six faces of one square size, each within `max_dimension`.
pub fn check_cube_faces(faces: &[RgbaImage; 6], max_dimension: u32) -> Result<()> {
    let (width, height) = (faces[0].width, faces[0].height);
    ensure!(width == height, "cube faces must be square, got {width}x{height}");
    for (i, face) in faces.iter().enumerate() {
        ensure!(
            face.width == width && face.height == height,
            "cube face {i} is {}x{}, expected {width}x{height}",
            face.width,
            face.height
        );
    }
    faces[0].check_fits(max_dimension)
}

pub struct GpuTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    _texture: wgpu::Texture,
}

impl GpuTexture {
    /// sRGB 2D texture with a repeating, linearly filtered sampler.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Result<Self> {
        image.check_fits(device.limits().max_texture_dimension_2d)?;
        Ok(Self::build_2d(device, queue, image, label))
    }

    fn build_2d(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = create_texture(device, size, label);
        write_layer(queue, &texture, image, 0);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label}-sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            view,
            sampler,
            _texture: texture,
        }
    }

    /// 1x1 white stand-in for untextured materials.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let image = RgbaImage {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        Self::build_2d(device, queue, &image, "white")
    }

    /// Cube map from six faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn cube_from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[RgbaImage; 6],
        label: &str,
    ) -> Result<Self> {
        check_cube_faces(faces, device.limits().max_texture_dimension_2d)?;
        Ok(Self::build_cube(device, queue, faces, label))
    }

    /// Uniform white cube shown until the sky faces arrive.
    pub fn white_cube(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let face = RgbaImage {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        let faces = std::array::from_fn(|_| face.clone());
        Self::build_cube(device, queue, &faces, "white-cube")
    }

    fn build_cube(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[RgbaImage; 6],
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: faces[0].width,
            height: faces[0].height,
            depth_or_array_layers: 6,
        };
        let texture = create_texture(device, size, label);
        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, face, layer as u32);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label}-view")),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label}-sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            view,
            sampler,
            _texture: texture,
        }
    }
}

fn create_texture(device: &wgpu::Device, size: wgpu::Extent3d, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &RgbaImage, layer: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_pixel_count() {
        assert!(RgbaImage::new(2, 2, vec![0; 15]).is_err());
        assert!(RgbaImage::new(0, 2, Vec::new()).is_err());
        assert!(RgbaImage::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn decodes_png_to_rgba() {
        let mut png = Vec::new();
        let source = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let decoded = RgbaImage::decode(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(RgbaImage::decode(b"not an image").is_err());
    }

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::new(width, height, vec![0; (width * height * 4) as usize]).unwrap()
    }

    #[test]
    fn oversized_images_do_not_fit() {
        assert!(solid(8, 4).check_fits(8).is_ok());
        assert!(solid(9, 4).check_fits(8).is_err());
        assert!(solid(4, 9).check_fits(8).is_err());
    }

    #[test]
    fn cube_faces_must_be_square() {
        let faces = std::array::from_fn(|_| solid(4, 2));
        let err = check_cube_faces(&faces, 16).unwrap_err();
        assert!(format!("{err}").contains("square"));
        assert!(check_cube_faces(&std::array::from_fn(|_| solid(4, 4)), 16).is_ok());
    }

    #[test]
    fn cube_faces_must_match_and_fit() {
        let mut faces: [RgbaImage; 6] = std::array::from_fn(|_| solid(4, 4));
        faces[5] = solid(2, 2);
        assert!(check_cube_faces(&faces, 16).is_err());

        let large = std::array::from_fn(|_| solid(32, 32));
        assert!(check_cube_faces(&large, 16).is_err());
    }
}

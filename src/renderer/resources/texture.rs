use image::{GenericImageView, ImageFormat};

use crate::assets::{
    error::{CacheError, CacheResult},
    Resource,
};

#[derive(Debug)]
pub struct Texture2D {
    pub name: String,
    pub uuid: uuid::Uuid,

    pub width: u32,
    pub height: u32,
    // RGBA8, row-major
    pub data: Vec<u8>,
}

impl Default for Texture2D {
    fn default() -> Self {
        Texture2D {
            name: String::new(),
            uuid: uuid::Uuid::new_v4(),
            width: 0,
            height: 0,
            data: vec![],
        }
    }
}

impl Texture2D {
    /// Decodes `bytes` with the format implied by the resource name,
    /// falling back to content sniffing.
    pub fn load(&mut self, bytes: &[u8]) -> CacheResult<()> {
        let fail = |err: image::ImageError| CacheError::parse(Self::type_name(), &self.name, err);

        let img = match ImageFormat::from_path(&self.name) {
            Ok(format) => image::load_from_memory_with_format(bytes, format).map_err(fail)?,
            Err(_) => image::load_from_memory(bytes).map_err(fail)?,
        };

        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();

        self.width = dimensions.0;
        self.height = dimensions.1;
        self.data = rgba.into_raw();

        Ok(())
    }
}

impl Resource for Texture2D {
    fn type_name() -> &'static str {
        "Texture2D"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn uuid(&self) -> uuid::Uuid {
        self.uuid
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_to_rgba() {
        let mut tex = Texture2D::default();
        tex.set_name("Textures/red.png");
        tex.load(&png_bytes(2, 3)).unwrap();

        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(tex.data.len(), 2 * 3 * 4);
        assert_eq!(&tex.data[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn icns_is_not_decodable() {
        let mut tex = Texture2D::default();
        tex.set_name("Textures/icon.icns");
        let err = tex.load(b"icns\0\0\0\x08").unwrap_err();
        assert!(matches!(err, CacheError::ParseFailure { kind: "Texture2D", .. }));
    }

    #[test]
    fn garbage_png_fails() {
        let mut tex = Texture2D::default();
        tex.set_name("Textures/bad.png");
        assert!(tex.load(b"not an image").is_err());
        assert!(tex.data.is_empty());
    }
}

use std::path::Path;
use std::rc::Rc;

use image::imageops::FilterType;

/// Decoded RGBA image ready to hand to the renderer
#[derive(Debug, Clone)]
pub struct Pixmap {
    key: String,
    width: u32,
    height: u32,
    rgba: Rc<[u8]>,
}

impl Pixmap {
    /// Load an image file, optionally fitted into a `size`×`size` square with
    /// its aspect ratio kept (nearest-neighbour sampling)
    pub fn load(path: &Path, size: Option<u32>) -> Result<Self, image::ImageError> {
        let mut image = image::open(path)?;
        if let Some(size) = size {
            image = image.resize(size, size, FilterType::Nearest);
        }
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let key = match size {
            Some(size) => format!("{}@{size}", path.display()),
            None => path.display().to_string(),
        };

        Ok(Self {
            key,
            width,
            height,
            rgba: rgba.into_raw().into(),
        })
    }

    /// Identifies the source file and scale, for texture caching
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

//! Rendering: template → layout snapshot → paint commands → raster → PNG

pub mod layout;
pub mod paint;
pub mod raster;
pub mod template;
pub mod text;

pub use layout::{layout_card, wrap_text, LayoutSnapshot, Rect, TextBlock, TextMeasure, TextStyle};
pub use paint::{CoverCrop, PaintCommand};
pub use raster::RenderTarget;
pub use template::CardTemplate;
pub use text::{FontConfig, Fonts};

use sha2::{Digest, Sha256};

/// An exported card image
#[derive(Debug, Clone)]
pub struct CardImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl CardImage {
    /// SHA-256 of the PNG bytes, hex encoded.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_content_addressed() {
        let a = CardImage { width: 1, height: 1, png_data: vec![1, 2, 3] };
        let b = CardImage { width: 2, height: 2, png_data: vec![1, 2, 3] };
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}

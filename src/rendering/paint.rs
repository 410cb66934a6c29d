//! Paint commands: the ordered display list executed by the rasterizer.

use super::layout::{Rect, TextStyle};
use crate::assets::LoadedImage;

/// Backdrop gradient stops, top-left to bottom-right
pub const BACKDROP_STOPS: [(f32, &str); 2] =
    [(0.0, "rgba(12,28,55,0.9)"), (1.0, "rgba(22,54,92,0.9)")];

/// Source crop for an aspect-preserving "cover" fit.
///
/// The crop is centered in the source image and has the destination's
/// aspect ratio; drawing it into the destination scales by `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverCrop {
    pub scale: f32,
    pub sx: f32,
    pub sy: f32,
    pub sw: f32,
    pub sh: f32,
}

impl CoverCrop {
    /// `None` when either the image or the destination is empty.
    pub fn fit(image_w: f32, image_h: f32, dest_w: f32, dest_h: f32) -> Option<Self> {
        if !(image_w > 0.0 && image_h > 0.0 && dest_w > 0.0 && dest_h > 0.0) {
            return None;
        }
        let scale = (dest_w / image_w).max(dest_h / image_h);
        let sw = dest_w / scale;
        let sh = dest_h / scale;
        Some(Self {
            scale,
            sx: (image_w - sw) / 2.0,
            sy: (image_h - sh) / 2.0,
            sw,
            sh,
        })
    }
}

#[derive(Debug, Clone)]
pub enum PaintCommand {
    /// Draw `crop` of `image` into `dest`
    Image {
        image: LoadedImage,
        crop: CoverCrop,
        dest: Rect,
    },
    /// Fill `rect` with a gradient along its diagonal
    LinearGradient {
        rect: Rect,
        stops: Vec<(f32, String)>,
    },
    /// One line of text, top-left aligned at (`x`, `y`)
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
}

impl PaintCommand {
    /// Cover-fit `image` into `dest`; `None` when nothing would be drawn.
    pub fn cover(image: &LoadedImage, dest: Rect) -> Option<Self> {
        let crop = CoverCrop::fit(
            image.width as f32,
            image.height as f32,
            dest.width,
            dest.height,
        )?;
        Some(PaintCommand::Image {
            image: image.clone(),
            crop,
            dest,
        })
    }

    /// The fixed dark-blue backdrop over `width` × `height`.
    pub fn backdrop(width: f32, height: f32) -> Self {
        PaintCommand::LinearGradient {
            rect: Rect::new(0.0, 0.0, width, height),
            stops: BACKDROP_STOPS
                .iter()
                .map(|(pos, color)| (*pos, color.to_string()))
                .collect(),
        }
    }
}

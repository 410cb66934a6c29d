//! Rasterizer: executes paint commands on a tiny-skia render target.

use super::layout::Rect;
use super::paint::{CoverCrop, PaintCommand};
use super::text::{parse_color, Fonts};
use crate::assets::LoadedImage;
use crate::{Error, Result};
use tiny_skia::{
    FilterQuality, GradientStop, LinearGradient, Paint, Pattern, Pixmap, Point, SpreadMode,
    Transform,
};

/// Off-screen surface sized to the card in device pixels.
///
/// Drawing goes through a base transform scaled by the device pixel ratio so
/// callers use logical (CSS pixel) coordinates.
pub struct RenderTarget {
    pixmap: Pixmap,
    transform: Transform,
}

impl RenderTarget {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Result<Self> {
        let (pw, ph) = device_size(width, height, device_pixel_ratio);
        let pixmap = Pixmap::new(pw, ph).ok_or_else(|| {
            Error::ExportError(format!("invalid render target size {}x{}", pw, ph))
        })?;
        log::debug!(
            "render target {}x{} px for {}x{} @{}x",
            pw,
            ph,
            width,
            height,
            device_pixel_ratio
        );
        Ok(Self {
            pixmap,
            transform: Transform::from_scale(device_pixel_ratio, device_pixel_ratio),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Execute `commands` in order; later commands paint over earlier ones.
    pub fn execute(&mut self, commands: &[PaintCommand], fonts: &mut Fonts) -> Result<()> {
        for cmd in commands {
            match cmd {
                PaintCommand::Image { image, crop, dest } => self.draw_cover(image, crop, dest),
                PaintCommand::LinearGradient { rect, stops } => self.fill_gradient(rect, stops)?,
                PaintCommand::Text { x, y, text, style } => {
                    log::debug!("text {:?} at {} {}", text, x, y);
                    fonts.fill_line(&mut self.pixmap, text, *x, *y, style, self.transform)?;
                }
            }
        }
        Ok(())
    }

    fn draw_cover(&mut self, image: &LoadedImage, crop: &CoverCrop, dest: &Rect) {
        let Some(rect) = tiny_skia::Rect::from_xywh(dest.x, dest.y, dest.width, dest.height)
        else {
            return;
        };
        log::debug!(
            "image {}x{} crop ({}, {}, {}, {}) -> {:?}",
            image.width,
            image.height,
            crop.sx,
            crop.sy,
            crop.sw,
            crop.sh,
            dest
        );
        // source pixel (sx, sy) lands on (dest.x, dest.y)
        let pattern_ts = Transform::from_translate(
            dest.x - crop.sx * crop.scale,
            dest.y - crop.sy * crop.scale,
        )
        .pre_scale(crop.scale, crop.scale);
        let paint = Paint {
            shader: Pattern::new(
                image.pixmap().as_ref(),
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                1.0,
                pattern_ts,
            ),
            anti_alias: true,
            ..Default::default()
        };
        self.pixmap.fill_rect(rect, &paint, self.transform, None);
    }

    fn fill_gradient(&mut self, rect: &Rect, stops: &[(f32, String)]) -> Result<()> {
        let Some(area) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return Ok(());
        };
        let stops = stops
            .iter()
            .map(|(pos, color)| Ok(GradientStop::new(*pos, parse_color(color)?)))
            .collect::<Result<Vec<_>>>()?;
        let shader = LinearGradient::new(
            Point::from_xy(rect.x, rect.y),
            Point::from_xy(rect.x + rect.width, rect.y + rect.height),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        )
        .ok_or_else(|| Error::ExportError("degenerate gradient".into()))?;
        let paint = Paint {
            shader,
            anti_alias: false,
            ..Default::default()
        };
        self.pixmap.fill_rect(area, &paint, self.transform, None);
        Ok(())
    }

    /// Premultiplied RGBA pixels.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Serialize the surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::ExportError(format!("PNG encoding failed: {}", e)))
    }
}

/// Pixel size of a `width` × `height` logical box at `dpr`.
pub fn device_size(width: f32, height: f32, dpr: f32) -> (u32, u32) {
    let scale = |v: f32| (v * dpr).round().max(0.0) as u32;
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::text::FontConfig;

    fn no_fonts() -> Fonts {
        Fonts::new(&FontConfig {
            load_system_fonts: false,
            ..Default::default()
        })
    }

    #[test]
    fn target_is_scaled_by_density() {
        let t = RenderTarget::new(120.5, 80.0, 2.0).unwrap();
        assert_eq!((t.width(), t.height()), (241, 160));
        assert_eq!(device_size(10.0, 10.0, 1.5), (15, 15));
    }

    #[test]
    fn zero_sized_target_is_an_error() {
        assert!(matches!(
            RenderTarget::new(0.0, 10.0, 1.0),
            Err(Error::ExportError(_))
        ));
    }

    #[test]
    fn backdrop_paints_every_pixel() {
        let mut t = RenderTarget::new(16.0, 8.0, 1.0).unwrap();
        t.execute(&[PaintCommand::backdrop(16.0, 8.0)], &mut no_fonts())
            .unwrap();
        assert!(t.pixels().chunks(4).all(|px| px[3] > 200));
    }

    #[test]
    fn cover_image_fills_destination_only() {
        let red = LoadedImage::solid(4, 4, [255, 0, 0, 255]).unwrap();
        let cmd = PaintCommand::cover(&red, Rect::new(0.0, 0.0, 4.0, 2.0)).unwrap();
        let mut t = RenderTarget::new(4.0, 4.0, 1.0).unwrap();
        t.execute(&[cmd], &mut no_fonts()).unwrap();

        let px = |x: usize, y: usize| {
            let i = (y * 4 + x) * 4;
            t.pixels()[i..i + 4].to_vec()
        };
        let top = px(1, 0);
        assert!(top[0] > 250 && top[1] < 5 && top[3] > 250, "{:?}", top);
        assert_eq!(px(1, 3), vec![0, 0, 0, 0]);
    }

    #[test]
    fn png_has_signature() {
        let t = RenderTarget::new(3.0, 3.0, 1.0).unwrap();
        let png = t.encode_png().unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }
}

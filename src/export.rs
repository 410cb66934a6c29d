//! Card exporter: replicate the displayed card onto a render target and
//! serialize it as PNG.
//!
//! The sequence is strictly ordered: background, backdrop gradient, photo,
//! decoration, then the three text blocks. Image loads are the only
//! suspension points; drawing and encoding run after all of them resolve,
//! so a failed export never leaves a partial image behind.

use crate::assets::{load_image, AssetSource, LoadedImage};
use crate::rendering::layout::{layout_card, wrap_block, LayoutSnapshot};
use crate::rendering::{CardImage, CardTemplate, Fonts, PaintCommand, Rect, RenderTarget};
use crate::error::EXPORT_ERROR_MESSAGE;
use crate::view::{CardState, CardView, ImageSlot};
use crate::{CardConfig, Error, Result};
use std::path::{Path, PathBuf};

pub struct CardExporter {
    fonts: Fonts,
    background: String,
    device_pixel_ratio: f32,
}

impl CardExporter {
    pub fn new(config: &CardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fonts: Fonts::new(&config.fonts),
            background: config.background.clone(),
            device_pixel_ratio: config.device_pixel_ratio,
        })
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Lay out `state` with `template`, measuring text with the exporter's fonts.
    pub fn snapshot(&mut self, template: &CardTemplate, state: &CardState) -> LayoutSnapshot {
        layout_card(template, state, &mut self.fonts)
    }

    /// Render the card described by `snapshot`, drawing the images held by
    /// `state`, into a PNG.
    pub async fn export(
        &mut self,
        state: &CardState,
        snapshot: &LayoutSnapshot,
        source: &dyn AssetSource,
    ) -> Result<CardImage> {
        let mut target = RenderTarget::new(snapshot.width, snapshot.height, self.device_pixel_ratio)?;
        let mut commands = Vec::new();

        match load_image(source, &self.background).await {
            Ok(bg) => commands.extend(PaintCommand::cover(
                &bg,
                Rect::new(0.0, 0.0, snapshot.width, snapshot.height),
            )),
            Err(e) => log::warn!("background unavailable, using backdrop only: {}", e),
        }
        commands.push(PaintCommand::backdrop(snapshot.width, snapshot.height));

        if let Some(rect) = snapshot.photo {
            if let Some(photo) = wait_for_image(&state.photo, source).await {
                commands.extend(PaintCommand::cover(&photo, rect));
            }
            if state.decoration_visible {
                if let Some(decoration) = wait_for_image(&state.decoration, source).await {
                    commands.extend(PaintCommand::cover(&decoration, rect));
                }
            }
        }

        for block in snapshot.text_blocks() {
            let line_height = block.style.line_height();
            for (i, line) in wrap_block(block, &mut self.fonts).into_iter().enumerate() {
                commands.push(PaintCommand::Text {
                    x: block.rect.x,
                    y: block.rect.y + i as f32 * line_height,
                    text: line,
                    style: block.style.clone(),
                });
            }
        }

        target.execute(&commands, &mut self.fonts)?;
        let png_data = target.encode_png()?;
        // tiny-skia never hands back an empty Ok today; kept so an empty
        // encoding ends in the export message instead of a blank file
        if png_data.is_empty() {
            return Err(Error::EmptyImage);
        }
        log::info!(
            "exported card {}x{} ({} bytes)",
            target.width(),
            target.height(),
            png_data.len()
        );
        Ok(CardImage {
            width: target.width(),
            height: target.height(),
            png_data,
        })
    }
}

/// Resolve an image slot to something drawable.
///
/// Loaded images with a nonzero size resolve immediately; pending ones are
/// loaded now. A failed load resolves to `None` so the export carries on.
pub async fn wait_for_image(slot: &ImageSlot, source: &dyn AssetSource) -> Option<LoadedImage> {
    match slot {
        ImageSlot::Loaded(img) if img.width > 0 && img.height > 0 => Some(img.clone()),
        ImageSlot::Pending(src) => match load_image(source, src).await {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("skipping image: {}", e);
                None
            }
        },
        _ => None,
    }
}

/// Write `image` to `dir/file_name`.
///
/// The bytes go to a `.part` file first and are renamed into place, so an
/// interrupted save never leaves a truncated PNG.
pub async fn save_card(image: &CardImage, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let part = dir.join(format!("{}.part", file_name));
    tokio::fs::write(&part, &image.png_data).await?;
    if let Err(e) = tokio::fs::rename(&part, &path).await {
        tokio::fs::remove_file(&part).await.ok();
        return Err(e.into());
    }
    log::info!("saved {}", path.display());
    Ok(path)
}

/// Export the card and save it under `out_dir`.
///
/// Any failure replaces the card with the generic export message.
pub async fn download_card(
    state: &mut CardState,
    exporter: &mut CardExporter,
    snapshot: &LayoutSnapshot,
    source: &dyn AssetSource,
    out_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let result = match exporter.export(state, snapshot, source).await {
        Ok(image) => save_card(&image, out_dir, file_name).await,
        Err(e) => Err(e),
    };
    if let Err(err) = &result {
        log::warn!("card export failed: {}", err);
        state.show_error(EXPORT_ERROR_MESSAGE);
    }
    result
}

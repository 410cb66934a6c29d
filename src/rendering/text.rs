//! Text shaping, measurement and glyph drawing using cosmic-text.

use super::layout::{TextMeasure, TextStyle};
use crate::{Error, Result};
use cosmic_text::{
    Attrs, Buffer, CacheKeyFlags, Command, Family, FontSystem, Metrics, Shaping, SwashCache,
    Weight,
};
use std::path::PathBuf;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

/// Which fonts to make available for drawing text
#[derive(Debug, Clone)]
pub struct FontConfig {
    /// Whether to load system fonts (default: true)
    pub load_system_fonts: bool,
    /// Directories scanned for font files
    pub font_dirs: Vec<PathBuf>,
    /// Individual font files
    pub font_files: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
            font_files: Vec::new(),
        }
    }
}

/// Font database plus glyph cache
///
/// With no faces loaded, text measures as zero width and draws nothing.
pub struct Fonts {
    font_system: FontSystem,
    swash_cache: SwashCache,
    has_faces: bool,
}

impl Fonts {
    pub fn new(config: &FontConfig) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.font_dirs {
            db.load_fonts_dir(dir);
        }
        for file in &config.font_files {
            if let Err(e) = db.load_font_file(file) {
                log::warn!("failed to load font {}: {}", file.display(), e);
            }
        }
        log::debug!("font database holds {} faces", db.len());
        let has_faces = !db.is_empty();
        if !has_faces {
            log::warn!("no fonts available, card text will not be drawn");
        }

        Self {
            font_system: FontSystem::new_with_locale_and_db("en".to_string(), db),
            swash_cache: SwashCache::new(),
            has_faces,
        }
    }

    pub fn has_faces(&self) -> bool {
        self.has_faces
    }

    /// Shape a single line. Line height equals the font size so the first
    /// line's top is the em-box top.
    fn shape(&mut self, text: &str, style: &TextStyle) -> Buffer {
        let size = style.font_size();
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size));
        let attrs = Attrs::new()
            .family(family(&style.font_family))
            .weight(Weight(style.font_weight))
            .cache_key_flags(CacheKeyFlags::DISABLE_HINTING);
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Fill one line of text with its top-left corner at (`x`, `y`) in
    /// logical coordinates; `transform` maps logical to device pixels.
    pub fn fill_line(
        &mut self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        y: f32,
        style: &TextStyle,
        transform: Transform,
    ) -> Result<()> {
        let color = parse_color(&style.color)?;
        if !self.has_faces {
            return Ok(());
        }
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;

        let buffer = self.shape(text, style);
        for run in buffer.layout_runs() {
            let baseline = y + (run.line_y - run.line_top);
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((x, baseline), 1.0);
                let glyph_x = x + glyph.x + glyph.font_size * glyph.x_offset;
                let glyph_y = baseline + glyph.y - glyph.font_size * glyph.y_offset;

                let Some(commands) = self
                    .swash_cache
                    .get_outline_commands(&mut self.font_system, physical.cache_key)
                else {
                    continue;
                };

                // font outlines are y-up
                let mut pb = PathBuilder::new();
                for cmd in commands {
                    match cmd {
                        Command::MoveTo(p) => pb.move_to(p.x, -p.y),
                        Command::LineTo(p) => pb.line_to(p.x, -p.y),
                        Command::QuadTo(c, p) => pb.quad_to(c.x, -c.y, p.x, -p.y),
                        Command::CurveTo(c1, c2, p) => {
                            pb.cubic_to(c1.x, -c1.y, c2.x, -c2.y, p.x, -p.y)
                        }
                        Command::Close => pb.close(),
                    }
                }
                if let Some(path) = pb.finish() {
                    let ts = Transform::from_translate(glyph_x, glyph_y).post_concat(transform);
                    pixmap.fill_path(&path, &paint, FillRule::Winding, ts, None);
                }
            }
        }
        Ok(())
    }
}

impl TextMeasure for Fonts {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        if !self.has_faces {
            return 0.0;
        }
        let buffer = self.shape(text, style);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }
}

/// Map the first entry of a CSS font-family list to a cosmic-text family.
fn family(list: &str) -> Family<'_> {
    let first = list
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    match first.to_ascii_lowercase().as_str() {
        "" | "sans-serif" | "system-ui" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(first),
    }
}

/// Parse a CSS color into a tiny-skia color.
pub fn parse_color(s: &str) -> Result<tiny_skia::Color> {
    let parsed = csscolorparser::parse(s)
        .map_err(|e| Error::ExportError(format!("bad color {}: {}", s, e)))?;
    let [r, g, b, a] = parsed.to_array();
    Ok(tiny_skia::Color::from_rgba(r, g, b, a).unwrap_or(tiny_skia::Color::BLACK))
}

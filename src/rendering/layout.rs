//! Card layout: positions, sizes and text styles of the card's parts.
//!
//! A [`LayoutSnapshot`] is what the exporter replicates onto the render
//! target. It is produced by [`layout_card`] from a template and the current
//! view state, or supplied from outside as JSON.

use super::template::CardTemplate;
use crate::view::CardState;
use serde::{Deserialize, Serialize};

/// Font size used when a style carries none
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Resolved text styling of one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// CSS color
    pub color: String,
    pub font_size: f32,
    /// `None` means "normal"
    pub line_height: Option<f32>,
    pub font_weight: u16,
    /// CSS font-family list; the first entry is used
    pub font_family: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            line_height: None,
            font_weight: 400,
            font_family: "sans-serif".to_string(),
        }
    }
}

impl TextStyle {
    pub fn font_size(&self) -> f32 {
        if self.font_size.is_finite() && self.font_size > 0.0 {
            self.font_size
        } else {
            DEFAULT_FONT_SIZE
        }
    }

    /// Line advance in logical pixels; "normal" resolves to 1.2 × font size.
    pub fn line_height(&self) -> f32 {
        match self.line_height {
            Some(lh) if lh.is_finite() && lh > 0.0 => lh,
            _ => self.font_size() * 1.2,
        }
    }
}

/// A positioned text element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    pub rect: Rect,
    pub text: String,
    pub style: TextStyle,
}

/// Geometry and styling of the whole card, relative to the card origin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub width: f32,
    pub height: f32,
    /// Photo wrapper box; decoration shares it
    pub photo: Option<Rect>,
    pub greeting: TextBlock,
    pub message: TextBlock,
    pub footer: TextBlock,
}

impl LayoutSnapshot {
    /// Text blocks in drawing order.
    pub fn text_blocks(&self) -> [&TextBlock; 3] {
        [&self.greeting, &self.message, &self.footer]
    }
}

/// Measures the advance width of a single line of text
pub trait TextMeasure {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32;
}

/// Approximate measurer: every character advances `ratio × font size`.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub ratio: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { ratio: 0.5 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        text.chars().count() as f32 * style.font_size() * self.ratio
    }
}

/// Greedy word wrap.
///
/// Words are joined by single spaces; a line is committed when the next word
/// would overflow `max_width` and the line is non-empty. A single word wider
/// than `max_width` gets its own line.
pub fn wrap_text<F>(text: &str, max_width: f32, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", cur, word)
        };
        if measure(&candidate) > max_width && !cur.is_empty() {
            lines.push(std::mem::replace(&mut cur, word.to_string()));
        } else {
            cur = candidate;
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Wrap a block's text with `measure` at the block's width.
pub fn wrap_block(block: &TextBlock, measure: &mut dyn TextMeasure) -> Vec<String> {
    wrap_text(&block.text, block.rect.width, |s| measure.measure(s, &block.style))
}

/// Stack the card's parts vertically inside the template's padding:
/// photo (when revealed, height from its aspect ratio), then greeting,
/// message and footer. Empty text blocks take no height.
pub fn layout_card(
    template: &CardTemplate,
    state: &CardState,
    measure: &mut dyn TextMeasure,
) -> LayoutSnapshot {
    let padding = template.padding.max(0.0);
    let content_w = (template.width - padding * 2.0).max(0.0);
    let x = padding;
    let mut y = padding;
    let mut last_gap = 0.0;

    let photo = match (state.photo_visible, state.photo_aspect) {
        (true, Some(aspect)) if aspect > 0.0 => {
            let rect = Rect::new(x, y, content_w, content_w / aspect);
            y += rect.height + template.gap;
            last_gap = template.gap;
            Some(rect)
        }
        _ => None,
    };

    let mut place = |text: &str, style: &TextStyle| {
        let style = style.clone();
        let lines = wrap_text(text, content_w, |s| measure.measure(s, &style));
        let height = lines.len() as f32 * style.line_height();
        let block = TextBlock {
            rect: Rect::new(x, y, content_w, height),
            text: text.to_string(),
            style,
        };
        if height > 0.0 {
            y += height + template.gap;
            last_gap = template.gap;
        }
        block
    };

    let greeting = place(&state.greeting, &template.greeting);
    let message = place(&state.message, &template.message);
    let footer = place(&state.footer, &template.footer);

    let height = (y - last_gap + padding).max(template.min_height);
    log::debug!("laid out card {}x{}", template.width, height);

    LayoutSnapshot {
        width: template.width,
        height,
        photo,
        greeting,
        message,
        footer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::LoadedImage;
    use crate::view::CardView;

    fn per_char(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn short_text_is_one_trimmed_line() {
        let lines = wrap_text("  hello    world  ", 100.0, per_char);
        assert_eq!(lines, vec!["hello world".to_string()]);
    }

    #[test]
    fn wraps_greedily_at_width() {
        let lines = wrap_text("aa bb cc dd", 5.0, per_char);
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = wrap_text("a verylongword b", 4.0, per_char);
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_text("   ", 10.0, per_char).is_empty());
    }

    #[test]
    fn line_height_defaults_to_normal() {
        let style = TextStyle {
            font_size: 20.0,
            ..Default::default()
        };
        assert!((style.line_height() - 24.0).abs() < 1e-4);
        let bad = TextStyle {
            font_size: f32::NAN,
            line_height: Some(0.0),
            ..Default::default()
        };
        assert_eq!(bad.font_size(), DEFAULT_FONT_SIZE);
        assert!((bad.line_height() - 19.2).abs() < 1e-4);
    }

    #[test]
    fn layout_stacks_photo_and_text() {
        let template = CardTemplate::default();
        let mut state = CardState::new();
        state.set_greeting("To Alice,");
        state.set_message("Happy birthday");
        state.reveal_photo(LoadedImage::solid(4, 2, [0, 0, 0, 255]).unwrap());

        let snap = layout_card(&template, &state, &mut FixedAdvance::default());
        let photo = snap.photo.expect("photo laid out");
        let content_w = template.width - template.padding * 2.0;
        assert_eq!(photo.width, content_w);
        assert_eq!(photo.height, content_w / 2.0);
        assert!(snap.greeting.rect.y >= photo.y + photo.height);
        assert!(snap.message.rect.y > snap.greeting.rect.y);
        // empty footer takes no space
        assert_eq!(snap.footer.rect.height, 0.0);
        assert!(snap.height >= snap.message.rect.y + snap.message.rect.height);
    }

    #[test]
    fn hidden_photo_is_not_laid_out() {
        let mut state = CardState::new();
        state.set_message("Hi");
        let snap = layout_card(&CardTemplate::default(), &state, &mut FixedAdvance::default());
        assert!(snap.photo.is_none());
    }
}

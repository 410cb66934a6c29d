//! Card template: the styling the layout reads.
//!
//! Templates either come from the built-in defaults or from the card's HTML
//! markup, whose inline `style` attributes are applied on top of them.

use super::layout::TextStyle;
use super::text::parse_color;
use crate::{Error, Result};
use scraper::{ElementRef, Html, Selector};

/// Element ids the card markup must provide
pub const REQUIRED_IDS: [&str; 7] = [
    "greeting",
    "message",
    "footer",
    "photo",
    "photo-wrap",
    "decoration",
    "error",
];

/// Selector of the card container
pub const CARD_SELECTOR: &str = ".card";

#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    pub width: f32,
    pub padding: f32,
    /// Vertical space between stacked parts
    pub gap: f32,
    pub min_height: f32,
    pub greeting: TextStyle,
    pub message: TextStyle,
    pub footer: TextStyle,
}

impl Default for CardTemplate {
    fn default() -> Self {
        Self {
            width: 600.0,
            padding: 32.0,
            gap: 16.0,
            min_height: 0.0,
            greeting: TextStyle {
                color: "#f5efe0".into(),
                font_size: 32.0,
                line_height: Some(40.0),
                font_weight: 700,
                font_family: "Georgia, serif".into(),
            },
            message: TextStyle {
                color: "#e8eef7".into(),
                font_size: 18.0,
                line_height: Some(28.0),
                font_weight: 400,
                font_family: "sans-serif".into(),
            },
            footer: TextStyle {
                color: "#c9d6ea".into(),
                font_size: 16.0,
                line_height: Some(24.0),
                font_weight: 400,
                font_family: "sans-serif".into(),
            },
        }
    }
}

impl CardTemplate {
    /// Read a template from card markup.
    ///
    /// Fails when the `.card` container or any of [`REQUIRED_IDS`] is absent.
    pub fn from_html(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let mut template = CardTemplate::default();

        let card = select_one(&document, CARD_SELECTOR)?
            .ok_or_else(|| Error::TemplateError("missing card container .card".into()))?;
        for id in REQUIRED_IDS {
            if select_one(&document, &format!("#{}", id))?.is_none() {
                return Err(Error::TemplateError(format!("missing element #{}", id)));
            }
        }

        for (name, value) in declarations(card.value().attr("style").unwrap_or("")) {
            match name.as_str() {
                "width" => template.width = parse_px(&value).unwrap_or(template.width),
                "padding" => template.padding = parse_px(&value).unwrap_or(template.padding),
                "gap" | "row-gap" => template.gap = parse_px(&value).unwrap_or(template.gap),
                "min-height" => {
                    template.min_height = parse_px(&value).unwrap_or(template.min_height)
                }
                _ => {}
            }
        }

        for (id, style) in [
            ("greeting", &mut template.greeting),
            ("message", &mut template.message),
            ("footer", &mut template.footer),
        ] {
            if let Some(el) = select_one(&document, &format!("#{}", id))? {
                apply_inline_style(style, el.value().attr("style").unwrap_or(""));
            }
        }

        if template.width <= 0.0 {
            return Err(Error::TemplateError(format!(
                "card width must be positive, got {}",
                template.width
            )));
        }
        Ok(template)
    }
}

fn select_one<'a>(document: &'a Html, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = Selector::parse(selector)
        .map_err(|e| Error::TemplateError(format!("bad selector {}: {:?}", selector, e)))?;
    Ok(document.select(&sel).next())
}

/// Split a `style` attribute into lowercase property names and trimmed values.
fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}

fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let number = v.strip_suffix("px").unwrap_or(v).trim();
    number.parse::<f32>().ok().filter(|n| n.is_finite())
}

fn apply_inline_style(style: &mut TextStyle, inline: &str) {
    let decls = declarations(inline);
    // font-size first so unitless line heights scale against the final size
    if let Some((_, v)) = decls.iter().find(|(k, _)| k == "font-size") {
        if let Some(size) = parse_px(v) {
            style.font_size = size;
        }
    }
    for (name, value) in &decls {
        match name.as_str() {
            "color" => {
                // keywords like inherit or currentColor and var() stay at the default
                if parse_color(value).is_ok() {
                    style.color = value.clone();
                } else {
                    log::warn!("ignoring unsupported color {:?}", value);
                }
            }
            "font-family" => style.font_family = value.clone(),
            "font-weight" => {
                style.font_weight = match value.to_ascii_lowercase().as_str() {
                    "normal" => 400,
                    "bold" => 700,
                    other => other.parse().unwrap_or(style.font_weight),
                }
            }
            "line-height" => {
                style.line_height = if value.eq_ignore_ascii_case("normal") {
                    None
                } else if value.ends_with("px") {
                    parse_px(value)
                } else {
                    value
                        .parse::<f32>()
                        .ok()
                        .map(|factor| factor * style.font_size())
                }
            }
            _ => {}
        }
    }
}

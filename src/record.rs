//! Card records and the key → record mapping

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;

/// Query parameter carrying the card key
pub const KEY_PARAM: &str = "card";

/// Year of the occasion, given either as a number or as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(i64),
    Text(String),
}

impl Year {
    /// Zero and the empty string count as "no year".
    fn is_present(&self) -> bool {
        match self {
            Year::Number(n) => *n != 0,
            Year::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Number(n) => write!(f, "{}", n),
            Year::Text(s) => f.write_str(s),
        }
    }
}

/// Per-recipient card data
///
/// Fields are read leniently: numbers are accepted where text is expected,
/// and values of any other type count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    /// Photo URL
    #[serde(default, deserialize_with = "lenient_text")]
    pub image: Option<String>,
    /// Decoration overlay URL
    #[serde(default, deserialize_with = "lenient_text")]
    pub decoration: Option<String>,
    /// Sender shown as "From {footer}"
    #[serde(default, deserialize_with = "lenient_text")]
    pub footer: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub occasion: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<Year>,
}

/// Integral numbers print without a fraction, so `2024.0` reads as `2024`.
fn number_text(n: &Number) -> String {
    match (n.as_i64(), n.as_f64()) {
        (Some(i), _) => i.to_string(),
        (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(number_text(&n)),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(d)?))
}

fn lenient_string<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
}

fn lenient_year<'de, D>(d: D) -> std::result::Result<Option<Year>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => Year::Number(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Year::Number(f as i64)
                }
                _ => Year::Text(number_text(&n)),
            },
        }),
        Value::String(s) => Some(Year::Text(s)),
        _ => None,
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Record {
    pub fn greeting(&self) -> String {
        format!("To {},", self.name)
    }

    pub fn image(&self) -> Option<&str> {
        present(&self.image)
    }

    pub fn decoration(&self) -> Option<&str> {
        present(&self.decoration)
    }

    /// Compose the footer line: `"From {footer}"` and `"{occasion} {year}"`
    /// joined by `", "`, leaving out whatever is absent.
    pub fn footer_line(&self) -> String {
        let from = present(&self.footer)
            .map(|f| format!("From {}", f))
            .unwrap_or_default();
        let year = self
            .year
            .as_ref()
            .filter(|y| y.is_present())
            .map(|y| y.to_string())
            .unwrap_or_default();
        let tail = [present(&self.occasion).unwrap_or(""), year.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        [from, tail]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Immutable key → record table, loaded once from the static data source
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    records: HashMap<String, Record>,
}

impl Mapping {
    /// Parse the mapping. The document must be a JSON object; entries that
    /// are not records (null, numbers, arrays) are left out and look up as
    /// unknown keys.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let entries: HashMap<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| Error::DataError(format!("invalid card data: {}", e)))?;
        let records = entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Object(_) => match serde_json::from_value::<Record>(value) {
                    Ok(record) => Some((key, record)),
                    Err(e) => {
                        log::warn!("skipping card record {:?}: {}", key, e);
                        None
                    }
                },
                Value::Null => None,
                other => {
                    log::warn!("skipping card record {:?}: not an object ({})", key, other);
                    None
                }
            })
            .collect();
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Look up an already-normalized key.
    pub fn lookup(&self, key: Option<&str>) -> Result<&Record> {
        let key = key.ok_or(Error::MissingKey)?;
        self.records
            .get(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))
    }
}

impl FromIterator<(String, Record)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Trim and lowercase a raw key; blank keys count as missing.
pub fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Read the card key from a query string such as `card=Alice&x=1` (leading `?` allowed).
pub fn key_from_query(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == KEY_PARAM)
        .and_then(|(_, value)| normalize_key(&value))
}

/// Read the card key from a full page URL.
pub fn key_from_url(page_url: &str) -> Result<Option<String>> {
    let url = url::Url::parse(page_url)
        .map_err(|e| Error::ConfigError(format!("invalid page URL {}: {}", page_url, e)))?;
    Ok(url.query().and_then(key_from_query))
}

//! RFox Card
//!
//! Headless greeting cards: resolve a card key to a record from a static
//! JSON mapping, populate a card view, and export the laid-out card as PNG.
//!
//! # Features
//!
//! - **http** (default): fetch card data and images over `http(s)://`
//! - **Layout snapshots**: the exporter draws from a plain value describing
//!   positions and styles, so any presentation layer can drive it
//! - **Safe defaults**: every failure ends in exactly one user-visible message
//!
//! # Example
//!
//! ```no_run
//! use rfcard::{CardConfig, CardExporter, CardState, CardTemplate, FetchSource};
//!
//! # async fn run() -> rfcard::Result<()> {
//! let config = CardConfig {
//!     device_pixel_ratio: 2.0,
//!     ..Default::default()
//! };
//! let source = FetchSource::new(&config)?;
//! let mut card = CardState::new();
//! rfcard::load_card(&mut card, &source, &config.data_source, Some("alice")).await?;
//!
//! let mut exporter = CardExporter::new(&config)?;
//! let snapshot = exporter.snapshot(&CardTemplate::default(), &card);
//! let image = exporter.export(&card, &snapshot, &source).await?;
//! println!("{}x{} {}", image.width, image.height, image.digest());
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod error;
pub mod export;
pub mod loader;
pub mod record;
pub mod rendering;
pub mod view;

pub use assets::{load_image, AssetSource, FetchSource, LoadedImage, MemorySource};
pub use error::{Error, ErrorKind, Result};
pub use export::{download_card, save_card, wait_for_image, CardExporter};
pub use loader::{fetch_mapping, load_card, populate};
pub use record::{key_from_query, key_from_url, normalize_key, Mapping, Record, Year};
pub use rendering::{CardImage, CardTemplate, FontConfig, LayoutSnapshot};
pub use view::{CardState, CardView, DisplayState, ImageSlot};

/// Configuration for loading and exporting cards
///
/// The defaults mirror a page served next to its `data.json` and
/// `assets/bg.png`:
///
/// ```
/// let cfg = rfcard::CardConfig::default();
/// assert_eq!(cfg.data_source, "data.json");
/// assert_eq!(cfg.output_name, "card.png");
/// ```
#[derive(Debug, Clone)]
pub struct CardConfig {
    /// Location of the key → record JSON mapping, relative to `base`
    pub data_source: String,
    /// Background image drawn under the backdrop gradient, relative to `base`
    pub background: String,
    /// Base URL or directory that relative sources resolve against
    /// (defaults to the current directory)
    pub base: Option<String>,
    /// Display density the export is scaled by
    pub device_pixel_ratio: f32,
    /// Timeout for remote fetches in milliseconds
    pub timeout_ms: u64,
    /// User agent sent with remote fetches
    pub user_agent: String,
    /// File name of the exported image
    pub output_name: String,
    /// Fonts available to text drawing
    pub fonts: FontConfig,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            data_source: "data.json".to_string(),
            background: "assets/bg.png".to_string(),
            base: None,
            device_pixel_ratio: 1.0,
            timeout_ms: 30000,
            user_agent: concat!("rfcard/", env!("CARGO_PKG_VERSION")).to_string(),
            output_name: "card.png".to_string(),
            fonts: FontConfig::default(),
        }
    }
}

impl CardConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(Error::ConfigError(format!(
                "device pixel ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        if self.output_name.trim().is_empty() {
            return Err(Error::ConfigError("output name is empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout must be nonzero".into()));
        }
        Ok(())
    }
}

//! Static sources: card data, background and per-card images.
//!
//! Every fetch is a one-shot asynchronous operation behind the
//! [`AssetSource`] trait. [`FetchSource`] resolves references against a page
//! base URL the way a browser resolves `src` attributes; [`MemorySource`]
//! serves bytes from memory.

use crate::{CardConfig, Error, Result};
use base64::Engine as _;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{IntSize, Pixmap};
use url::Url;

/// A source of raw bytes addressed by URL-like strings
pub trait AssetSource: Send + Sync {
    /// Fetch the bytes behind `src`, resolving it relative to the source's base.
    fn fetch<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// A decoded image with its intrinsic size
#[derive(Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pixmap: Arc<Pixmap>,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl LoadedImage {
    /// Decode PNG or JPEG bytes into a premultiplied pixmap.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| Error::ImageError(format!("decode failed: {}", e)))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        Self::from_premultiplied(width, height, data)
    }

    /// Wrap premultiplied RGBA8 pixels.
    pub fn from_premultiplied(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| Error::ImageError(format!("empty image {}x{}", width, height)))?;
        let pixmap = Pixmap::from_vec(data, size)
            .ok_or_else(|| Error::ImageError("pixel buffer does not match size".into()))?;
        Ok(Self {
            width,
            height,
            pixmap: Arc::new(pixmap),
        })
    }

    /// An opaque single-color image, handy for placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let a = rgba[3] as u16;
        let px = [
            ((rgba[0] as u16 * a + 127) / 255) as u8,
            ((rgba[1] as u16 * a + 127) / 255) as u8,
            ((rgba[2] as u16 * a + 127) / 255) as u8,
            rgba[3],
        ];
        let data = px.repeat((width as usize) * (height as usize));
        Self::from_premultiplied(width, height, data)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub(crate) fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Fetch and decode an image.
pub async fn load_image(source: &dyn AssetSource, src: &str) -> Result<LoadedImage> {
    let bytes = source
        .fetch(src)
        .await
        .map_err(|e| Error::ImageError(format!("{}: {}", src, e)))?;
    let image = LoadedImage::decode(&bytes)
        .map_err(|e| Error::ImageError(format!("{}: {}", src, e)))?;
    log::info!("loaded image {} ({}x{})", src, image.width, image.height);
    Ok(image)
}

/// In-memory source keyed by the exact `src` string
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(src.into(), bytes.into());
    }

    pub fn with(mut self, src: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(src, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            if src.starts_with("data:") {
                return decode_data_url(src);
            }
            self.entries
                .get(src)
                .cloned()
                .ok_or_else(|| Error::LoadError(format!("{}: not found", src)))
        })
    }
}

/// Source that resolves references against a page base URL and reads
/// `file:`, `data:` and (with the `http` feature) `http(s):` URLs.
pub struct FetchSource {
    base: Url,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl FetchSource {
    pub fn new(config: &CardConfig) -> Result<Self> {
        let base = match &config.base {
            Some(base) => Url::parse(base)
                .or_else(|_| dir_url(std::path::Path::new(base)))
                .map_err(|_| Error::InitializationError(format!("invalid base {}", base)))?,
            None => dir_url(&std::env::current_dir()?).map_err(|_| {
                Error::InitializationError("current directory is not a valid base".into())
            })?,
        };

        #[cfg(feature = "http")]
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base,
            #[cfg(feature = "http")]
            client,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a reference against the base URL.
    pub fn resolve(&self, src: &str) -> Result<Url> {
        self.base
            .join(src)
            .map_err(|e| Error::LoadError(format!("{}: {}", src, e)))
    }

    async fn fetch_url(&self, url: Url) -> Result<Vec<u8>> {
        let scheme = url.scheme().to_string();
        match scheme.as_str() {
            "data" => decode_data_url(url.as_str()),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::LoadError(format!("{}: not a local path", url)))?;
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| Error::LoadError(format!("{}: {}", path.display(), e)))
            }
            #[cfg(feature = "http")]
            "http" | "https" => self.fetch_http(url).await,
            other => Err(Error::LoadError(format!(
                "{}: unsupported scheme {}",
                url, other
            ))),
        }
    }

    #[cfg(feature = "http")]
    async fn fetch_http(&self, url: Url) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::LoadError(format!("{}: {}", url, e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::LoadError(format!("{}: HTTP {}", url, status)));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::LoadError(format!("{}: {}", url, e)))?;
        Ok(body.to_vec())
    }
}

impl AssetSource for FetchSource {
    fn fetch<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let url = self.resolve(src)?;
            log::debug!("fetching {}", url);
            self.fetch_url(url).await
        })
    }
}

fn dir_url(path: &std::path::Path) -> std::result::Result<Url, ()> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_err(|_| ())?.join(path)
    };
    Url::from_directory_path(abs)
}

/// Decode a `data:` URL. Only base64 payloads are decoded; other payloads
/// are returned as-is.
fn decode_data_url(src: &str) -> Result<Vec<u8>> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| Error::LoadError("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::LoadError("data URL without payload".into()))?;
    if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::LoadError(format!("data URL: {}", e)))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

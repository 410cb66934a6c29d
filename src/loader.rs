//! Data loader: resolve a card key to a record and populate the view.

use crate::assets::{load_image, AssetSource};
use crate::record::{normalize_key, Mapping, Record};
use crate::view::CardView;
use crate::{Error, Result};

/// Fetch and parse the key → record mapping.
pub async fn fetch_mapping(source: &dyn AssetSource, data_src: &str) -> Result<Mapping> {
    let bytes = source
        .fetch(data_src)
        .await
        .map_err(|e| Error::DataError(e.to_string()))?;
    let mapping = Mapping::from_json(&bytes)?;
    log::info!("loaded {} card records from {}", mapping.len(), data_src);
    Ok(mapping)
}

/// Load the card for `key` into `view`.
///
/// On failure the view already shows the corresponding message when this
/// returns; the error is handed back only so callers can report it.
pub async fn load_card(
    view: &mut dyn CardView,
    source: &dyn AssetSource,
    data_src: &str,
    key: Option<&str>,
) -> Result<()> {
    let result = match fetch_mapping(source, data_src).await {
        Ok(mapping) => populate(view, source, &mapping, key).await,
        Err(e) => Err(e),
    };
    if let Err(err) = &result {
        log::warn!("card load failed: {}", err);
        view.show_error(&err.user_message());
    }
    result
}

/// Populate `view` from an already loaded mapping.
///
/// `key` is normalized before lookup. Errors are returned, not shown.
pub async fn populate(
    view: &mut dyn CardView,
    source: &dyn AssetSource,
    mapping: &Mapping,
    key: Option<&str>,
) -> Result<()> {
    let key = key.and_then(normalize_key);
    let record = mapping.lookup(key.as_deref())?;
    apply_text(view, record);

    if let Some(decoration) = record.decoration() {
        view.reveal_decoration(decoration);
    }

    if let Some(src) = record.image() {
        match load_image(source, src).await {
            Ok(photo) => view.reveal_photo(photo),
            Err(e) => {
                view.photo_failed();
                return Err(e);
            }
        }
    }
    Ok(())
}

fn apply_text(view: &mut dyn CardView, record: &Record) {
    view.set_greeting(&record.greeting());
    view.set_message(&record.message);
    view.set_footer(&record.footer_line());
}

//! The card display surface.
//!
//! [`CardView`] is the seam between the loader/exporter and whatever shows
//! the card. [`CardState`] is the headless implementation: it keeps the
//! three text fields, the photo and decoration slots and whether the card or
//! an error is on display.

use crate::assets::LoadedImage;

/// What the surface is currently showing. Exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Card,
    Error(String),
}

/// Load state of an optional image element
#[derive(Debug, Clone, Default)]
pub enum ImageSlot {
    /// No source assigned
    #[default]
    Empty,
    /// Source assigned, not yet decoded
    Pending(String),
    Loaded(LoadedImage),
    Failed,
}

impl ImageSlot {
    pub fn loaded(&self) -> Option<&LoadedImage> {
        match self {
            ImageSlot::Loaded(img) => Some(img),
            _ => None,
        }
    }
}

/// Operations the loader performs on the display
pub trait CardView {
    fn set_greeting(&mut self, text: &str);
    fn set_message(&mut self, text: &str);
    fn set_footer(&mut self, text: &str);

    /// Record the photo's aspect ratio for layout, then reveal it.
    fn reveal_photo(&mut self, image: LoadedImage);

    /// Reveal the decoration overlay; its bytes are loaded lazily.
    fn reveal_decoration(&mut self, src: &str);

    /// Mark the photo as failed without touching the rest of the card.
    fn photo_failed(&mut self);

    /// Hide the card and show `message` instead.
    fn show_error(&mut self, message: &str);
}

/// In-memory card surface
#[derive(Debug, Clone)]
pub struct CardState {
    display: DisplayState,
    pub greeting: String,
    pub message: String,
    pub footer: String,
    pub photo: ImageSlot,
    /// Width / height of the photo, set before it is revealed
    pub photo_aspect: Option<f32>,
    pub photo_visible: bool,
    pub decoration: ImageSlot,
    pub decoration_visible: bool,
}

impl Default for CardState {
    fn default() -> Self {
        Self {
            display: DisplayState::Card,
            greeting: String::new(),
            message: String::new(),
            footer: String::new(),
            photo: ImageSlot::Empty,
            photo_aspect: None,
            photo_visible: false,
            decoration: ImageSlot::Empty,
            decoration_visible: false,
        }
    }
}

impl CardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn is_card_shown(&self) -> bool {
        self.display == DisplayState::Card
    }

    pub fn error(&self) -> Option<&str> {
        match &self.display {
            DisplayState::Error(msg) => Some(msg),
            DisplayState::Card => None,
        }
    }
}

impl CardView for CardState {
    fn set_greeting(&mut self, text: &str) {
        self.greeting = text.to_string();
    }

    fn set_message(&mut self, text: &str) {
        self.message = text.to_string();
    }

    fn set_footer(&mut self, text: &str) {
        self.footer = text.to_string();
    }

    fn reveal_photo(&mut self, image: LoadedImage) {
        if image.width > 0 && image.height > 0 {
            self.photo_aspect = Some(image.aspect_ratio());
        }
        self.photo = ImageSlot::Loaded(image);
        self.photo_visible = true;
    }

    fn reveal_decoration(&mut self, src: &str) {
        self.decoration = ImageSlot::Pending(src.to_string());
        self.decoration_visible = true;
    }

    fn photo_failed(&mut self) {
        self.photo = ImageSlot::Failed;
        self.photo_visible = false;
    }

    fn show_error(&mut self, message: &str) {
        self.display = DisplayState::Error(message.to_string());
    }
}

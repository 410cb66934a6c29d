//! Fetching card data and images over HTTP

#![cfg(feature = "http")]

use rfcard::{load_card, AssetSource, CardConfig, CardState, Error, FetchSource, ImageSlot};
use std::sync::Once;
use tiny_http::{Header, Response, Server};

static INIT: Once = Once::new();
const ADDR: &str = "127.0.0.1:18093";

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Serve a card site: the mapping, one photo, and 404 for the rest
fn start_test_server() -> String {
    INIT.call_once(|| {
        let server = Server::http(ADDR).unwrap();
        std::thread::spawn(move || {
            let photo = png(16, 8);
            for request in server.incoming_requests() {
                let response = match request.url() {
                    "/site/data.json" => Response::from_string(
                        r#"{"alice": {"name": "Alice", "message": "Hi", "image": "img/alice.png"},
                            "bob": {"name": "Bob", "message": "Yo", "image": "img/gone.png"}}"#,
                    )
                    .with_header("Content-Type: application/json".parse::<Header>().unwrap()),
                    "/site/img/alice.png" => Response::from_data(photo.clone())
                        .with_header("Content-Type: image/png".parse::<Header>().unwrap()),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
    });
    format!("http://{}/site/", ADDR)
}

fn source() -> FetchSource {
    let config = CardConfig {
        base: Some(start_test_server()),
        timeout_ms: 5000,
        ..Default::default()
    };
    FetchSource::new(&config).unwrap()
}

#[tokio::test]
async fn relative_sources_resolve_against_base() {
    let source = source();
    let url = source.resolve("img/alice.png").unwrap();
    assert_eq!(url.as_str(), format!("http://{}/site/img/alice.png", ADDR));

    let bytes = source.fetch("data.json").await.unwrap();
    assert!(bytes.starts_with(b"{"));
}

#[tokio::test]
async fn card_loads_over_http() {
    let source = source();
    let mut card = CardState::new();
    load_card(&mut card, &source, "data.json", Some("ALICE"))
        .await
        .unwrap();
    assert_eq!(card.greeting, "To Alice,");
    assert_eq!(card.photo_aspect, Some(2.0));
    assert!(matches!(card.photo, ImageSlot::Loaded(_)));
}

#[tokio::test]
async fn not_found_is_a_load_error() {
    let source = source();
    let res = source.fetch("nope.json").await;
    assert!(matches!(res, Err(Error::LoadError(ref msg)) if msg.contains("404")));

    let mut card = CardState::new();
    let res = load_card(&mut card, &source, "nope.json", Some("alice")).await;
    assert!(matches!(res, Err(Error::DataError(_))));
    assert_eq!(card.error(), Some("Could not load card data"));
}

#[tokio::test]
async fn missing_photo_over_http_shows_image_error() {
    let source = source();
    let mut card = CardState::new();
    let res = load_card(&mut card, &source, "data.json", Some("bob")).await;
    assert!(matches!(res, Err(Error::ImageError(_))));
    assert_eq!(card.error(), Some("Image failed to load"));
}

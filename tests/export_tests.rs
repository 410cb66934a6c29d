//! Exporting loaded cards as PNG

use rfcard::rendering::layout::{FixedAdvance, LayoutSnapshot, Rect};
use rfcard::rendering::layout_card;
use rfcard::{
    download_card, load_card, CardConfig, CardExporter, CardState, CardTemplate, FontConfig,
    MemorySource,
};

const DATA: &str = r#"{
    "alice": {
        "name": "Alice",
        "message": "Wishing you a wonderful year ahead, full of light and good company.",
        "image": "photos/alice.png",
        "decoration": "assets/frame.png",
        "footer": "Bob",
        "occasion": "Birthday",
        "year": 2024
    },
    "carol": {"name": "Carol", "message": "Congratulations!"}
}"#;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).expect("encode png");
    out.into_inner()
}

fn source() -> MemorySource {
    MemorySource::new()
        .with("data.json", DATA)
        .with("assets/bg.png", png(64, 64, [250, 250, 250, 255]))
        .with("photos/alice.png", png(40, 20, [255, 0, 0, 255]))
        .with("assets/frame.png", png(8, 8, [0, 255, 0, 128]))
}

fn config(dpr: f32) -> CardConfig {
    CardConfig {
        device_pixel_ratio: dpr,
        fonts: FontConfig {
            load_system_fonts: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn loaded(key: &str, src: &MemorySource) -> CardState {
    let mut card = CardState::new();
    load_card(&mut card, src, "data.json", Some(key))
        .await
        .expect("card loads");
    card
}

fn decode(png_data: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png_data).expect("valid png").to_rgba8()
}

#[tokio::test]
async fn export_is_sized_by_device_pixel_ratio() {
    let src = source();
    let card = loaded("alice", &src).await;
    for dpr in [1.0, 2.0] {
        let mut exporter = CardExporter::new(&config(dpr)).unwrap();
        let snapshot = exporter.snapshot(&CardTemplate::default(), &card);
        let image = exporter.export(&card, &snapshot, &src).await.unwrap();
        assert_eq!(image.width, (snapshot.width * dpr).round() as u32);
        assert_eq!(image.height, (snapshot.height * dpr).round() as u32);

        let decoded = decode(&image.png_data);
        assert_eq!(decoded.dimensions(), (image.width, image.height));
    }
}

#[tokio::test]
async fn repeated_exports_are_identical() {
    let src = source();
    let card = loaded("alice", &src).await;
    let mut exporter = CardExporter::new(&config(2.0)).unwrap();
    let snapshot = exporter.snapshot(&CardTemplate::default(), &card);

    let first = exporter.export(&card, &snapshot, &src).await.unwrap();
    let second = exporter.export(&card, &snapshot, &src).await.unwrap();
    assert_eq!((first.width, first.height), (second.width, second.height));
    assert_eq!(first.digest(), second.digest());
}

#[tokio::test]
async fn photo_is_drawn_into_its_box() {
    let src = source();
    let card = loaded("alice", &src).await;
    let mut exporter = CardExporter::new(&config(1.0)).unwrap();
    let snapshot = exporter.snapshot(&CardTemplate::default(), &card);
    let photo = snapshot.photo.expect("photo box");
    let image = exporter.export(&card, &snapshot, &src).await.unwrap();
    let pixels = decode(&image.png_data);

    // red photo under a half-transparent green frame
    let inside = pixels.get_pixel(
        (photo.x + photo.width / 2.0) as u32,
        (photo.y + photo.height / 2.0) as u32,
    );
    assert!(inside[0] > 100 && inside[1] > 100 && inside[2] < 50, "{:?}", inside);

    // corner shows background under the blue backdrop
    let corner = pixels.get_pixel(1, 1);
    assert!(corner[2] > corner[0], "{:?}", corner);
    assert_eq!(corner[3], 255);
}

#[tokio::test]
async fn missing_background_still_renders_backdrop() {
    let src = MemorySource::new()
        .with("data.json", DATA)
        .with("photos/alice.png", png(40, 20, [255, 0, 0, 255]));
    let card = loaded("carol", &src).await;
    let mut exporter = CardExporter::new(&config(1.0)).unwrap();
    let snapshot = exporter.snapshot(&CardTemplate::default(), &card);
    assert!(snapshot.photo.is_none());

    let image = exporter.export(&card, &snapshot, &src).await.unwrap();
    let pixels = decode(&image.png_data);
    let corner = pixels.get_pixel(0, 0);
    // rgba(12,28,55,0.9) over transparent
    assert!(corner[3] > 200 && corner[3] < 255, "{:?}", corner);
    assert!(corner[2] > corner[0]);
}

#[tokio::test]
async fn failed_decoration_is_skipped() {
    let src = MemorySource::new()
        .with("data.json", DATA)
        .with("assets/bg.png", png(4, 4, [250, 250, 250, 255]))
        .with("photos/alice.png", png(40, 20, [255, 0, 0, 255]));
    let card = loaded("alice", &src).await;
    let mut exporter = CardExporter::new(&config(1.0)).unwrap();
    let snapshot = exporter.snapshot(&CardTemplate::default(), &card);
    let image = exporter.export(&card, &snapshot, &src).await.unwrap();

    let photo = snapshot.photo.unwrap();
    let pixels = decode(&image.png_data);
    let inside = pixels.get_pixel(
        (photo.x + photo.width / 2.0) as u32,
        (photo.y + photo.height / 2.0) as u32,
    );
    assert!(inside[0] > 250 && inside[1] < 5, "{:?}", inside);
}

#[tokio::test]
async fn supplied_snapshot_drives_the_export() {
    let src = source();
    let card = loaded("alice", &src).await;
    let mut snapshot = layout_card(&CardTemplate::default(), &card, &mut FixedAdvance::default());
    snapshot.width = 320.0;
    snapshot.height = 200.0;
    snapshot.photo = Some(Rect::new(10.0, 10.0, 100.0, 50.0));

    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: LayoutSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);

    let mut exporter = CardExporter::new(&config(1.5)).unwrap();
    let image = exporter.export(&card, &parsed, &src).await.unwrap();
    assert_eq!((image.width, image.height), (480, 300));
}

#[tokio::test]
async fn download_writes_card_png() {
    let src = source();
    let mut card = loaded("alice", &src).await;
    let mut exporter = CardExporter::new(&config(1.0)).unwrap();
    let snapshot = exporter.snapshot(&CardTemplate::default(), &card);

    let dir = std::env::temp_dir().join(format!("rfcard-export-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = download_card(&mut card, &mut exporter, &snapshot, &src, &dir, "card.png")
        .await
        .unwrap();
    assert_eq!(path, dir.join("card.png"));
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");
    assert!(!dir.join("card.png.part").exists());
    assert!(card.is_card_shown());
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn failed_download_shows_generic_message() {
    let src = source();
    let mut card = loaded("alice", &src).await;
    let mut exporter = CardExporter::new(&config(1.0)).unwrap();
    let snapshot = LayoutSnapshot::default(); // zero-sized card

    let res = download_card(
        &mut card,
        &mut exporter,
        &snapshot,
        &src,
        &std::env::temp_dir(),
        "card.png",
    )
    .await;
    assert!(res.is_err());
    assert_eq!(card.error(), Some("Could not download card"));
}

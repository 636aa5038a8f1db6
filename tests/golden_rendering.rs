use std::fs;
use std::path::PathBuf;

use facsimile::rendering::raster::encode_png;
use facsimile::rendering::{render_plate, CaptureRequest};
use facsimile::{generate_plates, Book, PlateSize, PlateStyle};
use sha2::{Digest, Sha256};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn fixture_request() -> CaptureRequest {
    let book = Book::from_json(
        r#"{
            "id": "golden",
            "title": "The Golden Book",
            "author": "Anon",
            "pages": [{ "number": 3, "content": ["A short excerpt that wraps over more than one line of the plate."] }]
        }"#,
    )
    .expect("fixture book");
    let gallery = generate_plates(&book);
    let plate = &gallery.pages[0].plates[0];

    let mut style = PlateStyle::default();
    style.text_color = Some("#202020".into());
    style.set_background("#f4e9d8");

    CaptureRequest {
        plate_id: plate.id.clone(),
        element: plate.element(),
        style,
        size: PlateSize::default(),
        scale: 1,
    }
}

/// Digest of the raw RGBA pixels, so the golden does not depend on the PNG
/// compressor's output
#[test]
fn golden_plate_matches_fixture() {
    let capture = render_plate(&fixture_request());
    assert_eq!((capture.width, capture.height), (216, 270));
    let digest = hex::encode(Sha256::digest(&capture.rgba));

    let expected_path = golden_path("plate1.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, exp.trim());
}

#[test]
fn plate_rendering_is_stable_across_runs() {
    let a = encode_png(&render_plate(&fixture_request())).unwrap();
    let b = encode_png(&render_plate(&fixture_request())).unwrap();
    assert_eq!(Sha256::digest(&a), Sha256::digest(&b));
}

//! Integration tests for the plate pipeline

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use facsimile::capture::DataHandle;
use facsimile::export::{download_all_zip, ArchiveEntry, ArchiveWriter, ExportPlan};
use facsimile::platform::{MemorySaveTarget, RecordingNotifier};
use facsimile::rendering::{Capture, CaptureRequest, Rasterizer};
use facsimile::{Action, Book, Error, PlateId, Studio, StudioConfig, ZipArchiveWriter};
use futures::future::BoxFuture;
use futures::FutureExt;

const BOOK: &str = r#"{
    "id": "bk",
    "title": "A Title",
    "author": "An Author",
    "pages": [
        { "number": 1, "content": ["a", "b"] },
        { "number": 7, "content": ["c"] }
    ]
}"#;

/// Small, fast config: plates captured at 1x
fn config() -> StudioConfig {
    StudioConfig {
        capture_scale: 1,
        ..Default::default()
    }
}

fn studio(save: &MemorySaveTarget) -> Studio {
    let _ = env_logger::builder().is_test(true).try_init();
    Studio::builder(config())
        .save_target(save.clone())
        .notifier(RecordingNotifier::new())
        .build()
        .expect("build studio")
}

fn archive_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect()
}

#[tokio::test]
async fn plates_are_generated_in_page_then_excerpt_order() {
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    studio
        .dispatch(Action::Load(Book::from_json(BOOK).unwrap()))
        .await
        .unwrap();

    let gallery = studio.state().gallery().unwrap();
    let ids: Vec<String> = gallery.plate_ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["bk-1-0", "bk-1-1", "bk-7-0"]);

    for (id, excerpt) in gallery.plate_ids().iter().zip(["a", "b", "c"]) {
        let plate = gallery.plate(id).unwrap();
        assert_eq!(plate.content, excerpt);
        assert_eq!(plate.author, "An Author");
        assert_eq!(plate.title, "A Title");
    }
}

#[tokio::test]
async fn export_groups_plates_into_concatenated_page_folders() {
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    studio
        .dispatch(Action::Load(Book::from_json(BOOK).unwrap()))
        .await
        .unwrap();
    studio.dispatch(Action::Compile).await.unwrap();
    studio.dispatch(Action::Download).await.unwrap();

    let saved = save.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].file_name, "bk.zip");
    assert_eq!(
        archive_names(&saved[0].bytes),
        vec!["bk1/bk-1-0.png", "bk1/bk-1-1.png", "bk17/bk-7-0.png"]
    );

    // Every entry is a PNG of the captured plate size
    let mut archive = zip::ZipArchive::new(Cursor::new(saved[0].bytes.clone())).unwrap();
    for i in 0..archive.len() {
        let mut buf = Vec::new();
        archive.by_index(i).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(&buf[0..8], b"\x89PNG\r\n\x1a\n");
        let reader = png::Decoder::new(&buf[..]).read_info().unwrap();
        assert_eq!(reader.info().width, 216);
        assert_eq!(reader.info().height, 270);
    }
}

#[tokio::test]
async fn empty_book_id_uses_fallback_archive_name() {
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    let mut book = Book::from_json(BOOK).unwrap();
    book.id = String::new();
    studio.dispatch(Action::Load(book)).await.unwrap();
    studio.dispatch(Action::Compile).await.unwrap();
    studio.dispatch(Action::Download).await.unwrap();

    let saved = save.saved();
    assert_eq!(saved[0].file_name, "facsimile-results.zip");
    assert_ne!(saved[0].file_name, ".zip");
    assert_eq!(archive_names(&saved[0].bytes)[2], "7/-7-0.png");
}

#[tokio::test]
async fn download_before_compile_is_refused() {
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    studio
        .dispatch(Action::Load(Book::from_json(BOOK).unwrap()))
        .await
        .unwrap();
    let err = studio.dispatch(Action::Download).await.unwrap_err();
    assert!(matches!(err, Error::ExportNotReady));
    assert!(save.saved().is_empty());
}

/// Rasterizer whose captures finish in reverse issue order
struct SlowFirstRasterizer;

impl Rasterizer for SlowFirstRasterizer {
    fn capture(&self, request: CaptureRequest) -> BoxFuture<'static, Result<Capture, Error>> {
        let delay = match request.plate_id.index {
            0 => 30,
            _ => 1,
        };
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(Capture {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            })
        }
        .boxed()
    }
}

#[tokio::test]
async fn download_waits_for_every_capture_to_settle() {
    let save = MemorySaveTarget::new();
    let mut studio = Studio::builder(config())
        .rasterizer(SlowFirstRasterizer)
        .save_target(save.clone())
        .build()
        .unwrap();
    studio
        .dispatch(Action::Load(Book::from_json(BOOK).unwrap()))
        .await
        .unwrap();
    studio.dispatch(Action::Compile).await.unwrap();

    // Slow plates finished last but nothing is missing
    let report = studio.state().last_capture().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.completed.last().unwrap().index, 0);

    studio.dispatch(Action::Download).await.unwrap();
    assert_eq!(archive_names(&save.saved()[0].bytes).len(), 3);
}

/// Archive writer that records whether it ran
struct TrackingWriter(Arc<AtomicBool>);

impl ArchiveWriter for TrackingWriter {
    fn assemble(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>, Error> {
        self.0.store(true, Ordering::SeqCst);
        ZipArchiveWriter::new().assemble(entries)
    }
}

#[tokio::test]
async fn one_failed_fetch_rejects_the_whole_export() {
    let book = Book::from_json(BOOK).unwrap();
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    studio.dispatch(Action::Load(book.clone())).await.unwrap();
    studio.dispatch(Action::Compile).await.unwrap();

    let mut plan = ExportPlan::new(&book, studio.state().previews(), studio.config());
    assert_eq!(plan.entries.len(), 3);
    plan.entries[2].handle = DataHandle::from_uri("data:image/png;base64,%%%");

    let assembled = Arc::new(AtomicBool::new(false));
    let writer = Arc::new(TrackingWriter(assembled.clone()));
    let err = download_all_zip(plan, writer, &save).await.unwrap_err();

    assert!(matches!(err, Error::ResolveError(_)));
    assert!(!assembled.load(Ordering::SeqCst));
    assert!(save.saved().is_empty());
}

#[tokio::test]
async fn recompiling_after_reload_keeps_one_preview_per_plate() {
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    let book = Book::from_json(BOOK).unwrap();

    studio.dispatch(Action::Load(book.clone())).await.unwrap();
    studio.dispatch(Action::Compile).await.unwrap();
    studio.dispatch(Action::Load(book)).await.unwrap();
    assert!(!studio.state().download_enabled());
    studio.dispatch(Action::Compile).await.unwrap();
    studio.dispatch(Action::Compile).await.unwrap();

    assert_eq!(studio.state().previews().len(), 3);
    let gallery = studio.state().gallery().unwrap();
    assert_eq!(gallery.pages[0].previews.len(), 2);
    assert_eq!(gallery.pages[1].previews.len(), 1);

    // Captured page containers show previews only
    let page = gallery.pages[0].element();
    let classes: Vec<&str> = page.children.iter().map(|c| c.class).collect();
    assert_eq!(classes, vec!["preview", "preview"]);

    studio.dispatch(Action::Download).await.unwrap();
    assert_eq!(archive_names(&save.saved()[0].bytes).len(), 3);
}

#[tokio::test]
async fn single_preview_can_be_downloaded_by_plate_id() {
    let save = MemorySaveTarget::new();
    let mut studio = studio(&save);
    studio
        .dispatch(Action::Load(Book::from_json(BOOK).unwrap()))
        .await
        .unwrap();
    studio.dispatch(Action::Compile).await.unwrap();

    let preview = studio.preview(&PlateId::new("bk", 1, 1)).unwrap();
    assert_eq!(preview.file_name, "bk-1-1.png");
    let bytes = preview.handle.resolve().await.unwrap();
    assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");
}

//! Facsimile
//!
//! Turns a book of excerpts into image "plates", one per excerpt, and bundles
//! the captured images into a zip archive with one folder per page.
//!
//! # Pipeline
//!
//! - **Book**: the validated document ([`Book::from_json`])
//! - **Plates**: one visual card per excerpt ([`gallery::generate_plates`])
//! - **Capture**: asynchronous rasterization of every plate ([`capture`])
//! - **Export**: previews packed into `{book id}.zip` ([`export`])
//!
//! [`Studio`] owns the application state and drives the stages from user
//! actions; [`Navigator`] tracks the active page independently.
//!
//! # Example
//!
//! ```no_run
//! use facsimile::{Action, Book, Studio, StudioConfig};
//! use facsimile::platform::DirectorySaveTarget;
//!
//! # async fn run() -> facsimile::Result<()> {
//! let book = Book::from_json(&std::fs::read_to_string("book.json")?)?;
//! let mut studio = Studio::builder(StudioConfig::default())
//!     .save_target(DirectorySaveTarget::new("out"))
//!     .build()?;
//!
//! studio.dispatch(Action::Load(book)).await?;
//! studio.dispatch(Action::Compile).await?;
//! studio.dispatch(Action::Download).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod book;
pub mod capture;
pub mod export;
pub mod gallery;
pub mod navigation;
pub mod platform;
pub mod rendering;
pub mod studio;
pub mod style;

pub use book::{Book, Page, PageId, PlateId};
pub use capture::{CaptureReport, DataHandle, Preview, PreviewStore};
pub use export::{ArchiveWriter, ExportPlan, SavedArchive, ZipArchiveWriter};
pub use gallery::{generate_plates, Gallery};
pub use navigation::{Key, KeyEvent, Navigator};
pub use rendering::{Rasterizer, SoftwareRasterizer};
pub use studio::{Action, AppState, Effect, Studio};
pub use style::PlateStyle;

/// Largest plate surface a capture may allocate, in pixels (256 MiB of RGBA)
pub const MAX_CAPTURE_PIXELS: u64 = 1 << 26;

/// Configuration for the plate pipeline
///
/// The defaults reproduce the classic output: 216 x 270 plates captured at
/// 5x, which yields 1080 x 1350 PNG images.
///
/// # Examples
///
/// ```
/// let cfg = facsimile::StudioConfig::default();
/// assert_eq!(cfg.capture_size().width, 1080);
/// assert_eq!(cfg.fallback_archive_name, "facsimile-results");
/// ```
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Surface scale applied before capture
    pub capture_scale: u32,
    /// Unscaled plate dimensions
    pub plate_size: PlateSize,
    /// Surface height above which capture output becomes unreliable
    pub max_capture_height: u64,
    /// Encoding for captured plates
    pub image_format: ImageFormat,
    /// Previews are displayed at capture size divided by this
    pub preview_divisor: u32,
    /// Archive stem used when the book id is empty
    pub fallback_archive_name: String,
    /// How page folders are named inside the archive
    pub folder_naming: FolderNaming,
    /// Vertical gap between page rows on the summary surface
    pub page_gap: u32,
    /// Upper bound on plates rasterized at the same time
    pub capture_concurrency: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            capture_scale: 5,
            plate_size: PlateSize::default(),
            max_capture_height: 32000,
            image_format: ImageFormat::Png,
            preview_divisor: 4,
            fallback_archive_name: "facsimile-results".to_string(),
            folder_naming: FolderNaming::Concatenated,
            page_gap: 16,
            capture_concurrency: num_cpus::get().max(1),
        }
    }
}

impl StudioConfig {
    /// Pixel size of a captured plate (saturating; [`StudioConfig::validate`]
    /// rejects scales that would overflow)
    pub fn capture_size(&self) -> PlateSize {
        self.plate_size.scaled(self.capture_scale)
    }

    /// Display size of a preview thumbnail
    pub fn preview_size(&self) -> PlateSize {
        let capture = self.capture_size();
        PlateSize {
            width: capture.width / self.preview_divisor,
            height: capture.height / self.preview_divisor,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture_scale == 0 {
            return Err(Error::ConfigError("capture_scale must be at least 1".into()));
        }
        if self.plate_size.width == 0 || self.plate_size.height == 0 {
            return Err(Error::ConfigError("plate_size must be non-zero".into()));
        }
        let width = self.plate_size.width.checked_mul(self.capture_scale);
        let height = self.plate_size.height.checked_mul(self.capture_scale);
        match (width, height) {
            (Some(w), Some(h)) if w as u64 * h as u64 <= MAX_CAPTURE_PIXELS => {}
            _ => {
                return Err(Error::ConfigError(format!(
                    "capture_scale {} makes a {}x{} plate exceed {} pixels",
                    self.capture_scale,
                    self.plate_size.width,
                    self.plate_size.height,
                    MAX_CAPTURE_PIXELS
                )))
            }
        }
        if self.preview_divisor == 0 {
            return Err(Error::ConfigError("preview_divisor must be at least 1".into()));
        }
        if self.fallback_archive_name.is_empty() {
            return Err(Error::ConfigError("fallback_archive_name must not be empty".into()));
        }
        if self.capture_concurrency == 0 {
            return Err(Error::ConfigError("capture_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

/// Plate dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateSize {
    pub width: u32,
    pub height: u32,
}

impl PlateSize {
    /// Both dimensions multiplied by `scale`, saturating at `u32::MAX`
    pub fn scaled(self, scale: u32) -> PlateSize {
        PlateSize {
            width: self.width.saturating_mul(scale),
            height: self.height.saturating_mul(scale),
        }
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Default for PlateSize {
    fn default() -> Self {
        Self {
            width: 216,
            height: 270,
        }
    }
}

/// Encoding used for captured plates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
        }
    }
}

/// Naming scheme for per-page archive folders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderNaming {
    /// Book id and page number run together (`bk17`)
    #[default]
    Concatenated,
    /// Book id and page number joined by a separator (`bk-17`)
    Separated(char),
}

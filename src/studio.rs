//! Application state and the controller that drives it.
//!
//! User input becomes an [`Action`]. [`AppState::apply`] updates the state and
//! answers with the [`Effect`]s the action calls for; [`Studio`] performs the
//! ones that need the outside world (capturing plates, exporting the archive).

use std::sync::Arc;

use log::{debug, info};

use crate::capture::{CapturePipeline, CaptureReport, Preview, PreviewStore};
use crate::export::{download_all_zip, ArchiveWriter, ExportPlan, SavedArchive, ZipArchiveWriter};
use crate::gallery::{generate_plates, Gallery};
use crate::navigation::{KeyEvent, Navigator};
use crate::platform::{LogNotifier, MemorySaveTarget, Notifier, SaveTarget};
use crate::rendering::{Rasterizer, SoftwareRasterizer};
use crate::style::{PlateStyle, BACKGROUND_PROPERTY, TEXT_COLOR_PROPERTY};
use crate::{Book, Error, PlateId, Result, StudioConfig};

/// Something the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the current book (and everything derived from it)
    Load(Book),
    Key(KeyEvent),
    SelectPage(i64),
    SetTextColor(String),
    /// Comma-separated gradient stops
    SetBackground(String),
    /// Capture every plate
    Compile,
    /// Package previews into the archive
    Download,
}

/// Follow-up work produced by [`AppState::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The active page changed (or was re-asserted) to this 1-based position
    PageActivated(usize),
    /// A style property must be pushed to the rendering surface
    StyleChanged {
        property: &'static str,
        value: String,
    },
    /// Run a capture pass
    Capture,
    /// Run an export
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Wait,
}

/// Everything the studio knows about the current session
#[derive(Debug, Clone, Default)]
pub struct AppState {
    book: Option<Book>,
    gallery: Option<Gallery>,
    navigator: Navigator,
    style: PlateStyle,
    previews: PreviewStore,
    cursor: Cursor,
    download_enabled: bool,
    last_capture: Option<CaptureReport>,
    last_export: Option<SavedArchive>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn gallery(&self) -> Option<&Gallery> {
        self.gallery.as_ref()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn style(&self) -> &PlateStyle {
        &self.style
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Whether the download trigger is available
    pub fn download_enabled(&self) -> bool {
        self.download_enabled
    }

    pub fn last_capture(&self) -> Option<&CaptureReport> {
        self.last_capture.as_ref()
    }

    pub fn last_export(&self) -> Option<&SavedArchive> {
        self.last_export.as_ref()
    }

    /// Apply `action` and return the effects it requires.
    pub fn apply(&mut self, action: Action) -> Result<Vec<Effect>> {
        match action {
            Action::Load(book) => {
                book.validate()?;
                let gallery = generate_plates(&book);
                info!(
                    "loaded book {:?}: {} pages, {} plates",
                    book.id,
                    book.page_count(),
                    gallery.plate_count()
                );
                // Replace wholesale; nothing from the previous book survives.
                *self = AppState {
                    previews: PreviewStore::for_plates(gallery.plate_ids()),
                    style: std::mem::take(&mut self.style),
                    ..AppState::default()
                };
                self.navigator.reset(book.page_count());
                self.gallery = Some(gallery);
                self.book = Some(book);
                Ok(self.navigator.active().map(Effect::PageActivated).into_iter().collect())
            }
            Action::Key(event) => Ok(self
                .navigator
                .handle_key(&event)
                .map(Effect::PageActivated)
                .into_iter()
                .collect()),
            Action::SelectPage(requested) => {
                if self.book.is_none() {
                    return Err(Error::NoDocument);
                }
                Ok(vec![Effect::PageActivated(self.navigator.select_page(requested))])
            }
            Action::SetTextColor(value) => {
                self.style.text_color = Some(value.clone());
                Ok(vec![Effect::StyleChanged {
                    property: TEXT_COLOR_PROPERTY,
                    value,
                }])
            }
            Action::SetBackground(stops) => {
                self.style.set_background(&stops);
                Ok(vec![Effect::StyleChanged {
                    property: BACKGROUND_PROPERTY,
                    value: self.style.background_css(),
                }])
            }
            Action::Compile => {
                if self.gallery.is_none() {
                    return Err(Error::NoDocument);
                }
                self.cursor = Cursor::Wait;
                Ok(vec![Effect::Capture])
            }
            Action::Download => {
                if self.book.is_none() {
                    return Err(Error::NoDocument);
                }
                if !self.download_enabled {
                    return Err(Error::ExportNotReady);
                }
                Ok(vec![Effect::Export])
            }
        }
    }
}

/// Top-level controller owning the state and the host capabilities
pub struct Studio {
    config: StudioConfig,
    state: AppState,
    rasterizer: Arc<dyn Rasterizer>,
    archiver: Arc<dyn ArchiveWriter>,
    save: Arc<dyn SaveTarget>,
    notifier: Arc<dyn Notifier>,
}

/// Builder for [`Studio`]; unset capabilities get the built-in defaults.
pub struct StudioBuilder {
    config: StudioConfig,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    archiver: Option<Arc<dyn ArchiveWriter>>,
    save: Option<Arc<dyn SaveTarget>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl StudioBuilder {
    pub fn rasterizer(mut self, r: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Some(Arc::new(r));
        self
    }

    pub fn archiver(mut self, a: impl ArchiveWriter + 'static) -> Self {
        self.archiver = Some(Arc::new(a));
        self
    }

    pub fn save_target(mut self, s: impl SaveTarget + 'static) -> Self {
        self.save = Some(Arc::new(s));
        self
    }

    pub fn notifier(mut self, n: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(n));
        self
    }

    pub fn build(self) -> Result<Studio> {
        self.config.validate()?;
        let concurrency = self.config.capture_concurrency;
        Ok(Studio {
            rasterizer: self
                .rasterizer
                .unwrap_or_else(|| Arc::new(SoftwareRasterizer::new(concurrency))),
            archiver: self.archiver.unwrap_or_else(|| Arc::new(ZipArchiveWriter::new())),
            save: self.save.unwrap_or_else(|| Arc::new(MemorySaveTarget::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            config: self.config,
            state: AppState::new(),
        })
    }
}

impl Studio {
    pub fn builder(config: StudioConfig) -> StudioBuilder {
        StudioBuilder {
            config,
            rasterizer: None,
            archiver: None,
            save: None,
            notifier: None,
        }
    }

    /// Studio with the software rasterizer, zip archives, in-memory saves and
    /// log alerts
    pub fn new(config: StudioConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply an action and perform the effects it produced.
    ///
    /// Returns every effect, including the ones already performed here, so a
    /// host can mirror page and style changes on its own surface.
    pub async fn dispatch(&mut self, action: Action) -> Result<Vec<Effect>> {
        let effects = self.state.apply(action)?;
        for effect in &effects {
            match effect {
                Effect::Capture => self.compile().await,
                Effect::Export => {
                    self.download().await?;
                }
                Effect::PageActivated(_) | Effect::StyleChanged { .. } => {}
            }
        }
        Ok(effects)
    }

    /// Feed a key event; returns whether it was consumed.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        match self.state.apply(Action::Key(event)) {
            Ok(effects) => !effects.is_empty(),
            Err(_) => false,
        }
    }

    /// Preview for a single plate, for individual downloads
    pub fn preview(&self, id: &PlateId) -> Option<&Preview> {
        self.state.previews.get(id)
    }

    async fn compile(&mut self) {
        let pipeline =
            CapturePipeline::new(&self.config, self.rasterizer.clone(), self.notifier.clone());
        let Some(gallery) = self.state.gallery.as_mut() else {
            return;
        };

        let (surface_height, oversized) = pipeline.expand(gallery);
        CapturePipeline::stage(gallery);
        let pending = pipeline.issue(gallery, &self.state.style);
        // requests are out; the rest happens as they complete
        self.state.cursor = Cursor::Default;

        let mut report = pending.settle(gallery, &mut self.state.previews).await;
        report.surface_height = surface_height;
        report.oversized = oversized;

        // Downloads open only once every request has settled.
        self.state.download_enabled = true;
        self.state.last_capture = Some(report);
    }

    async fn download(&mut self) -> Result<&SavedArchive> {
        let book = self.state.book.as_ref().ok_or(Error::NoDocument)?;
        let plan = ExportPlan::new(book, &self.state.previews, &self.config);
        debug!("exporting {} entries as {}", plan.entries.len(), plan.file_name);

        let saved = download_all_zip(plan, self.archiver.clone(), self.save.as_ref()).await?;
        Ok(self.state.last_export.insert(saved))
    }
}

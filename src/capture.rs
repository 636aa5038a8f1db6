//! Capture pipeline: rasterize every plate and keep the resulting previews.
//!
//! A pass runs in three steps:
//!
//! 1. [`CapturePipeline::expand`] scales the surface and alerts (without
//!    stopping) when it grows past the safe capture height.
//! 2. [`CapturePipeline::stage`] moves every page into the summary region and
//!    makes it visible.
//! 3. [`CapturePipeline::issue`] starts one capture per plate;
//!    [`PendingCaptures::settle`] applies completions as they arrive.
//!
//! All gallery mutation happens inside `settle` on the caller's task, so
//! captures can finish in any order without locking anything.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine as _;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use log::{debug, error, info};

use crate::book::PlateId;
use crate::gallery::{Gallery, Region};
use crate::platform::Notifier;
use crate::rendering::{raster, CaptureRequest, Rasterizer};
use crate::style::PlateStyle;
use crate::{Error, ImageFormat, PlateSize, Result, StudioConfig};

/// A resolvable reference to encoded image bytes (`data:` URI)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHandle(String);

impl DataHandle {
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        DataHandle(format!("data:{};base64,{}", format.mime_type(), payload))
    }

    /// Wrap an existing URI without checking it; problems surface on resolve.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        DataHandle(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media type declared by the handle, if it is a well-formed data URI
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let (meta, _) = rest.split_once(',')?;
        Some(meta.split(';').next().unwrap_or(meta))
    }

    /// Decode the underlying bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let rest = self
            .0
            .strip_prefix("data:")
            .ok_or_else(|| Error::ResolveError("handle is not a data URI".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::ResolveError("data URI has no payload".into()))?;
        if !meta.ends_with(";base64") {
            return Err(Error::ResolveError(format!("unsupported data URI encoding: {}", meta)));
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::ResolveError(e.to_string()))
    }

    /// Fetch the bytes behind the handle
    pub async fn resolve(&self) -> Result<Vec<u8>> {
        self.decode()
    }
}

/// A captured plate, ready for display or download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub plate_id: PlateId,
    pub handle: DataHandle,
    /// Download name, `{plate id}.{ext}`
    pub file_name: String,
    /// Captured pixel size
    pub size: PlateSize,
    /// Thumbnail size shown in the summary
    pub display_size: PlateSize,
}

/// Previews keyed by plate id, iterated in plate construction order
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    order: Vec<PlateId>,
    by_id: HashMap<PlateId, Preview>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store ordered by `plates`, normally [`Gallery::plate_ids`]
    pub fn for_plates(plates: Vec<PlateId>) -> Self {
        Self {
            order: plates,
            by_id: HashMap::new(),
        }
    }

    /// Insert or replace the preview for its plate. Plates unknown to the
    /// ordering are appended after the known ones.
    pub fn insert(&mut self, preview: Preview) {
        if !self.order.contains(&preview.plate_id) {
            self.order.push(preview.plate_id.clone());
        }
        self.by_id.insert(preview.plate_id.clone(), preview);
    }

    pub fn get(&self, id: &PlateId) -> Option<&Preview> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Previews in page order, then plate order
    pub fn iter(&self) -> impl Iterator<Item = &Preview> {
        self.order.iter().filter_map(move |id| self.by_id.get(id))
    }
}

/// Outcome of a capture pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Capture requests started
    pub issued: usize,
    /// Plates whose preview was stored, in completion order
    pub completed: Vec<PlateId>,
    /// Plates whose capture or encoding failed, with the reason
    pub failed: Vec<(PlateId, String)>,
    /// Summary surface height after expansion
    pub surface_height: u64,
    /// Whether the surface exceeded the safe capture height
    pub oversized: bool,
}

impl CaptureReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.completed.len() == self.issued
    }
}

type Completion = (usize, PlateId, Result<Preview>);

/// Requests issued by [`CapturePipeline::issue`] that have not settled yet
pub struct PendingCaptures {
    inflight: FuturesUnordered<BoxFuture<'static, Completion>>,
    issued: usize,
}

impl PendingCaptures {
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Await every request, applying each completion as it lands: store the
    /// preview, attach it to its page and hide the plate. A failed plate is
    /// logged and reported; the rest keep going.
    pub async fn settle(mut self, gallery: &mut Gallery, store: &mut PreviewStore) -> CaptureReport {
        let mut report = CaptureReport {
            issued: self.issued,
            ..Default::default()
        };

        while let Some((page_idx, id, result)) = self.inflight.next().await {
            match result {
                Ok(preview) => {
                    if let Some(page) = gallery.pages.get_mut(page_idx) {
                        if !page.previews.contains(&id) {
                            page.previews.push(id.clone());
                        }
                        if let Some(plate) = page.plates.iter_mut().find(|p| p.id == id) {
                            plate.hide();
                        }
                    }
                    debug!("captured plate {}", id);
                    store.insert(preview);
                    report.completed.push(id);
                }
                Err(e) => {
                    error!("capture of plate {} failed: {}", id, e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        info!(
            "capture pass finished: {}/{} plates, {} failed",
            report.completed.len(),
            report.issued,
            report.failed.len()
        );
        report
    }
}

/// Drives capture passes over a gallery
pub struct CapturePipeline<'a> {
    config: &'a StudioConfig,
    rasterizer: Arc<dyn Rasterizer>,
    notifier: Arc<dyn Notifier>,
}

impl<'a> CapturePipeline<'a> {
    pub fn new(
        config: &'a StudioConfig,
        rasterizer: Arc<dyn Rasterizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            notifier,
        }
    }

    /// Scale the surface up for capture.
    ///
    /// Returns the expanded height and whether it crossed the safe threshold.
    /// Crossing it raises an alert but is not an error.
    pub fn expand(&self, gallery: &mut Gallery) -> (u64, bool) {
        gallery.scale = self.config.capture_scale;
        let height = gallery.surface_height(self.config);
        let oversized = height > self.config.max_capture_height;
        if oversized {
            self.notifier.alert(&format!(
                "Big window: summary surface is {}px tall, captures above {}px may come out blank",
                height, self.config.max_capture_height
            ));
        }
        (height, oversized)
    }

    /// Move every page into the summary region and force it visible.
    pub fn stage(gallery: &mut Gallery) {
        for page in &mut gallery.pages {
            page.region = Region::Summary;
            page.visible = true;
        }
    }

    /// Start one capture per plate without waiting on any of them.
    ///
    /// Each request rasterizes the plate and encodes it in the configured
    /// format before completing.
    pub fn issue(&self, gallery: &Gallery, style: &PlateStyle) -> PendingCaptures {
        let inflight = FuturesUnordered::new();
        let format = self.config.image_format;
        let display_size = self.config.preview_size();

        for (page_idx, page) in gallery.pages.iter().enumerate() {
            for plate in &page.plates {
                let request = CaptureRequest {
                    plate_id: plate.id.clone(),
                    element: plate.element(),
                    style: style.clone(),
                    size: self.config.plate_size,
                    scale: gallery.scale,
                };
                let id = plate.id.clone();
                let capture = self.rasterizer.capture(request);
                let fut = async move {
                    let result = async {
                        let capture = capture.await?;
                        let size = PlateSize {
                            width: capture.width,
                            height: capture.height,
                        };
                        let bytes = tokio::task::spawn_blocking(move || raster::encode_png(&capture))
                            .await
                            .map_err(|e| Error::EncodeError(e.to_string()))??;
                        Ok::<_, Error>(Preview {
                            plate_id: id.clone(),
                            handle: DataHandle::from_bytes(format, &bytes),
                            file_name: id.file_name(format.extension()),
                            size,
                            display_size,
                        })
                    }
                    .await;
                    (page_idx, id, result)
                };
                inflight.push(fut.boxed());
            }
        }

        let issued = inflight.len();
        debug!("issued {} capture requests", issued);
        PendingCaptures { inflight, issued }
    }
}

/// Run a full pass: expand, stage, issue, then settle every request.
pub async fn compile_plates(
    pipeline: &CapturePipeline<'_>,
    gallery: &mut Gallery,
    style: &PlateStyle,
    store: &mut PreviewStore,
) -> CaptureReport {
    let (surface_height, oversized) = pipeline.expand(gallery);
    CapturePipeline::stage(gallery);
    let pending = pipeline.issue(gallery, style);
    let mut report = pending.settle(gallery, store).await;
    report.surface_height = surface_height;
    report.oversized = oversized;
    report
}

//! Rendering module: plate layout, paint and rasterization

pub mod layout;
pub mod paint;
pub mod raster;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Semaphore;

use crate::book::PlateId;
use crate::gallery::Element;
use crate::style::PlateStyle;
use crate::{Error, PlateSize, Result, MAX_CAPTURE_PIXELS};

/// Raw pixels produced by a rasterizer, RGBA8 row-major.
#[derive(Debug, Clone)]
pub struct Capture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Everything a rasterizer needs to capture one plate
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub plate_id: PlateId,
    pub element: Element,
    pub style: PlateStyle,
    /// Unscaled plate frame
    pub size: PlateSize,
    pub scale: u32,
}

impl CaptureRequest {
    pub fn surface_size(&self) -> PlateSize {
        self.size.scaled(self.scale)
    }
}

/// Rasterization capability.
///
/// Each call resolves independently of every other; the pipeline issues all
/// requests before awaiting any of them.
pub trait Rasterizer: Send + Sync {
    fn capture(&self, request: CaptureRequest) -> BoxFuture<'static, Result<Capture>>;
}

/// Lay out, paint and rasterize one plate synchronously.
pub fn render_plate(request: &CaptureRequest) -> Capture {
    let nodes = layout::layout_plate(&request.element, request.size, request.scale);
    let commands = paint::build_display_list(&nodes, &request.style);
    let surface = request.surface_size();
    raster::rasterize(&commands, surface.width, surface.height)
}

/// Built-in rasterizer running [`render_plate`] on the blocking pool.
///
/// At most `concurrency` plates are painted at once; the rest wait for a
/// permit.
#[derive(Clone)]
pub struct SoftwareRasterizer {
    permits: Arc<Semaphore>,
}

impl SoftwareRasterizer {
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn capture(&self, request: CaptureRequest) -> BoxFuture<'static, Result<Capture>> {
        let permits = self.permits.clone();
        async move {
            let surface = request.surface_size();
            if surface.pixels() > MAX_CAPTURE_PIXELS {
                return Err(Error::CaptureError(format!(
                    "{}: {}x{} surface exceeds {} pixels",
                    request.plate_id, surface.width, surface.height, MAX_CAPTURE_PIXELS
                )));
            }
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| Error::CaptureError(format!("rasterizer closed: {}", e)))?;
            let id = request.plate_id.clone();
            tokio::task::spawn_blocking(move || render_plate(&request))
                .await
                .map_err(|e| Error::CaptureError(format!("{}: {}", id, e)))
        }
        .boxed()
    }
}

//! The shared render backend and per-request render sessions.

use scrawl_render::{
    Diagnostics, FontBackend, FontConfig, RasterError, Rasterizer, ResvgRasterizer,
};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::{OnceCell, OwnedSemaphorePermit};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub fonts: FontConfig,
}

/// Lazily created rasterizer shared by every request.
///
/// The backend is built on first use and reused until process exit. Concurrent first callers
/// await the same in-flight initialization instead of building their own. A failed
/// initialization is reported to the callers that awaited it; the next request tries again.
pub struct BackendHandle {
    config: BackendConfig,
    cell: OnceCell<Arc<dyn Rasterizer>>,
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("config", &self.config)
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}

static GLOBAL: OnceLock<BackendHandle> = OnceLock::new();

impl BackendHandle {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// A handle that is already initialized with `rasterizer`.
    pub fn with_rasterizer(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            config: BackendConfig::default(),
            cell: OnceCell::new_with(Some(rasterizer)),
        }
    }

    /// The process-wide handle. The first caller's configuration wins.
    pub fn global(config: &BackendConfig) -> &'static BackendHandle {
        let handle = GLOBAL.get_or_init(|| BackendHandle::new(config.clone()));
        if handle.config != *config {
            tracing::debug!("process-wide render backend already configured; ignoring new config");
        }
        handle
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> scrawl_render::Result<Arc<dyn Rasterizer>> {
        let rasterizer = self
            .cell
            .get_or_try_init(|| async {
                let fonts = self.config.fonts.clone();
                let started = Instant::now();
                // Scanning font directories is blocking file I/O.
                let backend = tokio::task::spawn_blocking(move || FontBackend::new(&fonts))
                    .await
                    .map_err(|join| RasterError::Backend(join.to_string()))??;
                tracing::info!(
                    faces = backend.face_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "render backend initialized"
                );
                Ok::<_, RasterError>(
                    Arc::new(ResvgRasterizer::new(backend)) as Arc<dyn Rasterizer>
                )
            })
            .await?;
        Ok(Arc::clone(rasterizer))
    }
}

/// Scoped resources of one render: the admission permit and the diagnostics collected so far.
///
/// Dropping the session releases the permit, whichever way the render ended.
#[derive(Debug)]
pub struct RenderSession {
    id: u64,
    started: Instant,
    pub diagnostics: Diagnostics,
    _permit: OwnedSemaphorePermit,
}

impl RenderSession {
    pub(crate) fn open(id: u64, permit: OwnedSemaphorePermit) -> Self {
        tracing::debug!(session = id, "render session opened");
        Self {
            id,
            started: Instant::now(),
            diagnostics: Diagnostics::new(),
            _permit: permit,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        tracing::debug!(
            session = self.id,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            diagnostics = self.diagnostics.len(),
            "render session closed"
        );
    }
}

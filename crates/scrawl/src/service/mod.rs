//! Request handling for the direct-scene and diagram-text render endpoints.
//!
//! [`RenderService`] is transport-neutral: it takes a raw JSON body and returns a
//! [`RenderResponse`] (status, headers, bytes) that any HTTP layer can forward as is.
//!
//! Every render goes through the same admission path:
//! 1. payload validation (400 on failure, nothing else runs)
//! 2. the shared backend, created on first use ([`BackendHandle`])
//! 3. an admission permit, held by a [`RenderSession`] until the render ends
//! 4. the scene pipeline and the rasterizer on the blocking thread pool
//!
//! Steps 2 to 4 run under the configured render timeout.

mod backend;
mod request;
mod response;

pub use backend::{BackendConfig, BackendHandle, RenderSession};
pub use request::{DiagramRequest, SceneRequest, ValidationError};
pub use response::RenderResponse;

use scrawl_core::scene::MIME_PNG;
use scrawl_core::{
    DiagramConfig, DiagramLayout, LayoutError, LayoutOutput, RenderScene, ScenePipeline,
};
use scrawl_render::fonts::DEFAULT_FONT_FAMILY;
use scrawl_render::{Diagnostics, FontConfig, RasterError, Rasterizer};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::Instrument;

pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 4;
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Renders allowed to run at once; further requests wait for a permit.
    pub max_concurrent_renders: usize,
    /// Upper bound for backend start-up, admission wait and the render itself.
    pub render_timeout: Duration,
    pub backend: BackendConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_renders: DEFAULT_MAX_CONCURRENT_RENDERS,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            backend: BackendConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Reads `SCRAWL_MAX_CONCURRENT_RENDERS`, `SCRAWL_RENDER_TIMEOUT_MS`, `SCRAWL_FONT_DIRS` and
    /// `SCRAWL_FONT_FAMILY`. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("SCRAWL_MAX_CONCURRENT_RENDERS") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_concurrent_renders = n.min(Semaphore::MAX_PERMITS),
                _ => tracing::warn!(value = %raw, "ignoring invalid SCRAWL_MAX_CONCURRENT_RENDERS"),
            }
        }
        if let Some(raw) = lookup("SCRAWL_RENDER_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.render_timeout = Duration::from_millis(ms),
                _ => tracing::warn!(value = %raw, "ignoring invalid SCRAWL_RENDER_TIMEOUT_MS"),
            }
        }
        if let Some(raw) = lookup("SCRAWL_FONT_DIRS") {
            config.backend.fonts.dirs = std::env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect::<Vec<PathBuf>>();
        }
        if let Some(raw) = lookup("SCRAWL_FONT_FAMILY") {
            let family = raw.trim();
            config.backend.fonts.family = if family.is_empty() {
                DEFAULT_FONT_FAMILY.to_string()
            } else {
                family.to_string()
            };
        }
        config
    }

    pub fn fonts(&self) -> &FontConfig {
        &self.backend.fonts
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Pipeline(#[from] scrawl_core::Error),
    #[error(transparent)]
    Backend(RasterError),
    #[error("{source}")]
    Render {
        source: RasterError,
        diagnostics: Diagnostics,
    },
    #[error("render timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("render service is not accepting work")]
    Closed,
    #[error("render task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// 400 for caller mistakes (payload, detection, diagram parse), 500 for everything else.
    pub fn status(&self) -> u16 {
        match self {
            Self::Invalid(_) => 400,
            Self::Pipeline(err) if err.is_client_error() => 400,
            _ => 500,
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Render { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    /// The error text sent to clients, with collected diagnostics appended.
    pub fn response_message(&self) -> String {
        match self.diagnostics().filter(|d| !d.is_empty()) {
            Some(diagnostics) => format!("{self} | Diagnostics: {}", diagnostics.summary()),
            None => self.to_string(),
        }
    }
}

/// Layout step used when the service is built without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayoutEngine;

impl DiagramLayout for NoLayoutEngine {
    fn layout(
        &self,
        _text: &str,
        _config: &DiagramConfig,
    ) -> std::result::Result<LayoutOutput, LayoutError> {
        Err(LayoutError::failed("no diagram layout engine is configured"))
    }
}

#[derive(Debug, Clone)]
enum BackendRef {
    Global(&'static BackendHandle),
    Owned(Arc<BackendHandle>),
}

impl BackendRef {
    fn handle(&self) -> &BackendHandle {
        match self {
            Self::Global(handle) => handle,
            Self::Owned(handle) => handle,
        }
    }
}

pub struct RenderService {
    config: ServiceConfig,
    permits: Arc<Semaphore>,
    backend: BackendRef,
    layout: Arc<dyn DiagramLayout + Send + Sync>,
    pipeline: Arc<ScenePipeline>,
    next_session: AtomicU64,
}

impl std::fmt::Debug for RenderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderService")
            .field("config", &self.config)
            .field("available_permits", &self.permits.available_permits())
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl RenderService {
    /// A service on the process-wide backend, using `layout` for diagram text.
    pub fn new(
        config: ServiceConfig,
        layout: Arc<dyn DiagramLayout + Send + Sync>,
    ) -> scrawl_core::Result<Self> {
        let max = config.max_concurrent_renders.clamp(1, Semaphore::MAX_PERMITS);
        Ok(Self {
            permits: Arc::new(Semaphore::new(max)),
            backend: BackendRef::Global(BackendHandle::global(&config.backend)),
            layout,
            pipeline: Arc::new(ScenePipeline::new()?),
            next_session: AtomicU64::new(1),
            config,
        })
    }

    /// A service that renders direct scenes only; diagram text fails with a server error.
    pub fn scene_only(config: ServiceConfig) -> scrawl_core::Result<Self> {
        Self::new(config, Arc::new(NoLayoutEngine))
    }

    /// Replaces the process-wide backend with a private one.
    pub fn with_backend(mut self, backend: BackendHandle) -> Self {
        self.backend = BackendRef::Owned(Arc::new(backend));
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Direct-scene endpoint.
    pub async fn render_scene(&self, body: &[u8]) -> RenderResponse {
        let span = tracing::info_span!("render", kind = "scene", bytes = body.len());
        async {
            let result = match SceneRequest::from_slice(body) {
                Ok(request) => {
                    tracing::debug!(elements = request.elements.len(), "scene request accepted");
                    let pipeline = Arc::clone(&self.pipeline);
                    self.run(move |session, rasterizer| {
                        let scene = pipeline.elements_to_scene(
                            request.elements,
                            request.files,
                            &request.params,
                        );
                        rasterize(rasterizer.as_ref(), &scene, session)
                    })
                    .await
                }
                Err(err) => Err(err.into()),
            };
            respond(result)
        }
        .instrument(span)
        .await
    }

    /// Diagram-text endpoint.
    pub async fn render_diagram(&self, body: &[u8]) -> RenderResponse {
        let span = tracing::info_span!("render", kind = "diagram", bytes = body.len());
        async {
            let result = match DiagramRequest::from_slice(body) {
                Ok(request) => {
                    let pipeline = Arc::clone(&self.pipeline);
                    let layout = Arc::clone(&self.layout);
                    self.run(move |session, rasterizer| {
                        let scene = pipeline.diagram_to_scene(
                            layout.as_ref(),
                            &request.mermaid,
                            request.config.as_ref(),
                            &request.params,
                        )?;
                        rasterize(rasterizer.as_ref(), &scene, session)
                    })
                    .await
                }
                Err(err) => Err(err.into()),
            };
            respond(result)
        }
        .instrument(span)
        .await
    }

    async fn run<F>(&self, work: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&mut RenderSession, Arc<dyn Rasterizer>) -> Result<Vec<u8>> + Send + 'static,
    {
        let timeout = self.config.render_timeout;
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let admitted = async move {
            let rasterizer = self
                .backend
                .handle()
                .get()
                .await
                .map_err(ServiceError::Backend)?;
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|_| ServiceError::Closed)?;
            let mut session = RenderSession::open(id, permit);
            // The session moves to the blocking thread: if this future is dropped or times out,
            // the permit is released once the work there has finished.
            tokio::task::spawn_blocking(move || work(&mut session, rasterizer))
                .await
                .map_err(|join| ServiceError::Task(join.to_string()))?
        };
        tokio::time::timeout(timeout, admitted)
            .await
            .map_err(|_| ServiceError::Timeout(timeout))?
    }
}

fn rasterize(
    rasterizer: &dyn Rasterizer,
    scene: &RenderScene,
    session: &mut RenderSession,
) -> Result<Vec<u8>> {
    rasterizer
        .rasterize(scene, &mut session.diagnostics)
        .map_err(|source| ServiceError::Render {
            source,
            diagnostics: std::mem::take(&mut session.diagnostics),
        })
}

fn respond(result: Result<Vec<u8>>) -> RenderResponse {
    match result {
        Ok(bytes) => {
            tracing::info!(bytes = bytes.len(), "render succeeded");
            RenderResponse::image(MIME_PNG, bytes)
        }
        Err(err) => {
            let status = err.status();
            let message = err.response_message();
            if status >= 500 {
                tracing::error!(status, error = %message, "render failed");
            } else {
                tracing::info!(status, error = %message, "render rejected");
            }
            RenderResponse::error(status, &message)
        }
    }
}

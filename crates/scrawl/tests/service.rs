#![cfg(feature = "render")]

use scrawl::render::{Diagnostics, FontConfig, RasterError, Rasterizer};
use scrawl::service::{BackendConfig, BackendHandle, RenderResponse, RenderService, ServiceConfig};
use scrawl::{DiagramConfig, LayoutError, LayoutOutput, PrecomputedLayout, RenderScene};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn offline_backend() -> BackendHandle {
    BackendHandle::new(BackendConfig {
        fonts: FontConfig {
            load_system_fonts: false,
            ..FontConfig::default()
        },
    })
}

fn service(config: ServiceConfig) -> RenderService {
    RenderService::scene_only(config)
        .unwrap()
        .with_backend(offline_backend())
}

fn body(value: Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

fn two_rectangles() -> Vec<u8> {
    body(json!({
        "elements": [
            { "id": "a", "type": "rectangle", "x": 0, "y": 0, "width": 80, "height": 30 },
            { "id": "b", "type": "rectangle", "x": 100, "y": 0, "width": 80, "height": 30 }
        ]
    }))
}

fn png_size(bytes: &[u8]) -> (u32, u32) {
    assert!(bytes.starts_with(PNG_SIGNATURE));
    let be = |at: usize| {
        u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    };
    (be(16), be(20))
}

fn assert_error(response: &RenderResponse, status: u16, message: &str) {
    assert_eq!(response.status, status, "{:?}", response.error_message());
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.header("cache-control"), Some("no-store"));
    assert_eq!(response.error_message().as_deref(), Some(message));
}

#[tokio::test]
async fn invalid_payloads_are_rejected_before_rendering() {
    let backend = offline_backend();
    let service = RenderService::scene_only(ServiceConfig::default())
        .unwrap()
        .with_backend(backend);

    assert_error(&service.render_scene(b"{").await, 400, "Invalid JSON body");
    assert_error(
        &service.render_scene(&body(json!({ "elements": [] }))).await,
        400,
        "Payload must include a non-empty elements array",
    );
    assert_error(
        &service
            .render_scene(&body(json!({
                "elements": [{ "id": "a", "type": "rectangle" }],
                "exportScale": -1
            })))
            .await,
        400,
        "exportScale must be a positive number",
    );
    assert_error(
        &service.render_diagram(&body(json!({ "text": "graph TD" }))).await,
        400,
        "Payload must include a mermaid string",
    );
}

#[tokio::test]
async fn direct_scene_renders_png() {
    let service = service(ServiceConfig::default());
    let response = service.render_scene(&two_rectangles()).await;

    assert!(response.is_success(), "{:?}", response.error_message());
    assert_eq!(response.header("Content-Type"), Some("image/png"));
    assert_eq!(response.header("Cache-Control"), Some("no-store"));
    assert_eq!(png_size(&response.body), (200, 50));
}

#[tokio::test]
async fn output_params_reach_the_rasterizer() {
    let service = service(ServiceConfig::default());
    let mut payload: Value = serde_json::from_slice(&two_rectangles()).unwrap();
    payload["exportScale"] = json!(2);
    payload["exportPadding"] = json!(0);
    let response = service.render_scene(&body(payload)).await;

    assert_eq!(response.status, 200);
    assert_eq!(png_size(&response.body), (360, 60));
}

const CLASS_TEXT: &str = "classDiagram\nclass Order {\n+id: int\n}\n";

#[tokio::test]
async fn diagram_text_renders_through_the_layout_step() {
    let layout = PrecomputedLayout::from_json_str(
        &json!([
            { "id": "Order", "type": "rectangle", "x": 0, "y": 0, "width": 160, "height": 80 }
        ])
        .to_string(),
    )
    .unwrap();
    let service = RenderService::new(ServiceConfig::default(), Arc::new(layout))
        .unwrap()
        .with_backend(offline_backend());

    let response = service
        .render_diagram(&body(json!({ "mermaid": CLASS_TEXT, "backgroundColor": "#ffffff" })))
        .await;
    assert_eq!(response.status, 200, "{:?}", response.error_message());
    let (width, height) = png_size(&response.body);
    assert!(width >= 180 && height >= 100, "{width}x{height}");
}

fn rejecting(_: &str, _: &DiagramConfig) -> Result<LayoutOutput, LayoutError> {
    Err(LayoutError::parse("unexpected token on line 2"))
}

fn crashing(_: &str, _: &DiagramConfig) -> Result<LayoutOutput, LayoutError> {
    Err(LayoutError::failed("worker crashed"))
}

#[tokio::test]
async fn diagram_failures_map_to_status_codes() {
    let parse = RenderService::new(ServiceConfig::default(), Arc::new(rejecting))
        .unwrap()
        .with_backend(offline_backend());
    assert_error(
        &parse
            .render_diagram(&body(json!({ "mermaid": "hello world" })))
            .await,
        400,
        "No diagram type detected for text: hello world",
    );
    assert_error(
        &parse
            .render_diagram(&body(json!({ "mermaid": "flowchart TD\nA-->" })))
            .await,
        400,
        "Diagram parse error: unexpected token on line 2",
    );

    let crash = RenderService::new(ServiceConfig::default(), Arc::new(crashing))
        .unwrap()
        .with_backend(offline_backend());
    assert_error(
        &crash
            .render_diagram(&body(json!({ "mermaid": "flowchart TD\nA-->B" })))
            .await,
        500,
        "Layout failed: worker crashed",
    );

    let none = service(ServiceConfig::default());
    assert_error(
        &none
            .render_diagram(&body(json!({ "mermaid": "flowchart TD\nA-->B" })))
            .await,
        500,
        "Layout failed: no diagram layout engine is configured",
    );
}

/// Pushes two diagnostics and then fails.
struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(
        &self,
        _: &RenderScene,
        diagnostics: &mut Diagnostics,
    ) -> scrawl::render::Result<Vec<u8>> {
        diagnostics.push("unsupported element type `magic` (id m1)");
        diagnostics.push("image i1 has no data URL");
        Err(RasterError::PngEncode)
    }
}

#[tokio::test]
async fn rasterizer_failures_carry_diagnostics() {
    let service = RenderService::scene_only(ServiceConfig::default())
        .unwrap()
        .with_backend(BackendHandle::with_rasterizer(Arc::new(FailingRasterizer)));

    assert_error(
        &service.render_scene(&two_rectangles()).await,
        500,
        "failed to encode PNG | Diagnostics: unsupported element type `magic` (id m1) | image i1 has no data URL",
    );
    assert_eq!(service.available_permits(), 4);
}

/// Sleeps on the blocking pool and records how many renders overlapped.
#[derive(Default)]
struct SlowRasterizer {
    delay: Duration,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Rasterizer for SlowRasterizer {
    fn rasterize(&self, _: &RenderScene, _: &mut Diagnostics) -> scrawl::render::Result<Vec<u8>> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(PNG_SIGNATURE.to_vec())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_renders_are_capped() {
    let rasterizer = Arc::new(SlowRasterizer {
        delay: Duration::from_millis(50),
        ..SlowRasterizer::default()
    });
    let config = ServiceConfig {
        max_concurrent_renders: 2,
        ..ServiceConfig::default()
    };
    let service = Arc::new(
        RenderService::scene_only(config)
            .unwrap()
            .with_backend(BackendHandle::with_rasterizer(rasterizer.clone())),
    );

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.render_scene(&two_rectangles()).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().status, 200);
    }

    let peak = rasterizer.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak {peak}");
    assert_eq!(service.available_permits(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_renders_time_out_and_release_their_permit() {
    let rasterizer = Arc::new(SlowRasterizer {
        delay: Duration::from_millis(300),
        ..SlowRasterizer::default()
    });
    let config = ServiceConfig {
        max_concurrent_renders: 1,
        render_timeout: Duration::from_millis(50),
        ..ServiceConfig::default()
    };
    let service = RenderService::scene_only(config)
        .unwrap()
        .with_backend(BackendHandle::with_rasterizer(rasterizer));

    assert_error(
        &service.render_scene(&two_rectangles()).await,
        500,
        "render timed out after 50 ms",
    );

    let mut waited = Duration::ZERO;
    while service.available_permits() == 0 && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert_eq!(service.available_permits(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn backend_initializes_once_for_concurrent_callers() {
    let handle = Arc::new(offline_backend());
    assert!(!handle.is_initialized());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move { handle.get().await.unwrap() })
        })
        .collect();
    let mut backends = Vec::new();
    for task in tasks {
        backends.push(task.await.unwrap());
    }

    assert!(handle.is_initialized());
    assert!(backends.iter().all(|b| Arc::ptr_eq(b, &backends[0])));
}

#[tokio::test]
async fn backend_failures_are_server_errors_and_retried() {
    let missing = PathBuf::from("/definitely/not/a/font/dir");
    let handle = BackendHandle::new(BackendConfig {
        fonts: FontConfig {
            dirs: vec![missing.clone()],
            load_system_fonts: false,
            ..FontConfig::default()
        },
    });
    let service = RenderService::scene_only(ServiceConfig::default())
        .unwrap()
        .with_backend(handle);

    for _ in 0..2 {
        let response = service.render_scene(&two_rectangles()).await;
        assert_error(
            &response,
            500,
            &format!("font directory `{}` does not exist", missing.display()),
        );
    }
}

#[test]
fn global_backend_is_shared() {
    let first = BackendHandle::global(&BackendConfig::default());
    let second = BackendHandle::global(&BackendConfig {
        fonts: FontConfig {
            family: "Inter".to_string(),
            ..FontConfig::default()
        },
    });
    assert!(std::ptr::eq(first, second));
}

use scrawl::service::{RenderService, SceneRequest, ServiceConfig, ValidationError};
use scrawl_core::dsl::{DslDocument, DslError};
use scrawl_core::scene::{MIME_JPEG, MIME_SVG};
use scrawl_core::{LayoutError, PrecomputedLayout, RenderScene, ScenePipeline};
use scrawl_render::{Diagnostics, FontBackend, RasterError, Rasterizer, ResvgRasterizer};
use serde_json::{Map, Value};
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Input(String),
    Invalid(ValidationError),
    Core(scrawl_core::Error),
    Layout(LayoutError),
    Dsl(DslError),
    Raster(RasterError, Diagnostics),
    Service { status: u16, message: String },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Invalid(err) => write!(f, "{err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Dsl(err) => write!(f, "{err}"),
            CliError::Raster(err, diagnostics) if diagnostics.is_empty() => write!(f, "{err}"),
            CliError::Raster(err, diagnostics) => {
                write!(f, "{err} | Diagnostics: {}", diagnostics.summary())
            }
            CliError::Service { status, message } => {
                write!(f, "render failed (status {status}): {message}")
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<scrawl_core::Error> for CliError {
    fn from(value: scrawl_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<LayoutError> for CliError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

impl From<DslError> for CliError {
    fn from(value: DslError) -> Self {
        Self::Dsl(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Render,
    Mermaid,
    Labels,
    Dsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Png,
    Jpeg,
    Svg,
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "svg" => Ok(Self::Svg),
            _ => Err(()),
        }
    }
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }

    fn is_raster(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Option<Command>,
    input: Option<String>,
    format: Option<OutputFormat>,
    /// Output flags in request-payload form (`exportScale`, `backgroundColor`, ...).
    output: Map<String, Value>,
    layout: Option<String>,
    config: Option<String>,
    emit_scene: bool,
    pretty: bool,
    out: Option<String>,
}

fn usage() -> &'static str {
    "scrawl\n\
\n\
USAGE:\n\
  scrawl render [--format png|jpg|svg] [OUTPUT FLAGS] [--out <path>] [<scene.json>|-]\n\
  scrawl mermaid --layout <layout.json> [--config <json>] [--emit-scene] [--format png|jpg|svg] [OUTPUT FLAGS] [--out <path>] [<diagram>|-]\n\
  scrawl labels [--pretty] [<diagram>|-]\n\
  scrawl dsl [--format json|png|jpg|svg] [OUTPUT FLAGS] [--out <path>] [<dsl.json>|-]\n\
\n\
OUTPUT FLAGS:\n\
  --scale <n> --padding <n> --max-size <n> --quality <q> --background <css-color> --dark\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - PNG and JPG output defaults to writing next to the input file (or ./out.<ext> for stdin).\n\
  - SVG and JSON output is printed to stdout unless --out is given.\n\
  - '--out -' writes raster bytes to stdout.\n\
  - Logging goes to stderr; set SCRAWL_LOG (e.g. SCRAWL_LOG=debug) to change the level.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn number_flag<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<Value, CliError> {
    let raw = next_value(it)?;
    let n = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CliError::Usage(usage()))?;
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or(CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" if args.command.is_none() => args.command = Some(Command::Render),
            "mermaid" if args.command.is_none() => args.command = Some(Command::Mermaid),
            "labels" if args.command.is_none() => args.command = Some(Command::Labels),
            "dsl" if args.command.is_none() => args.command = Some(Command::Dsl),
            "--pretty" => args.pretty = true,
            "--emit-scene" => args.emit_scene = true,
            "--dark" => {
                args.output.insert("darkMode".to_string(), Value::Bool(true));
            }
            "--format" => {
                args.format = Some(
                    next_value(&mut it)?
                        .parse::<OutputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--scale" => {
                args.output
                    .insert("exportScale".to_string(), number_flag(&mut it)?);
            }
            "--padding" => {
                args.output
                    .insert("exportPadding".to_string(), number_flag(&mut it)?);
            }
            "--max-size" => {
                args.output.insert("maxSize".to_string(), number_flag(&mut it)?);
            }
            "--quality" => {
                args.output.insert("quality".to_string(), number_flag(&mut it)?);
            }
            "--background" => {
                let bg = next_value(&mut it)?;
                if !bg.trim().is_empty() {
                    args.output.insert(
                        "backgroundColor".to_string(),
                        Value::String(bg.trim().to_string()),
                    );
                }
            }
            "--layout" => args.layout = Some(next_value(&mut it)?.clone()),
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--out" => args.out = Some(next_value(&mut it)?.clone()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" if args.input.is_none() => args.input = Some("-".to_string()),
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    let Some(command) = args.command else {
        return Err(CliError::Usage(usage()));
    };
    match (command, args.format) {
        (Command::Mermaid, _) if args.layout.is_none() => return Err(CliError::Usage(usage())),
        (Command::Render | Command::Mermaid, Some(OutputFormat::Json)) => {
            return Err(CliError::Usage(usage()));
        }
        _ => {}
    }
    Ok(args)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SCRAWL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(
    value: &impl serde::Serialize,
    pretty: bool,
    out: Option<&str>,
) -> Result<(), CliError> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    write_text(&text, out)
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        Some(path) if path != "-" => std::path::PathBuf::from(path).with_extension(ext),
        _ => std::path::PathBuf::from(format!("out.{ext}")),
    }
}

fn write_bytes(
    bytes: &[u8],
    format: OutputFormat,
    input: Option<&str>,
    out: Option<&str>,
) -> Result<(), CliError> {
    if !format.is_raster() {
        let text = String::from_utf8_lossy(bytes);
        return write_text(&text, out);
    }
    let out = out.map(str::to_string).unwrap_or_else(|| {
        default_raster_out_path(input, format.extension())
            .to_string_lossy()
            .to_string()
    });
    if out == "-" {
        std::io::stdout().lock().write_all(bytes)?;
    } else {
        std::fs::write(&out, bytes)?;
        tracing::info!(path = %out, bytes = bytes.len(), "wrote output");
    }
    Ok(())
}

/// A scene file is either `{ "elements": [...], "appState": {...}, "files": {...} }` or a bare
/// element array.
fn scene_payload(text: &str) -> Result<Map<String, Value>, CliError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        Value::Array(elements) => {
            let mut map = Map::new();
            map.insert("elements".to_string(), Value::Array(elements));
            Ok(map)
        }
        _ => Err(CliError::Input(
            "scene input must be a JSON object or an element array".to_string(),
        )),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

enum Endpoint {
    Scene,
    Diagram,
}

/// PNG output goes through the render service with the same JSON payload an HTTP client sends.
fn render_with_service(
    service: &RenderService,
    endpoint: Endpoint,
    payload: Map<String, Value>,
) -> Result<Vec<u8>, CliError> {
    let body = serde_json::to_vec(&Value::Object(payload))?;
    let response = runtime()?.block_on(async {
        match endpoint {
            Endpoint::Scene => service.render_scene(&body).await,
            Endpoint::Diagram => service.render_diagram(&body).await,
        }
    });
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(CliError::Service {
            status: response.status,
            message: response.error_message().unwrap_or_default(),
        })
    }
}

fn rasterize(
    scene: RenderScene,
    format: OutputFormat,
    config: &ServiceConfig,
) -> Result<Vec<u8>, CliError> {
    let scene = match format {
        OutputFormat::Jpeg => scene.with_mime_type(MIME_JPEG),
        OutputFormat::Svg => scene.with_mime_type(MIME_SVG),
        _ => scene,
    };
    let fonts =
        FontBackend::new(config.fonts()).map_err(|e| CliError::Raster(e, Diagnostics::new()))?;
    let rasterizer = ResvgRasterizer::new(fonts);
    let mut diagnostics = Diagnostics::new();
    rasterizer
        .rasterize(&scene, &mut diagnostics)
        .map_err(|e| CliError::Raster(e, diagnostics))
}

fn render_scene_payload(
    payload: Map<String, Value>,
    format: OutputFormat,
    config: ServiceConfig,
) -> Result<Vec<u8>, CliError> {
    if format == OutputFormat::Png {
        let service = RenderService::scene_only(config)?;
        return render_with_service(&service, Endpoint::Scene, payload);
    }
    let request = SceneRequest::from_object(payload)?;
    let scene = ScenePipeline::new()?.elements_to_scene(
        request.elements,
        request.files,
        &request.params,
    );
    rasterize(scene, format, &config)
}

fn run(args: Args) -> Result<(), CliError> {
    let Some(command) = args.command else {
        return Err(CliError::Usage(usage()));
    };
    let text = read_input(args.input.as_deref())?;
    let config = ServiceConfig::from_env();

    match command {
        Command::Labels => {
            let labels = scrawl_core::extract_class_labels(&text);
            write_json(&labels, args.pretty, args.out.as_deref())
        }
        Command::Render => {
            let format = args.format.unwrap_or(OutputFormat::Png);
            let mut payload = scene_payload(&text)?;
            payload.extend(args.output.clone());
            let bytes = render_scene_payload(payload, format, config)?;
            write_bytes(&bytes, format, args.input.as_deref(), args.out.as_deref())
        }
        Command::Dsl => {
            let format = args.format.unwrap_or(OutputFormat::Json);
            let document = DslDocument::from_value(serde_json::from_str(&text)?)?;
            let elements = document.compile()?;
            if format == OutputFormat::Json {
                return write_json(&elements, args.pretty, args.out.as_deref());
            }
            let mut payload = Map::new();
            payload.insert("elements".to_string(), serde_json::to_value(&elements)?);
            payload.extend(args.output.clone());
            let bytes = render_scene_payload(payload, format, config)?;
            write_bytes(&bytes, format, args.input.as_deref(), args.out.as_deref())
        }
        Command::Mermaid => {
            let format = args.format.unwrap_or(OutputFormat::Png);
            let layout_path = args.layout.as_deref().ok_or(CliError::Usage(usage()))?;
            let layout = PrecomputedLayout::from_json_str(&std::fs::read_to_string(layout_path)?)?;

            let mut payload = Map::new();
            payload.insert("mermaid".to_string(), Value::String(text));
            if let Some(raw) = args.config.as_deref() {
                payload.insert("config".to_string(), serde_json::from_str(raw)?);
            }
            payload.extend(args.output.clone());

            if format == OutputFormat::Png && !args.emit_scene {
                let service = RenderService::new(config, Arc::new(layout))?;
                let bytes = render_with_service(&service, Endpoint::Diagram, payload)?;
                return write_bytes(&bytes, format, args.input.as_deref(), args.out.as_deref());
            }

            let request = scrawl::service::DiagramRequest::from_object(payload)?;
            let scene = ScenePipeline::new()?.diagram_to_scene(
                &layout,
                &request.mermaid,
                request.config.as_ref(),
                &request.params,
            )?;
            if args.emit_scene {
                return write_json(&scene.to_export_value()?, args.pretty, args.out.as_deref());
            }
            let bytes = rasterize(scene, format, &config)?;
            write_bytes(&bytes, format, args.input.as_deref(), args.out.as_deref())
        }
    }
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

use indexmap::IndexMap;
use serde::Deserialize;

fn default_grid() -> Option<f64> {
    Some(10.0)
}

/// Root of a scene DSL document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DslDocument {
    /// `null` disables snapping; missing means 10.
    #[serde(default = "default_grid")]
    pub grid: Option<f64>,
    #[serde(default)]
    pub styles: IndexMap<String, StyleOverrides>,
    #[serde(default)]
    pub fit_text: bool,
    pub elements: Vec<DslElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StyleOverrides {
    pub stroke_color: Option<String>,
    pub background_color: Option<String>,
    pub fill_style: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<String>,
    pub roughness: Option<f64>,
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Common {
    pub id: Option<String>,
    /// Name of a preset in [`DslDocument::styles`].
    pub style: Option<String>,
    pub style_overrides: Option<StyleOverrides>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DslElement {
    Box(ShapeSpec),
    Ellipse(ShapeSpec),
    Diamond(ShapeSpec),
    Text(TextSpec),
    Arrow(ArrowSpec),
}

impl DslElement {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Box(_) => "box",
            Self::Ellipse(_) => "ellipse",
            Self::Diamond(_) => "diamond",
            Self::Text(_) => "text",
            Self::Arrow(_) => "arrow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapeSpec {
    #[serde(flatten)]
    pub common: Common,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

fn default_font_size() -> f64 {
    20.0
}
fn default_font_family() -> u32 {
    1
}
fn default_line_height() -> f64 {
    1.25
}
fn default_padding() -> f64 {
    6.0
}
fn default_text_align() -> String {
    "center".to_string()
}
fn default_vertical_align() -> String {
    "middle".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpec {
    #[serde(flatten)]
    pub common: Common,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub text: String,
    pub w: Option<f64>,
    pub h: Option<f64>,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: u32,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default = "default_text_align")]
    pub text_align: String,
    #[serde(default = "default_vertical_align")]
    pub vertical_align: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
    #[default]
    Center,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrowSpec {
    #[serde(flatten)]
    pub common: Common,
    pub from: Endpoint,
    pub to: Endpoint,
}

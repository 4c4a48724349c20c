//! Element interchange model.
//!
//! Elements serialize with the camelCase keys of the whiteboard interchange schema. The common
//! attributes live on [`Element`]; kind-specific attributes live on [`ElementKind`]. Keys this
//! model does not know about are kept in [`Element::extra`] and re-emitted unchanged.
//!
//! Deserialization is lenient: missing or `null` attributes take the schema defaults.

use crate::estimate::Primitive;
use crate::geom::{finite_or_zero, point};
use crate::text::{DEFAULT_LINE_HEIGHT, DeterministicTextMeasurer};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use serde_json::{Map, Value};

pub const DEFAULT_STROKE_COLOR: &str = "#1e1e1e";
pub const TRANSPARENT: &str = "transparent";
/// Font size the interchange schema assumes for text without an explicit size.
pub const DEFAULT_TEXT_FONT_SIZE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roundness {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Roundness {
    pub const LEGACY: u8 = 1;
    pub const PROPORTIONAL_RADIUS: u8 = 2;
    pub const ADAPTIVE_RADIUS: u8 = 3;

    pub fn proportional() -> Self {
        Self {
            kind: Self::PROPORTIONAL_RADIUS,
            value: None,
        }
    }

    pub fn adaptive() -> Self {
        Self {
            kind: Self::ADAPTIVE_RADIUS,
            value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundElementKind {
    Text,
    Arrow,
}

/// Reference from an element to something visually attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BoundElementKind,
}

/// Label metadata a layout step attaches to a shape before it is materialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InlineLabel {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextData {
    pub text: String,
    pub font_size: f64,
    pub font_family: u32,
    pub text_align: String,
    pub vertical_align: String,
    pub baseline: f64,
    pub container_id: Option<String>,
    pub original_text: String,
    pub line_height: f64,
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: DEFAULT_TEXT_FONT_SIZE,
            font_family: 1,
            text_align: "left".to_string(),
            vertical_align: "top".to_string(),
            baseline: 0.0,
            container_id: None,
            original_text: String::new(),
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }
}

impl TextData {
    const KEYS: &'static [&'static str] = &[
        "text",
        "fontSize",
        "fontFamily",
        "textAlign",
        "verticalAlign",
        "baseline",
        "containerId",
        "originalText",
        "lineHeight",
    ];

    pub fn lines(&self) -> Vec<&str> {
        DeterministicTextMeasurer::text_lines(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBinding {
    pub element_id: Option<String>,
    #[serde(default)]
    pub focus: f64,
    #[serde(default)]
    pub gap: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinearData {
    pub points: Vec<[f64; 2]>,
    pub last_committed_point: Option<[f64; 2]>,
    pub start_binding: Option<PointBinding>,
    pub end_binding: Option<PointBinding>,
    pub start_arrowhead: Option<String>,
    pub end_arrowhead: Option<String>,
}

impl LinearData {
    const KEYS: &'static [&'static str] = &[
        "points",
        "lastCommittedPoint",
        "startBinding",
        "endBinding",
        "startArrowhead",
        "endArrowhead",
    ];

    pub fn arrow(points: Vec<[f64; 2]>) -> Self {
        Self {
            points,
            end_arrowhead: Some("arrow".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FreedrawData {
    pub points: Vec<[f64; 2]>,
    pub pressures: Vec<f64>,
    pub simulate_pressure: bool,
    pub last_committed_point: Option<[f64; 2]>,
}

impl FreedrawData {
    const KEYS: &'static [&'static str] = &[
        "points",
        "pressures",
        "simulatePressure",
        "lastCommittedPoint",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageData {
    pub file_id: Option<String>,
    pub status: String,
    pub scale: [f64; 2],
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            file_id: None,
            status: "pending".to_string(),
            scale: [1.0, 1.0],
        }
    }
}

impl ImageData {
    const KEYS: &'static [&'static str] = &["fileId", "status", "scale"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameData {
    pub name: Option<String>,
}

impl FrameData {
    const KEYS: &'static [&'static str] = &["name"];
}

/// Kind tag plus the attributes only that kind carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ElementKind {
    #[default]
    Rectangle,
    Diamond,
    Ellipse,
    Line(LinearData),
    Arrow(LinearData),
    Freedraw(FreedrawData),
    Text(TextData),
    Image(ImageData),
    Frame(FrameData),
    MagicFrame(FrameData),
    Embeddable,
    Iframe,
    /// Unrecognized `type`; carried through so callers can decide what to do with it.
    Other(String),
}

impl ElementKind {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Diamond => "diamond",
            Self::Ellipse => "ellipse",
            Self::Line(_) => "line",
            Self::Arrow(_) => "arrow",
            Self::Freedraw(_) => "freedraw",
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Frame(_) => "frame",
            Self::MagicFrame(_) => "magicframe",
            Self::Embeddable => "embeddable",
            Self::Iframe => "iframe",
            Self::Other(name) => name,
        }
    }

    fn keys_for(type_name: &str) -> &'static [&'static str] {
        match type_name {
            "line" | "arrow" => LinearData::KEYS,
            "freedraw" => FreedrawData::KEYS,
            "text" => TextData::KEYS,
            "image" => ImageData::KEYS,
            "frame" | "magicframe" => FrameData::KEYS,
            _ => &[],
        }
    }

    fn from_parts(type_name: &str, data: Map<String, Value>) -> serde_json::Result<Self> {
        let data = Value::Object(data);
        Ok(match type_name {
            "rectangle" => Self::Rectangle,
            "diamond" => Self::Diamond,
            "ellipse" => Self::Ellipse,
            "line" => Self::Line(serde_json::from_value(data)?),
            "arrow" => Self::Arrow(serde_json::from_value(data)?),
            "freedraw" => Self::Freedraw(serde_json::from_value(data)?),
            "text" => {
                let mut text: TextData = serde_json::from_value(data)?;
                if text.original_text.is_empty() {
                    text.original_text = text.text.clone();
                }
                Self::Text(text)
            }
            "image" => Self::Image(serde_json::from_value(data)?),
            "frame" => Self::Frame(serde_json::from_value(data)?),
            "magicframe" => Self::MagicFrame(serde_json::from_value(data)?),
            "embeddable" => Self::Embeddable,
            "iframe" => Self::Iframe,
            other => Self::Other(other.to_string()),
        })
    }

    fn data_value(&self) -> serde_json::Result<Option<Value>> {
        Ok(Some(match self {
            Self::Line(d) | Self::Arrow(d) => serde_json::to_value(d)?,
            Self::Freedraw(d) => serde_json::to_value(d)?,
            Self::Text(d) => serde_json::to_value(d)?,
            Self::Image(d) => serde_json::to_value(d)?,
            Self::Frame(d) | Self::MagicFrame(d) => serde_json::to_value(d)?,
            _ => return Ok(None),
        }))
    }
}

/// One positioned item of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", default, rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation around the element's center, in radians.
    pub angle: f64,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: String,
    pub stroke_width: f64,
    pub stroke_style: String,
    pub roughness: f64,
    /// 0..=100
    pub opacity: f64,
    pub group_ids: Vec<String>,
    pub frame_id: Option<String>,
    pub roundness: Option<Roundness>,
    pub seed: i64,
    pub version: i64,
    pub version_nonce: i64,
    pub is_deleted: bool,
    pub bound_elements: Option<Vec<BoundElement>>,
    pub updated: i64,
    pub link: Option<String>,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<InlineLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
    #[serde(skip)]
    pub kind: ElementKind,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl Default for Element {
    fn default() -> Self {
        Self::new(ElementKind::Rectangle)
    }
}

const COMMON_KEYS: &[&str] = &[
    "id",
    "x",
    "y",
    "width",
    "height",
    "angle",
    "strokeColor",
    "backgroundColor",
    "fillStyle",
    "strokeWidth",
    "strokeStyle",
    "roughness",
    "opacity",
    "groupIds",
    "frameId",
    "roundness",
    "seed",
    "version",
    "versionNonce",
    "isDeleted",
    "boundElements",
    "updated",
    "link",
    "locked",
    "label",
    "metadata",
];

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: String::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            angle: 0.0,
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            background_color: TRANSPARENT.to_string(),
            fill_style: "solid".to_string(),
            stroke_width: 2.0,
            stroke_style: "solid".to_string(),
            roughness: 1.0,
            opacity: 100.0,
            group_ids: Vec::new(),
            frame_id: None,
            roundness: None,
            seed: 0,
            version: 1,
            version_nonce: 0,
            is_deleted: false,
            bound_elements: None,
            updated: 0,
            link: None,
            locked: false,
            label: None,
            metadata: None,
            kind,
            extra: Map::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn container_id(&self) -> Option<&str> {
        self.text_data()?.container_id.as_deref()
    }

    pub fn class_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.class_id.as_deref()
    }

    pub fn bound_element_ids(&self) -> impl Iterator<Item = &str> {
        self.bound_elements
            .iter()
            .flatten()
            .map(|bound| bound.id.as_str())
    }

    pub fn push_bound_element(&mut self, id: impl Into<String>, kind: BoundElementKind) {
        self.bound_elements
            .get_or_insert_with(Vec::new)
            .push(BoundElement {
                id: id.into(),
                kind,
            });
    }

    /// Geometry descriptor of this element in scene coordinates (rotation is ignored).
    pub fn primitive(&self) -> Primitive {
        let (x, y) = (finite_or_zero(self.x), finite_or_zero(self.y));
        match &self.kind {
            ElementKind::Rectangle
            | ElementKind::Diamond
            | ElementKind::Frame(_)
            | ElementKind::MagicFrame(_)
            | ElementKind::Embeddable
            | ElementKind::Iframe => Primitive::Rect {
                x,
                y,
                width: self.width,
                height: self.height,
            },
            ElementKind::Image(_) => Primitive::Image {
                x,
                y,
                width: self.width,
                height: self.height,
            },
            ElementKind::Ellipse => Primitive::Ellipse {
                cx: x + self.width / 2.0,
                cy: y + self.height / 2.0,
                rx: self.width / 2.0,
                ry: self.height / 2.0,
            },
            ElementKind::Line(LinearData { points, .. })
            | ElementKind::Arrow(LinearData { points, .. })
            | ElementKind::Freedraw(FreedrawData { points, .. }) => {
                let mut absolute: Vec<_> = points
                    .iter()
                    .map(|[px, py]| point(x + finite_or_zero(*px), y + finite_or_zero(*py)))
                    .collect();
                if absolute.is_empty() {
                    absolute.push(point(x, y));
                }
                Primitive::Polyline { points: absolute }
            }
            ElementKind::Text(_) if self.width > 0.0 || self.height > 0.0 => Primitive::Rect {
                x,
                y,
                width: self.width,
                height: self.height,
            },
            ElementKind::Text(text) => {
                // Unsized text: `y` is the top edge, the estimator wants the baseline anchor.
                let height = text.lines().len() as f64 * text.font_size * text.line_height;
                Primitive::Text {
                    x,
                    y: y + finite_or_zero(height),
                    content: text.text.clone(),
                    font_size: text.font_size,
                    line_height: Some(text.line_height),
                }
            }
            ElementKind::Other(kind) => Primitive::Unknown { kind: kind.clone() },
        }
    }

    fn to_map(&self) -> serde_json::Result<Map<String, Value>> {
        let Value::Object(common) = Element::serialize(self, serde_json::value::Serializer)? else {
            return Err(ser::Error::custom("element did not serialize to an object"));
        };

        let mut out = Map::new();
        out.insert("id".to_string(), Value::String(self.id.clone()));
        out.insert(
            "type".to_string(),
            Value::String(self.kind.type_name().to_string()),
        );
        out.extend(common.into_iter().filter(|(key, _)| key != "id"));
        if let Some(Value::Object(data)) = self.kind.data_value()? {
            out.extend(data);
        }
        for (key, value) in &self.extra {
            if !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        Ok(out)
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_map()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let type_name = match map.get("type") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "element `type` must be a string, got {other}"
                )));
            }
            None => return Err(de::Error::missing_field("type")),
        };

        let kind_keys = ElementKind::keys_for(&type_name);
        let mut common = Map::new();
        let mut data = Map::new();
        let mut extra = Map::new();
        for (key, value) in map {
            if key == "type" {
                continue;
            }
            // `null` means "use the default" for every known attribute.
            if kind_keys.contains(&key.as_str()) {
                if !value.is_null() {
                    data.insert(key, value);
                }
            } else if COMMON_KEYS.contains(&key.as_str()) {
                if !value.is_null() {
                    common.insert(key, value);
                }
            } else {
                extra.insert(key, value);
            }
        }

        let mut element =
            Element::deserialize(Value::Object(common)).map_err(de::Error::custom)?;
        element.kind = ElementKind::from_parts(&type_name, data).map_err(de::Error::custom)?;
        element.extra = extra;
        Ok(element)
    }
}

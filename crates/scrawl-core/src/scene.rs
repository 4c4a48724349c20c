//! Scene assembly: final element order plus the rasterizer invocation descriptor.

use crate::element::Element;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_SVG: &str = "image/svg+xml";

/// Caller-supplied output parameters. Values are assumed to be validated already.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputParams {
    pub export_scale: Option<f64>,
    pub export_padding: Option<f64>,
    pub max_size: Option<f64>,
    /// In `(0, 1]`.
    pub quality: Option<f64>,
    pub background_color: Option<String>,
    pub dark_mode: Option<bool>,
    /// Raw `appState` overrides; applied after the defaults derived from the fields above.
    pub app_state: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub view_background_color: String,
    pub export_with_dark_mode: bool,
    #[serde(default = "default_true")]
    pub export_background: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view_background_color: DEFAULT_BACKGROUND.to_string(),
            export_with_dark_mode: false,
            export_background: true,
            extra: Map::new(),
        }
    }
}

impl AppState {
    pub fn from_params(params: &OutputParams) -> Self {
        let mut state = Self {
            view_background_color: params
                .background_color
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
            export_with_dark_mode: params.dark_mode.unwrap_or(false),
            ..Default::default()
        };
        if let Some(overrides) = &params.app_state {
            state.apply_overrides(overrides);
        }
        state
    }

    /// Shallow merge: known keys with the right type replace fields, everything else lands in
    /// `extra`.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) {
        for (key, value) in overrides {
            match (key.as_str(), value) {
                ("viewBackgroundColor", Value::String(color)) => {
                    self.view_background_color = color.clone();
                }
                ("exportWithDarkMode", Value::Bool(dark)) => self.export_with_dark_mode = *dark,
                ("exportBackground", Value::Bool(bg)) => self.export_background = *bg,
                ("viewBackgroundColor" | "exportWithDarkMode" | "exportBackground", other) => {
                    tracing::warn!(
                        key = %key,
                        value = %other,
                        "ignoring mistyped appState override"
                    );
                }
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// Output dimension function `(w, h) -> (w * scale, h * scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScale {
    pub scale: f64,
}

impl DimensionScale {
    pub fn apply(&self, width: f64, height: f64) -> Dimensions {
        Dimensions {
            width: width * self.scale,
            height: height * self.scale,
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width_or_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<DimensionScale>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            mime_type: MIME_PNG.to_string(),
            max_width_or_height: None,
            quality: None,
            export_padding: None,
            dimensions: None,
        }
    }
}

/// A finished scene, ready for the rasterizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScene {
    pub elements: Vec<Element>,
    pub app_state: AppState,
    pub files: Map<String, Value>,
    pub export: ExportOptions,
}

impl RenderScene {
    pub fn with_files(mut self, files: Map<String, Value>) -> Self {
        self.files = files;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.export.mime_type = mime_type.into();
        self
    }

    /// Flat export descriptor, the shape an export call consumes.
    pub fn to_export_value(&self) -> serde_json::Result<Value> {
        let mut out = Map::new();
        out.insert(
            "elements".to_string(),
            serde_json::to_value(&self.elements)?,
        );
        out.insert("appState".to_string(), serde_json::to_value(&self.app_state)?);
        out.insert("files".to_string(), Value::Object(self.files.clone()));
        out.insert("mimeType".to_string(), json!(self.export.mime_type));
        if let Some(max) = self.export.max_width_or_height {
            out.insert("maxWidthOrHeight".to_string(), json!(max));
        }
        if let Some(quality) = self.export.quality {
            out.insert("quality".to_string(), json!(quality));
        }
        if let Some(dims) = self.export.dimensions {
            out.insert("exportScale".to_string(), json!(dims.scale));
        }
        if let Some(padding) = self.export.export_padding {
            out.insert("exportPadding".to_string(), json!(padding));
        }
        Ok(Value::Object(out))
    }

    /// Violations of the id/container invariants, as human-readable messages.
    pub fn link_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let by_id: FxHashMap<&str, &Element> =
            self.elements.iter().map(|el| (el.id.as_str(), el)).collect();

        for el in &self.elements {
            if !seen.insert(el.id.as_str()) {
                issues.push(format!("duplicate element id `{}`", el.id));
            }
            let Some(container_id) = el.container_id() else {
                continue;
            };
            if !seen.contains(container_id) {
                issues.push(format!(
                    "text `{}` appears before its container `{container_id}`",
                    el.id
                ));
            }
            let bound = by_id
                .get(container_id)
                .is_some_and(|c| c.bound_element_ids().any(|id| id == el.id));
            if !bound {
                issues.push(format!(
                    "container `{container_id}` does not list text `{}`",
                    el.id
                ));
            }
        }
        issues
    }
}

/// Pairs the ordered elements with appearance defaults and caller overrides.
pub fn assemble_scene(elements: Vec<Element>, params: &OutputParams) -> RenderScene {
    let scene = RenderScene {
        elements,
        app_state: AppState::from_params(params),
        files: Map::new(),
        export: ExportOptions {
            mime_type: MIME_PNG.to_string(),
            max_width_or_height: params.max_size,
            quality: params.quality,
            export_padding: params.export_padding,
            dimensions: params.export_scale.map(|scale| DimensionScale { scale }),
        },
    };

    for issue in scene.link_issues() {
        tracing::warn!("{issue}");
    }
    tracing::debug!(
        elements = scene.elements.len(),
        background = %scene.app_state.view_background_color,
        dark = scene.app_state.export_with_dark_mode,
        "assembled scene"
    );
    scene
}

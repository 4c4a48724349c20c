//! Payload validation for the two request shapes.
//!
//! Every check runs before any pipeline work, in a fixed order, so a payload with several
//! problems always reports the same one.

use scrawl_core::{Element, OutputParams};
use serde_json::{Map, Value};

/// A malformed, missing or out-of-range request field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

type Result<T> = std::result::Result<T, ValidationError>;

/// Direct-scene render request.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRequest {
    pub elements: Vec<Element>,
    pub files: Map<String, Value>,
    pub params: OutputParams,
}

impl SceneRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Self::from_object(parse_object(body)?)
    }

    pub fn from_object(body: Map<String, Value>) -> Result<Self> {
        let raw_elements = match body.get("elements") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => {
                return Err(ValidationError::new(
                    "Payload must include a non-empty elements array",
                ));
            }
        };
        let mut params = output_params(&body)?;
        params.app_state = optional_object(&body, "appState")?;
        let files = optional_object(&body, "files")?.unwrap_or_default();

        let elements = raw_elements
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                serde_json::from_value::<Element>(raw.clone()).map_err(|err| {
                    ValidationError::new(format!("Invalid element at index {index}: {err}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            elements,
            files,
            params,
        })
    }
}

/// Diagram-text render request.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramRequest {
    pub mermaid: String,
    pub config: Option<Value>,
    pub params: OutputParams,
}

impl DiagramRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Self::from_object(parse_object(body)?)
    }

    pub fn from_object(body: Map<String, Value>) -> Result<Self> {
        let Some(Value::String(mermaid)) = body.get("mermaid") else {
            return Err(ValidationError::new("Payload must include a mermaid string"));
        };
        let params = output_params(&body)?;
        let config = optional_object(&body, "config")?.map(Value::Object);
        Ok(Self {
            mermaid: mermaid.clone(),
            config,
            params,
        })
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError::new("Invalid JSON body")),
    }
}

/// Absent and `null` fields are treated the same.
fn field<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| !v.is_null())
}

fn number(
    body: &Map<String, Value>,
    key: &str,
    valid: impl Fn(f64) -> bool,
    requirement: &str,
) -> Result<Option<f64>> {
    match field(body, key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|v| valid(*v))
            .map(Some)
            .ok_or_else(|| ValidationError::new(format!("{key} must be {requirement}"))),
    }
}

fn optional_object(body: &Map<String, Value>, key: &str) -> Result<Option<Map<String, Value>>> {
    match field(body, key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(ValidationError::new(format!("{key} must be an object"))),
    }
}

fn output_params(body: &Map<String, Value>) -> Result<OutputParams> {
    let export_scale = number(body, "exportScale", |v| v > 0.0, "a positive number")?;
    let export_padding = number(body, "exportPadding", |v| v >= 0.0, "a non-negative number")?;
    let max_size = number(body, "maxSize", |v| v > 0.0, "a positive number")?;
    let quality = number(
        body,
        "quality",
        |v| v > 0.0 && v <= 1.0,
        "a number in (0, 1]",
    )?;
    let background_color = match field(body, "backgroundColor") {
        None => None,
        Some(Value::String(color)) => Some(color.clone()),
        Some(_) => return Err(ValidationError::new("backgroundColor must be a string")),
    };
    let dark_mode = match field(body, "darkMode") {
        None => None,
        Some(Value::Bool(dark)) => Some(*dark),
        Some(_) => return Err(ValidationError::new("darkMode must be a boolean")),
    };
    Ok(OutputParams {
        export_scale,
        export_padding,
        max_size,
        quality,
        background_color,
        dark_mode,
        app_state: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scene(value: Value) -> Result<SceneRequest> {
        SceneRequest::from_slice(value.to_string().as_bytes())
    }

    fn err(result: Result<impl std::fmt::Debug>) -> String {
        result.unwrap_err().message().to_string()
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert_eq!(err(SceneRequest::from_slice(b"{nope")), "Invalid JSON body");
        assert_eq!(err(SceneRequest::from_slice(b"[1, 2]")), "Invalid JSON body");
        assert_eq!(err(DiagramRequest::from_slice(b"")), "Invalid JSON body");
    }

    #[test]
    fn elements_must_be_a_non_empty_array() {
        for body in [json!({}), json!({ "elements": [] }), json!({ "elements": {} })] {
            assert_eq!(
                err(scene(body)),
                "Payload must include a non-empty elements array"
            );
        }
    }

    #[test]
    fn numeric_ranges_are_enforced_in_order() {
        let el = json!([{ "id": "a", "type": "rectangle" }]);
        assert_eq!(
            err(scene(json!({ "elements": el, "exportScale": 0, "quality": 2 }))),
            "exportScale must be a positive number"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "exportPadding": -1 }))),
            "exportPadding must be a non-negative number"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "maxSize": "big" }))),
            "maxSize must be a positive number"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "quality": 0 }))),
            "quality must be a number in (0, 1]"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "backgroundColor": 1 }))),
            "backgroundColor must be a string"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "darkMode": "yes" }))),
            "darkMode must be a boolean"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "appState": [] }))),
            "appState must be an object"
        );
        assert_eq!(
            err(scene(json!({ "elements": el, "files": "x" }))),
            "files must be an object"
        );
    }

    #[test]
    fn bad_elements_name_their_index() {
        let message = err(scene(json!({
            "elements": [{ "id": "a", "type": "rectangle" }, { "id": "b" }]
        })));
        assert!(message.starts_with("Invalid element at index 1"), "{message}");
    }

    #[test]
    fn valid_scene_payload_is_decoded() {
        let request = scene(json!({
            "elements": [{ "id": "a", "type": "rectangle", "width": 10, "height": 10 }],
            "appState": { "viewBackgroundColor": "#000" },
            "files": { "f": { "dataURL": "data:," } },
            "exportScale": 2,
            "exportPadding": 0,
            "quality": 1,
            "backgroundColor": "#fff",
            "darkMode": null
        }))
        .unwrap();
        assert_eq!(request.elements.len(), 1);
        assert_eq!(request.params.export_scale, Some(2.0));
        assert_eq!(request.params.export_padding, Some(0.0));
        assert_eq!(request.params.quality, Some(1.0));
        assert_eq!(request.params.dark_mode, None);
        assert_eq!(request.params.background_color.as_deref(), Some("#fff"));
        assert!(request.params.app_state.is_some());
        assert!(request.files.contains_key("f"));
    }

    #[test]
    fn diagram_payload_requires_mermaid_text() {
        assert_eq!(
            err(DiagramRequest::from_slice(br#"{"mermaid": 3}"#)),
            "Payload must include a mermaid string"
        );
        assert_eq!(
            err(DiagramRequest::from_slice(
                br#"{"mermaid": "graph TD", "config": "dark"}"#
            )),
            "config must be an object"
        );
        let request = DiagramRequest::from_slice(
            br#"{"mermaid": "graph TD\nA-->B", "config": {"theme": "dark"}, "maxSize": 640}"#,
        )
        .unwrap();
        assert_eq!(request.mermaid, "graph TD\nA-->B");
        assert_eq!(request.config, Some(json!({ "theme": "dark" })));
        assert_eq!(request.params.max_size, Some(640.0));
    }
}

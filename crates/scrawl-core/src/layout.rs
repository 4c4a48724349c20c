//! Seam to the third-party layout step (diagram text to positioned elements).

use crate::config::DiagramConfig;
use crate::element::Element;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, thiserror::Error)]
pub enum LayoutError {
    /// The diagram text is not valid input for the layout step.
    #[error("Diagram parse error: {message}")]
    Parse { message: String },

    #[error("Layout failed: {message}")]
    Failed { message: String },
}

impl LayoutError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Positioned elements produced by a layout step, labels still inline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayoutOutput {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub files: Map<String, Value>,
}

impl LayoutOutput {
    /// Accepts `{ "elements": [...], "files": {...} }` or a bare element array.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        match value {
            Value::Array(_) => Ok(Self {
                elements: serde_json::from_value(value)?,
                files: Map::new(),
            }),
            other => serde_json::from_value(other),
        }
    }
}

pub trait DiagramLayout {
    fn layout(&self, text: &str, config: &DiagramConfig) -> Result<LayoutOutput, LayoutError>;
}

impl<F> DiagramLayout for F
where
    F: Fn(&str, &DiagramConfig) -> Result<LayoutOutput, LayoutError>,
{
    fn layout(&self, text: &str, config: &DiagramConfig) -> Result<LayoutOutput, LayoutError> {
        self(text, config)
    }
}

/// Replays layout output recorded ahead of time, ignoring the diagram text.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedLayout {
    output: LayoutOutput,
}

impl PrecomputedLayout {
    pub fn new(output: LayoutOutput) -> Self {
        Self { output }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|err| LayoutError::failed(format!("invalid layout JSON: {err}")))?;
        let output = LayoutOutput::from_value(value)
            .map_err(|err| LayoutError::failed(format!("invalid layout elements: {err}")))?;
        Ok(Self { output })
    }
}

impl DiagramLayout for PrecomputedLayout {
    fn layout(&self, _text: &str, _config: &DiagramConfig) -> Result<LayoutOutput, LayoutError> {
        Ok(self.output.clone())
    }
}

//! A small JSON scene DSL that compiles to positioned elements without a layout engine.
//!
//! ```json
//! {
//!   "grid": 10,
//!   "styles": { "primary": { "strokeColor": "#111" } },
//!   "elements": [
//!     { "id": "a", "type": "box", "x": 0, "y": 0, "w": 120, "h": 80 },
//!     { "id": "b", "type": "ellipse", "x": 200, "y": 0, "w": 120, "h": 80 },
//!     { "type": "text", "x": 10, "y": 10, "text": "Hello" },
//!     { "type": "arrow", "from": { "ref": "a", "side": "right" }, "to": { "ref": "b", "side": "left" } }
//!   ]
//! }
//! ```

mod compile;
pub mod model;

use crate::element::Element;
pub use compile::estimate_text_size;
pub use model::DslDocument;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum DslError {
    #[error("invalid DSL document: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("grid must be a non-negative number")]
    InvalidGrid,

    #[error("Unknown style preset '{0}'")]
    UnknownStyle(String),

    #[error("Text elements require a non-empty 'text'")]
    EmptyText,

    #[error("Arrow refs must point to existing elements (missing '{0}')")]
    UnknownRef(String),
}

impl DslDocument {
    pub fn from_value(value: Value) -> Result<Self, DslError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Compiles with `start_ms` as the base of the `updated` timestamps.
    pub fn compile_at(&self, start_ms: i64) -> Result<Vec<Element>, DslError> {
        let elements = compile::Compiler::new(self, start_ms)?.compile(&self.elements)?;
        tracing::debug!(elements = elements.len(), "compiled scene DSL");
        Ok(elements)
    }

    pub fn compile(&self) -> Result<Vec<Element>, DslError> {
        self.compile_at(chrono::Utc::now().timestamp_millis())
    }
}

/// Parses and compiles a DSL document in one step.
pub fn compile_dsl(value: Value) -> Result<Vec<Element>, DslError> {
    DslDocument::from_value(value)?.compile()
}

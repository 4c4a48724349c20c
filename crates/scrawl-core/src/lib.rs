#![forbid(unsafe_code)]

//! Diagram-to-scene conversion (headless).
//!
//! Takes the output of a diagram layout step (positioned shapes with inline label metadata) plus
//! the raw diagram text, and produces a complete, self-consistent element scene ready for
//! rasterization.
//!
//! Design goals:
//! - total, deterministic geometry: malformed input degrades to zero boxes, never errors
//! - scene invariants hold after every stage (unique ids, labels right after their owners)
//! - no browser or layout engine required; text metrics are a documented approximation

pub mod class_labels;
pub mod config;
pub mod detect;
pub mod dsl;
pub mod element;
pub mod error;
pub mod estimate;
pub mod geom;
pub mod ids;
pub mod layout;
pub mod materialize;
pub mod pipeline;
pub mod scene;
pub mod text;

pub use class_labels::{ClassLabelMap, extract_class_labels};
pub use config::DiagramConfig;
pub use detect::{DetectTypeError, Detector, DetectorRegistry};
pub use element::{BoundElement, BoundElementKind, Element, ElementKind, InlineLabel};
pub use error::{Error, Result};
pub use estimate::{GeometryEstimator, Primitive, estimate_bbox};
pub use geom::BBox;
pub use layout::{DiagramLayout, LayoutError, LayoutOutput, PrecomputedLayout};
pub use materialize::{LabelMaterializer, materialize_labels};
pub use pipeline::{ScenePipeline, diagram_to_scene};
pub use scene::{AppState, ExportOptions, OutputParams, RenderScene, assemble_scene};
pub use text::{DeterministicTextMeasurer, TextMeasurer, TextMetrics, TextStyle};

#[cfg(test)]
mod tests;

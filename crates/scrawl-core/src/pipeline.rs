use crate::Result;
use crate::class_labels::{ClassLabelMap, extract_class_labels};
use crate::config::DiagramConfig;
use crate::detect::DetectorRegistry;
use crate::element::Element;
use crate::estimate::GeometryEstimator;
use crate::ids::IdGenerator;
use crate::layout::DiagramLayout;
use crate::materialize::LabelMaterializer;
use crate::scene::{OutputParams, RenderScene, assemble_scene};
use serde_json::{Map, Value};

/// Diagram text or element list to [`RenderScene`].
#[derive(Debug, Clone)]
pub struct ScenePipeline {
    registry: DetectorRegistry,
    estimator: GeometryEstimator,
}

impl ScenePipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: DetectorRegistry::builtin()?,
            estimator: GeometryEstimator::default(),
        })
    }

    pub fn with_estimator(mut self, estimator: GeometryEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// detect, layout, class-body extraction, label materialization, assembly.
    ///
    /// Detection and parse failures are client errors; no partial scene is produced.
    pub fn diagram_to_scene(
        &self,
        layout: &dyn DiagramLayout,
        text: &str,
        config: Option<&Value>,
        params: &OutputParams,
    ) -> Result<RenderScene> {
        let diagram_type = self.registry.detect_type(text)?;
        let config = DiagramConfig::for_layout(config);
        tracing::debug!(diagram_type, config = %config.as_value(), "running layout step");

        let output = layout.layout(text, &config)?;
        tracing::debug!(elements = output.elements.len(), "layout step finished");

        let class_labels = extract_class_labels(text);
        Ok(self
            .elements_to_scene_with_labels(output.elements, &class_labels, params)
            .with_files(output.files))
    }

    /// Direct-scene path: inline labels are materialized with an empty class map.
    pub fn elements_to_scene(
        &self,
        elements: Vec<Element>,
        files: Map<String, Value>,
        params: &OutputParams,
    ) -> RenderScene {
        self.elements_to_scene_with_labels(elements, &ClassLabelMap::new(), params)
            .with_files(files)
    }

    fn elements_to_scene_with_labels(
        &self,
        elements: Vec<Element>,
        class_labels: &ClassLabelMap,
        params: &OutputParams,
    ) -> RenderScene {
        let mut ids = IdGenerator::new();
        let elements =
            LabelMaterializer::new(&self.estimator, &mut ids).materialize(elements, class_labels);
        assemble_scene(elements, params)
    }
}

/// [`ScenePipeline::diagram_to_scene`] with the built-in detectors.
pub fn diagram_to_scene(
    layout: &dyn DiagramLayout,
    text: &str,
    config: Option<&Value>,
    params: &OutputParams,
) -> Result<RenderScene> {
    ScenePipeline::new()?.diagram_to_scene(layout, text, config, params)
}

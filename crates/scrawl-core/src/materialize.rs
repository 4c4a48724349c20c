//! Converts inline shape labels into explicit, positioned text elements.

use crate::class_labels::ClassLabelMap;
use crate::element::{
    BoundElementKind, DEFAULT_STROKE_COLOR, DEFAULT_TEXT_FONT_SIZE, Element, ElementKind,
    TRANSPARENT, TextData,
};
use crate::estimate::{GeometryEstimator, Primitive};
use crate::geom::BBox;
use crate::ids::{IdGenerator, IdSource};
use crate::text::DEFAULT_FONT_SIZE;
use rustc_hash::FxHashSet;

/// Offset of class-body labels from the owner's top-left corner.
pub const CLASS_LABEL_PADDING: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Left/top aligned inside the owner, offset by [`CLASS_LABEL_PADDING`].
    ClassBody,
    /// Centered on the owner's geometric center.
    Centered,
}

/// Label materialization with an explicit estimator and id source.
pub struct LabelMaterializer<'a> {
    estimator: &'a GeometryEstimator,
    ids: &'a mut dyn IdSource,
}

impl<'a> LabelMaterializer<'a> {
    pub fn new(estimator: &'a GeometryEstimator, ids: &'a mut dyn IdSource) -> Self {
        Self { estimator, ids }
    }

    /// Returns `shapes` in input order, each labeled shape immediately followed by its text.
    ///
    /// Every output shape has its `label` field removed, whether or not a text was produced.
    pub fn materialize(
        &mut self,
        shapes: Vec<Element>,
        class_labels: &ClassLabelMap,
    ) -> Vec<Element> {
        let mut out = Vec::with_capacity(shapes.len() * 2);
        let mut seen_ids: FxHashSet<String> = FxHashSet::default();
        let mut produced = 0usize;

        for mut shape in shapes {
            let inline = shape.label.take();

            if shape.id.is_empty() {
                shape.id = self.ids.next_id();
            }
            if !seen_ids.insert(shape.id.clone()) {
                tracing::warn!(id = %shape.id, "duplicate element id in layout output");
            }

            let class_label = class_labels
                .get(&shape.id)
                .or_else(|| shape.class_id().and_then(|id| class_labels.get(id)));
            let inline_text = inline
                .as_ref()
                .map(|label| label.text.trim())
                .filter(|text| !text.is_empty());

            let Some(text) = inline_text.or(class_label).map(str::to_string) else {
                out.push(shape);
                continue;
            };

            let placement = if class_label.is_some() {
                Placement::ClassBody
            } else {
                Placement::Centered
            };
            let font_size = inline
                .as_ref()
                .and_then(|label| label.font_size)
                .filter(|size| size.is_finite() && *size > 0.0)
                .unwrap_or(match placement {
                    Placement::ClassBody => DEFAULT_TEXT_FONT_SIZE,
                    Placement::Centered => DEFAULT_FONT_SIZE,
                });

            let size = self
                .estimator
                .estimate(&Primitive::text(text.as_str(), font_size));
            let (x, y, text_align, vertical_align) = match placement {
                Placement::ClassBody => (
                    shape.x + CLASS_LABEL_PADDING,
                    shape.y + CLASS_LABEL_PADDING,
                    "left",
                    "top",
                ),
                Placement::Centered => {
                    // Kinds the estimator cannot measure fall back to the stored box.
                    let center = self
                        .estimator
                        .try_estimate(&shape.primitive())
                        .unwrap_or_else(|| BBox::new(shape.x, shape.y, shape.width, shape.height))
                        .center();
                    (
                        center.x - size.width / 2.0,
                        center.y - size.height / 2.0,
                        "center",
                        "middle",
                    )
                }
            };

            let mut label = Element::new(ElementKind::Text(TextData {
                text: text.clone(),
                font_size,
                font_family: 1,
                text_align: text_align.to_string(),
                vertical_align: vertical_align.to_string(),
                baseline: font_size,
                container_id: Some(shape.id.clone()),
                original_text: text,
                line_height: self.estimator.line_height(),
            }));
            label.id = self.ids.next_id();
            label.x = x;
            label.y = y;
            label.width = size.width;
            label.height = size.height;
            label.angle = shape.angle;
            label.stroke_color = inline
                .as_ref()
                .and_then(|l| l.stroke_color.clone())
                .unwrap_or_else(|| {
                    if shape.stroke_color.is_empty() {
                        DEFAULT_STROKE_COLOR.to_string()
                    } else {
                        shape.stroke_color.clone()
                    }
                });
            label.background_color = TRANSPARENT.to_string();
            label.stroke_width = 1.0;
            label.roughness = 0.0;
            label.opacity = shape.opacity;
            label.group_ids = inline
                .and_then(|l| l.group_ids)
                .unwrap_or_else(|| shape.group_ids.clone());
            label.frame_id = shape.frame_id.clone();
            label.seed = self.ids.next_nonce();
            label.version_nonce = self.ids.next_nonce();
            label.updated = self.ids.timestamp_ms();

            shape.push_bound_element(label.id.clone(), BoundElementKind::Text);
            out.push(shape);
            out.push(label);
            produced += 1;
        }

        tracing::debug!(elements = out.len(), labels = produced, "materialized labels");
        out
    }
}

/// [`LabelMaterializer::materialize`] with the deterministic estimator and random ids.
pub fn materialize_labels(shapes: Vec<Element>, class_labels: &ClassLabelMap) -> Vec<Element> {
    let estimator = GeometryEstimator::default();
    let mut ids = IdGenerator::new();
    LabelMaterializer::new(&estimator, &mut ids).materialize(shapes, class_labels)
}

use super::DslError;
use super::model::{
    ArrowSpec, Common, DslDocument, DslElement, Endpoint, ShapeSpec, Side, StyleOverrides,
    TextSpec,
};
use crate::element::{
    DEFAULT_STROKE_COLOR, Element, ElementKind, LinearData, Roundness, TRANSPARENT, TextData,
};
use crate::geom::{BBox, Point, point};
use crate::ids::CounterIds;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Resolved style attributes of a compiled element.
#[derive(Debug, Clone, PartialEq)]
struct Style {
    stroke_color: String,
    background_color: String,
    fill_style: String,
    stroke_width: f64,
    stroke_style: String,
    roughness: f64,
    opacity: f64,
}

impl Style {
    fn shape_defaults() -> Self {
        Self {
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            background_color: TRANSPARENT.to_string(),
            fill_style: "solid".to_string(),
            stroke_width: 2.0,
            stroke_style: "solid".to_string(),
            roughness: 1.0,
            opacity: 100.0,
        }
    }

    fn text_defaults() -> Self {
        Self {
            stroke_width: 1.0,
            roughness: 0.0,
            ..Self::shape_defaults()
        }
    }

    fn overlay(&mut self, o: &StyleOverrides) {
        if let Some(v) = &o.stroke_color {
            self.stroke_color = v.clone();
        }
        if let Some(v) = &o.background_color {
            self.background_color = v.clone();
        }
        if let Some(v) = &o.fill_style {
            self.fill_style = v.clone();
        }
        if let Some(v) = o.stroke_width {
            self.stroke_width = v;
        }
        if let Some(v) = &o.stroke_style {
            self.stroke_style = v.clone();
        }
        if let Some(v) = o.roughness {
            self.roughness = v;
        }
        if let Some(v) = o.opacity {
            self.opacity = v;
        }
    }

    fn apply_to(self, el: &mut Element) {
        el.stroke_color = self.stroke_color;
        el.background_color = self.background_color;
        el.fill_style = self.fill_style;
        el.stroke_width = self.stroke_width;
        el.stroke_style = self.stroke_style;
        el.roughness = self.roughness;
        el.opacity = self.opacity;
    }
}

/// Width and height of a padded text block: `max_chars * size * 0.6 + 2p` by
/// `lines * size * line_height + 2p`.
pub fn estimate_text_size(
    text: &str,
    font_size: f64,
    line_height: f64,
    padding: f64,
) -> (f64, f64) {
    let lines: Vec<&str> = text.lines().collect();
    let line_count = lines.len().max(1);
    let max_len = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    (
        max_len as f64 * font_size * 0.6 + padding * 2.0,
        line_count as f64 * font_size * line_height + padding * 2.0,
    )
}

fn anchor(bbox: &BBox, side: Side) -> Point {
    match side {
        Side::Left => point(bbox.x, bbox.y + bbox.height / 2.0),
        Side::Right => point(bbox.max_x(), bbox.y + bbox.height / 2.0),
        Side::Top => point(bbox.x + bbox.width / 2.0, bbox.y),
        Side::Bottom => point(bbox.x + bbox.width / 2.0, bbox.max_y()),
        Side::Center => bbox.center(),
    }
}

pub(super) struct Compiler<'a> {
    grid: f64,
    presets: &'a IndexMap<String, StyleOverrides>,
    fit_text: bool,
    ids: CounterIds,
    bboxes: FxHashMap<String, BBox>,
}

impl<'a> Compiler<'a> {
    pub(super) fn new(doc: &'a DslDocument, start_ms: i64) -> Result<Self, DslError> {
        let grid = doc.grid.unwrap_or(0.0);
        if !grid.is_finite() || grid < 0.0 {
            return Err(DslError::InvalidGrid);
        }
        Ok(Self {
            grid,
            presets: &doc.styles,
            fit_text: doc.fit_text,
            ids: CounterIds::new(start_ms),
            bboxes: FxHashMap::default(),
        })
    }

    /// Shapes first (so arrows may reference later shapes), output in document order.
    pub(super) fn compile(mut self, elements: &[DslElement]) -> Result<Vec<Element>, DslError> {
        let mut compiled: Vec<Option<Element>> = Vec::with_capacity(elements.len());
        for element in elements {
            compiled.push(match element {
                DslElement::Box(spec) => Some(self.shape(spec, "box")?),
                DslElement::Ellipse(spec) => Some(self.shape(spec, "ellipse")?),
                DslElement::Diamond(spec) => Some(self.shape(spec, "diamond")?),
                DslElement::Text(spec) => Some(self.text(spec)?),
                DslElement::Arrow(_) => None,
            });
        }

        let mut out = Vec::with_capacity(elements.len());
        for (element, slot) in elements.iter().zip(compiled) {
            match (element, slot) {
                (_, Some(el)) => out.push(el),
                (DslElement::Arrow(spec), None) => out.push(self.arrow(spec)?),
                (_, None) => {}
            }
        }
        Ok(out)
    }

    fn snap(&self, v: f64) -> f64 {
        if self.grid == 0.0 {
            v
        } else {
            (v / self.grid).round_ties_even() * self.grid
        }
    }

    fn style(&self, common: &Common) -> Result<Style, DslError> {
        let mut style = Style::shape_defaults();
        if let Some(name) = &common.style {
            let preset = self
                .presets
                .get(name)
                .ok_or_else(|| DslError::UnknownStyle(name.clone()))?;
            style.overlay(preset);
        }
        if let Some(overrides) = &common.style_overrides {
            style.overlay(overrides);
        }
        Ok(style)
    }

    fn id(&mut self, common: &Common, prefix: &str) -> String {
        common
            .id
            .clone()
            .unwrap_or_else(|| self.ids.next_with_prefix(prefix))
    }

    /// Counter-driven identity fields, in the order seed, nonce, timestamp.
    fn stamp(&mut self, el: &mut Element) {
        el.seed = self.ids.seed();
        el.version = 1;
        el.version_nonce = self.ids.version_nonce();
        el.updated = self.ids.timestamp_ms();
    }

    fn shape(&mut self, spec: &ShapeSpec, prefix: &str) -> Result<Element, DslError> {
        let id = self.id(&spec.common, prefix);
        let style = self.style(&spec.common)?;
        let (kind, roundness) = match prefix {
            "box" => (ElementKind::Rectangle, Roundness::adaptive()),
            "ellipse" => (ElementKind::Ellipse, Roundness::proportional()),
            _ => (ElementKind::Diamond, Roundness::proportional()),
        };

        let mut el = Element::new(kind);
        el.id = id.clone();
        el.x = self.snap(spec.x);
        el.y = self.snap(spec.y);
        el.width = self.snap(spec.w);
        el.height = self.snap(spec.h);
        style.apply_to(&mut el);
        el.roundness = Some(roundness);
        self.stamp(&mut el);

        self.bboxes
            .insert(id, BBox::new(el.x, el.y, el.width, el.height));
        Ok(el)
    }

    fn text(&mut self, spec: &TextSpec) -> Result<Element, DslError> {
        let id = self.id(&spec.common, "text");
        if spec.text.is_empty() {
            return Err(DslError::EmptyText);
        }

        let (est_w, est_h) =
            estimate_text_size(&spec.text, spec.font_size, spec.line_height, spec.padding);
        let (width, height) = if self.fit_text {
            (est_w, est_h)
        } else {
            (spec.w.unwrap_or(est_w), spec.h.unwrap_or(est_h))
        };

        let mut el = Element::new(ElementKind::Text(TextData {
            text: spec.text.clone(),
            font_size: spec.font_size,
            font_family: spec.font_family,
            text_align: spec.text_align.clone(),
            vertical_align: spec.vertical_align.clone(),
            baseline: 0.0,
            container_id: None,
            original_text: spec.text.clone(),
            line_height: spec.line_height,
        }));
        el.id = id.clone();
        el.x = self.snap(spec.x);
        el.y = self.snap(spec.y);
        el.width = self.snap(width);
        el.height = self.snap(height);
        if let ElementKind::Text(data) = &mut el.kind {
            data.baseline = (el.height - spec.padding).trunc();
        }
        Style::text_defaults().apply_to(&mut el);
        self.stamp(&mut el);

        self.bboxes
            .insert(id, BBox::new(el.x, el.y, el.width, el.height));
        Ok(el)
    }

    fn arrow(&mut self, spec: &ArrowSpec) -> Result<Element, DslError> {
        let id = self.id(&spec.common, "arrow");
        let resolve = |endpoint: &Endpoint| {
            self.bboxes
                .get(&endpoint.reference)
                .map(|bbox| anchor(bbox, endpoint.side))
                .ok_or_else(|| DslError::UnknownRef(endpoint.reference.clone()))
        };
        let start = resolve(&spec.from)?;
        let end = resolve(&spec.to)?;

        let (start_x, start_y) = (self.snap(start.x), self.snap(start.y));
        let (dx, dy) = (self.snap(end.x) - start_x, self.snap(end.y) - start_y);
        let style = self.style(&spec.common)?;

        let mut el = Element::new(ElementKind::Arrow(LinearData::arrow(vec![
            [0.0, 0.0],
            [dx, dy],
        ])));
        el.id = id;
        el.x = start_x;
        el.y = start_y;
        el.width = dx;
        el.height = dy;
        style.apply_to(&mut el);
        el.roundness = Some(Roundness::proportional());
        self.stamp(&mut el);
        Ok(el)
    }
}

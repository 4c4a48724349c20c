//! Bounding-box estimation for primitive shapes.
//!
//! This is the approximation layer that replaces a browser's `getBBox()`: closed-form boxes for
//! simple shapes and a character-count heuristic for text. It is a total function; malformed or
//! unknown input degrades to a zero-sized box instead of failing.

use crate::geom::{BBox, Point, finite_or_zero, point};
use crate::text::{DEFAULT_FONT_SIZE, DeterministicTextMeasurer, TextMeasurer, TextStyle};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Primitive shape descriptor accepted by [`GeometryEstimator`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// SVG-style text: `(x, y)` is the baseline anchor of the first line.
    Text {
        x: f64,
        y: f64,
        content: String,
        font_size: f64,
        line_height: Option<f64>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polyline {
        points: Vec<Point>,
    },
    Group {
        children: Vec<Primitive>,
    },
    Unknown {
        kind: String,
    },
}

impl Primitive {
    /// Synthetic text descriptor anchored at the origin, used for label sizing.
    pub fn text(content: impl Into<String>, font_size: f64) -> Self {
        Self::Text {
            x: 0.0,
            y: 0.0,
            content: content.into(),
            font_size,
            line_height: None,
        }
    }

    /// Builds a primitive from an open attribute bag (SVG-like attribute names).
    ///
    /// Numeric attributes that are missing, non-numeric or non-finite become `0`, except
    /// `font-size`/`fontSize` which defaults to 16. Children of `g`/`group` are read from a
    /// `children` array of `{ "kind": ..., ...attrs }` objects.
    pub fn from_attributes(kind: &str, attrs: &Map<String, Value>) -> Self {
        let num = |key: &str| attr_f64(attrs, key).unwrap_or(0.0);
        match kind.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text {
                x: num("x"),
                y: num("y"),
                content: attrs
                    .get("content")
                    .or_else(|| attrs.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                font_size: attr_f64(attrs, "font-size")
                    .or_else(|| attr_f64(attrs, "fontSize"))
                    .unwrap_or(DEFAULT_FONT_SIZE),
                line_height: attr_f64(attrs, "lineHeight"),
            },
            "rect" | "rectangle" => Self::Rect {
                x: num("x"),
                y: num("y"),
                width: num("width"),
                height: num("height"),
            },
            "image" => Self::Image {
                x: num("x"),
                y: num("y"),
                width: num("width"),
                height: num("height"),
            },
            "circle" => Self::Circle {
                cx: num("cx"),
                cy: num("cy"),
                r: num("r"),
            },
            "ellipse" => Self::Ellipse {
                cx: num("cx"),
                cy: num("cy"),
                rx: num("rx"),
                ry: num("ry"),
            },
            "line" | "arrow" => Self::Line {
                x1: num("x1"),
                y1: num("y1"),
                x2: num("x2"),
                y2: num("y2"),
            },
            "polyline" | "polygon" => Self::Polyline {
                points: attrs
                    .get("points")
                    .and_then(Value::as_array)
                    .map(|pts| pts.iter().filter_map(point_from_value).collect())
                    .unwrap_or_default(),
            },
            "g" | "group" => Self::Group {
                children: attrs
                    .get("children")
                    .and_then(Value::as_array)
                    .map(|children| {
                        children
                            .iter()
                            .filter_map(Value::as_object)
                            .map(|child| {
                                let kind = child
                                    .get("kind")
                                    .and_then(Value::as_str)
                                    .unwrap_or_default();
                                Self::from_attributes(kind, child)
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            other => Self::Unknown {
                kind: other.to_string(),
            },
        }
    }
}

fn attr_f64(attrs: &Map<String, Value>, key: &str) -> Option<f64> {
    let v = match attrs.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches("px").parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn point_from_value(value: &Value) -> Option<Point> {
    match value {
        Value::Array(xy) if xy.len() == 2 => Some(point(
            finite_or_zero(xy[0].as_f64()?),
            finite_or_zero(xy[1].as_f64()?),
        )),
        Value::Object(obj) => Some(point(
            finite_or_zero(obj.get("x")?.as_f64()?),
            finite_or_zero(obj.get("y")?.as_f64()?),
        )),
        _ => None,
    }
}

/// Bounding-box estimator backed by a pluggable [`TextMeasurer`].
#[derive(Clone)]
pub struct GeometryEstimator {
    measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for GeometryEstimator {
    fn default() -> Self {
        Self::new(Arc::new(DeterministicTextMeasurer::default()))
    }
}

impl std::fmt::Debug for GeometryEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryEstimator").finish_non_exhaustive()
    }
}

impl GeometryEstimator {
    pub fn new(measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        Self { measurer }
    }

    pub fn measurer(&self) -> &(dyn TextMeasurer + Send + Sync) {
        self.measurer.as_ref()
    }

    /// Returns the primitive's box, or a zero box at the origin when it has no usable geometry.
    pub fn estimate(&self, primitive: &Primitive) -> BBox {
        self.try_estimate(primitive)
            .unwrap_or_else(|| BBox::zero_at(0.0, 0.0))
    }

    /// Like [`GeometryEstimator::estimate`], but `None` for kinds that do not support estimation
    /// (unknown kinds and groups without any measurable child).
    pub fn try_estimate(&self, primitive: &Primitive) -> Option<BBox> {
        let bbox = match primitive {
            Primitive::Text {
                x,
                y,
                content,
                font_size,
                line_height,
            } => {
                let (x, y) = (finite_or_zero(*x), finite_or_zero(*y));
                if content.is_empty() {
                    return Some(BBox::zero_at(x, y));
                }
                let style = TextStyle {
                    font_size: if font_size.is_finite() {
                        *font_size
                    } else {
                        DEFAULT_FONT_SIZE
                    },
                    line_height: *line_height,
                    ..Default::default()
                };
                let m = self.measurer.measure(content, &style);
                BBox::new(x, y - m.height, m.width, m.height)
            }
            Primitive::Rect {
                x,
                y,
                width,
                height,
            }
            | Primitive::Image {
                x,
                y,
                width,
                height,
            } => BBox::new(*x, *y, *width, *height),
            Primitive::Circle { cx, cy, r } => {
                let r = finite_or_zero(*r).abs();
                BBox::new(cx - r, cy - r, 2.0 * r, 2.0 * r)
            }
            Primitive::Ellipse { cx, cy, rx, ry } => {
                let (rx, ry) = (finite_or_zero(*rx).abs(), finite_or_zero(*ry).abs());
                BBox::new(cx - rx, cy - ry, 2.0 * rx, 2.0 * ry)
            }
            Primitive::Line { x1, y1, x2, y2 } => BBox::from_points([
                point(finite_or_zero(*x1), finite_or_zero(*y1)),
                point(finite_or_zero(*x2), finite_or_zero(*y2)),
            ])?,
            Primitive::Polyline { points } => BBox::from_points(points.iter().copied())?,
            Primitive::Group { children } => children
                .iter()
                .filter_map(|child| self.try_estimate(child))
                .reduce(|acc, b| acc.union(&b))?,
            Primitive::Unknown { kind } => {
                tracing::debug!(kind = %kind, "no bounding box for unknown primitive kind");
                return None;
            }
        };
        Some(bbox)
    }

    /// Line height factor the estimator applies to text.
    pub fn line_height(&self) -> f64 {
        self.measurer
            .measure("", &TextStyle::with_font_size(1.0))
            .line_height
    }
}

/// [`GeometryEstimator::estimate`] with the deterministic text measurer.
pub fn estimate_bbox(primitive: &Primitive) -> BBox {
    GeometryEstimator::default().estimate(primitive)
}

//! Scene to SVG document.
//!
//! The output is a plain SVG 1.1 document that `usvg` can parse without a browser: no CSS
//! classes, no `foreignObject`, embedded images only as data URLs.

use crate::Diagnostics;
use scrawl_core::element::{
    FrameData, FreedrawData, ImageData, LinearData, Roundness, TRANSPARENT, TextData,
};
use scrawl_core::{BBox, Element, ElementKind, GeometryEstimator, RenderScene};
use serde_json::{Map, Value};
use std::fmt::Write as _;

pub const DEFAULT_EXPORT_PADDING: f64 = 10.0;
pub const DARK_FILTER_CSS: &str = "invert(93%) hue-rotate(180deg)";

const DEFAULT_PROPORTIONAL_RADIUS: f64 = 0.25;
const DEFAULT_ADAPTIVE_RADIUS: f64 = 32.0;
const FRAME_NAME_FONT_SIZE: f64 = 14.0;
const FRAME_NAME_COLOR: &str = "#999999";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SvgOptions {
    /// Paint the background and the dark theme filter into the document itself. Raster output
    /// leaves both to the pixmap stage.
    pub standalone: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub svg: String,
    /// Scene-space area covered by the document, padding included.
    pub viewport: BBox,
}

/// Union of the estimated boxes of every visible element; a zero box at the origin when nothing
/// has measurable geometry.
pub fn content_bounds(elements: &[Element], estimator: &GeometryEstimator) -> BBox {
    elements
        .iter()
        .filter(|el| !el.is_deleted)
        .filter_map(|el| estimator.try_estimate(&el.primitive()))
        .reduce(|acc, bbox| acc.union(&bbox))
        .unwrap_or_else(|| BBox::zero_at(0.0, 0.0))
}

pub fn scene_to_svg(
    scene: &RenderScene,
    estimator: &GeometryEstimator,
    options: SvgOptions,
    diagnostics: &mut Diagnostics,
) -> SvgDocument {
    let padding = scene
        .export
        .export_padding
        .filter(|p| p.is_finite())
        .unwrap_or(DEFAULT_EXPORT_PADDING)
        .max(0.0);
    let bounds = content_bounds(&scene.elements, estimator);
    let viewport = BBox::new(
        bounds.x - padding,
        bounds.y - padding,
        bounds.width + 2.0 * padding,
        bounds.height + 2.0 * padding,
    );

    let mut writer = SvgWriter {
        body: String::new(),
        defs: String::new(),
        patterns: 0,
        files: &scene.files,
        diagnostics,
    };
    for el in scene.elements.iter().filter(|el| !el.is_deleted) {
        writer.element(el);
    }

    let mut svg = String::with_capacity(writer.body.len() + 512);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}""#,
        x = Num(viewport.x),
        y = Num(viewport.y),
        w = Num(viewport.width),
        h = Num(viewport.height),
    );
    if options.standalone && scene.app_state.export_with_dark_mode {
        let _ = write!(svg, r#" style="filter: {DARK_FILTER_CSS}""#);
    }
    svg.push('>');
    if !writer.defs.is_empty() {
        svg.push_str("<defs>");
        svg.push_str(&writer.defs);
        svg.push_str("</defs>");
    }
    if options.standalone && scene.app_state.export_background {
        let _ = write!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            Num(viewport.x),
            Num(viewport.y),
            Num(viewport.width),
            Num(viewport.height),
            Escaped(&scene.app_state.view_background_color),
        );
    }
    svg.push_str(&writer.body);
    svg.push_str("</svg>");

    tracing::debug!(
        elements = scene.elements.len(),
        width = viewport.width,
        height = viewport.height,
        bytes = svg.len(),
        "scene written as svg"
    );
    SvgDocument { svg, viewport }
}

struct SvgWriter<'a> {
    body: String,
    defs: String,
    patterns: usize,
    files: &'a Map<String, Value>,
    diagnostics: &'a mut Diagnostics,
}

/// Presentation attributes shared by every shape of one element.
struct Paint {
    stroke: String,
    fill: String,
    common: String,
}

impl SvgWriter<'_> {
    fn element(&mut self, el: &Element) {
        match &el.kind {
            ElementKind::Rectangle | ElementKind::Embeddable | ElementKind::Iframe => {
                self.rectangle(el)
            }
            ElementKind::Diamond => self.diamond(el),
            ElementKind::Ellipse => self.ellipse(el),
            ElementKind::Line(data) => self.linear(el, data, true),
            ElementKind::Arrow(data) => self.linear(el, data, false),
            ElementKind::Freedraw(data) => self.freedraw(el, data),
            ElementKind::Text(data) => self.text(el, data),
            ElementKind::Image(data) => self.image(el, data),
            ElementKind::Frame(data) => self.frame(el, data, "Frame"),
            ElementKind::MagicFrame(data) => self.frame(el, data, "AI Frame"),
            ElementKind::Other(kind) => self
                .diagnostics
                .push(format!("skipped element `{}` of unsupported type `{kind}`", el.id)),
        }
    }

    fn paint(&mut self, el: &Element) -> Paint {
        let has_stroke = is_visible_color(&el.stroke_color) && el.stroke_width > 0.0;
        let stroke = if has_stroke {
            escape_xml(&el.stroke_color)
        } else {
            "none".to_string()
        };
        let fill = if is_visible_color(&el.background_color) {
            match el.fill_style.as_str() {
                "hachure" | "zigzag" => self.fill_pattern(el, false),
                "cross-hatch" => self.fill_pattern(el, true),
                _ => escape_xml(&el.background_color),
            }
        } else {
            "none".to_string()
        };

        let mut common = String::new();
        if has_stroke {
            let _ = write!(
                common,
                r#" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round""#,
                Num(el.stroke_width)
            );
            if let Some((dash, gap)) = dash_array(&el.stroke_style, el.stroke_width) {
                let _ = write!(common, r#" stroke-dasharray="{},{}""#, Num(dash), Num(gap));
            }
        }
        common.push_str(&element_attrs(el));
        Paint {
            stroke,
            fill,
            common,
        }
    }

    /// Registers a hatching pattern in `<defs>` and returns the `url(#..)` reference.
    fn fill_pattern(&mut self, el: &Element, cross: bool) -> String {
        self.patterns += 1;
        let id = format!("fill-{}", self.patterns);
        let gap = (el.stroke_width * 4.0).max(4.0);
        let color = escape_xml(&el.background_color);
        let line_width = (el.stroke_width / 2.0).max(0.5);
        let _ = write!(
            self.defs,
            r#"<pattern id="{id}" patternUnits="userSpaceOnUse" width="{g}" height="{g}" patternTransform="rotate(-41)"><line x1="0" y1="0" x2="0" y2="{g}" stroke="{color}" stroke-width="{lw}"/>"#,
            g = Num(gap),
            lw = Num(line_width),
        );
        if cross {
            let _ = write!(
                self.defs,
                r#"<line x1="0" y1="0" x2="{g}" y2="0" stroke="{color}" stroke-width="{lw}"/>"#,
                g = Num(gap),
                lw = Num(line_width),
            );
        }
        self.defs.push_str("</pattern>");
        format!("url(#{id})")
    }

    fn rectangle(&mut self, el: &Element) {
        let Paint {
            stroke,
            mut fill,
            common,
        } = self.paint(el);
        if matches!(el.kind, ElementKind::Embeddable | ElementKind::Iframe) {
            fill = "none".to_string();
        }
        let radius = el
            .roundness
            .as_ref()
            .map_or(0.0, |r| corner_radius(el.width.min(el.height), r));
        let _ = write!(
            self.body,
            r#"<rect x="{}" y="{}" width="{}" height="{}""#,
            Num(el.x),
            Num(el.y),
            Num(el.width.max(0.0)),
            Num(el.height.max(0.0)),
        );
        if radius > 0.0 {
            let _ = write!(self.body, r#" rx="{r}" ry="{r}""#, r = Num(radius));
        }
        let _ = write!(
            self.body,
            r#" fill="{fill}" stroke="{stroke}"{common}/>"#
        );
    }

    fn diamond(&mut self, el: &Element) {
        let Paint {
            stroke,
            fill,
            common,
        } = self.paint(el);
        let (x, y, w, h) = (el.x, el.y, el.width, el.height);
        let _ = write!(
            self.body,
            r#"<polygon points="{},{} {},{} {},{} {},{}" fill="{fill}" stroke="{stroke}"{common}/>"#,
            Num(x + w / 2.0),
            Num(y),
            Num(x + w),
            Num(y + h / 2.0),
            Num(x + w / 2.0),
            Num(y + h),
            Num(x),
            Num(y + h / 2.0),
        );
    }

    fn ellipse(&mut self, el: &Element) {
        let Paint {
            stroke,
            fill,
            common,
        } = self.paint(el);
        let _ = write!(
            self.body,
            r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" fill="{fill}" stroke="{stroke}"{common}/>"#,
            Num(el.x + el.width / 2.0),
            Num(el.y + el.height / 2.0),
            Num((el.width / 2.0).abs()),
            Num((el.height / 2.0).abs()),
        );
    }

    fn linear(&mut self, el: &Element, data: &LinearData, allow_fill: bool) {
        let points = absolute_points(el, &data.points);
        if points.len() < 2 {
            self.diagnostics
                .push(format!("skipped {} `{}` with fewer than two points", el.type_name(), el.id));
            return;
        }
        let Paint {
            stroke,
            fill,
            common,
        } = self.paint(el);
        let closed = allow_fill && points.len() > 2 && points.first() == points.last();
        let path = if el.roundness.is_some() {
            catmull_rom_path(&points)
        } else {
            polyline_path(&points)
        };
        let fill = if closed { fill.as_str() } else { "none" };
        let _ = write!(
            self.body,
            r#"<path d="{path}" fill="{fill}" stroke="{stroke}"{common}/>"#
        );

        let n = points.len();
        let heads = [
            (data.start_arrowhead.as_deref(), points[1], points[0]),
            (data.end_arrowhead.as_deref(), points[n - 2], points[n - 1]),
        ];
        for (head, tail, tip) in heads {
            let Some(head) = head else {
                continue;
            };
            match arrowhead_shape(head, tail, tip, el.stroke_width) {
                Some(shape) => self.arrowhead(el, &shape, &stroke),
                None => self.diagnostics.push(format!(
                    "skipped unsupported arrowhead `{head}` on `{}`",
                    el.id
                )),
            }
        }
    }

    fn arrowhead(&mut self, el: &Element, shape: &Arrowhead, stroke: &str) {
        // Arrowheads are never dashed.
        let mut attrs = String::new();
        let _ = write!(
            attrs,
            r#" stroke="{stroke}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round""#,
            Num(el.stroke_width)
        );
        attrs.push_str(&element_attrs(el));
        let solid_fill = |outline: bool| {
            if outline {
                if is_visible_color(&el.background_color) {
                    escape_xml(&el.background_color)
                } else {
                    "none".to_string()
                }
            } else {
                stroke.to_string()
            }
        };
        match shape {
            Arrowhead::Lines(lines) => {
                for (a, b) in lines {
                    let _ = write!(
                        self.body,
                        r#"<path d="M{},{} L{},{}" fill="none"{attrs}/>"#,
                        Num(a.0),
                        Num(a.1),
                        Num(b.0),
                        Num(b.1),
                    );
                }
            }
            Arrowhead::Polygon { points, outline } => {
                let _ = write!(
                    self.body,
                    r#"<polygon points="{}" fill="{}"{attrs}/>"#,
                    points_attr(points),
                    solid_fill(*outline),
                );
            }
            Arrowhead::Circle {
                center,
                radius,
                outline,
            } => {
                let _ = write!(
                    self.body,
                    r#"<circle cx="{}" cy="{}" r="{}" fill="{}"{attrs}/>"#,
                    Num(center.0),
                    Num(center.1),
                    Num(*radius),
                    solid_fill(*outline),
                );
            }
        }
    }

    fn freedraw(&mut self, el: &Element, data: &FreedrawData) {
        let points = absolute_points(el, &data.points);
        if points.is_empty() {
            return;
        }
        let Paint { stroke, common, .. } = self.paint(el);
        let path = if points.len() == 1 {
            // A single click: a zero-length segment still gets round caps.
            let (x, y) = points[0];
            format!("M{},{} L{},{}", Num(x), Num(y), Num(x), Num(y))
        } else {
            catmull_rom_path(&points)
        };
        let _ = write!(
            self.body,
            r#"<path d="{path}" fill="none" stroke="{stroke}"{common}/>"#
        );
    }

    fn text(&mut self, el: &Element, data: &TextData) {
        if data.text.is_empty() {
            return;
        }
        let font_size = if data.font_size > 0.0 {
            data.font_size
        } else {
            scrawl_core::element::DEFAULT_TEXT_FONT_SIZE
        };
        let line_px = data.line_height.max(0.0) * font_size;
        let (anchor, x) = match data.text_align.as_str() {
            "center" => ("middle", el.x + el.width / 2.0),
            "right" => ("end", el.x + el.width),
            _ => ("start", el.x),
        };
        let attrs = element_attrs(el);
        let _ = write!(
            self.body,
            r#"<text font-family="{}" font-size="{}" fill="{}" text-anchor="{anchor}" xml:space="preserve"{attrs}>"#,
            font_family(data.font_family),
            Num(font_size),
            escape_xml(&el.stroke_color),
        );
        for (i, line) in data.lines().into_iter().enumerate() {
            let baseline =
                el.y + i as f64 * line_px + (line_px - font_size) / 2.0 + font_size * 0.8;
            let _ = write!(
                self.body,
                r#"<tspan x="{}" y="{}">{}</tspan>"#,
                Num(x),
                Num(baseline),
                Escaped(line),
            );
        }
        self.body.push_str("</text>");
    }

    fn image(&mut self, el: &Element, data: &ImageData) {
        let Some(file_id) = data.file_id.as_deref() else {
            self.diagnostics
                .push(format!("skipped image `{}` without a fileId", el.id));
            return;
        };
        let data_url = self
            .files
            .get(file_id)
            .and_then(|file| file.get("dataURL"))
            .and_then(Value::as_str)
            .filter(|url| url.starts_with("data:"));
        let Some(data_url) = data_url else {
            self.diagnostics.push(format!(
                "skipped image `{}`: file `{file_id}` is missing or has no data URL",
                el.id
            ));
            return;
        };
        let common = element_attrs(el);
        let mut transform = String::new();
        let [sx, sy] = data.scale;
        if sx < 0.0 || sy < 0.0 {
            let (cx, cy) = (el.x + el.width / 2.0, el.y + el.height / 2.0);
            let _ = write!(
                transform,
                r#" transform="translate({} {}) scale({} {}) translate({} {})""#,
                Num(cx),
                Num(cy),
                Num(sx.signum()),
                Num(sy.signum()),
                Num(-cx),
                Num(-cy),
            );
        }
        let _ = write!(
            self.body,
            r#"<g{common}><image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" xlink:href="{}"{transform}/></g>"#,
            Num(el.x),
            Num(el.y),
            Num(el.width.max(0.0)),
            Num(el.height.max(0.0)),
            Escaped(data_url),
        );
    }

    fn frame(&mut self, el: &Element, data: &FrameData, default_name: &str) {
        let Paint { stroke, common, .. } = self.paint(el);
        let _ = write!(
            self.body,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="8" ry="8" fill="none" stroke="{stroke}"{common}/>"#,
            Num(el.x),
            Num(el.y),
            Num(el.width.max(0.0)),
            Num(el.height.max(0.0)),
        );
        let name = data.name.as_deref().unwrap_or(default_name);
        let _ = write!(
            self.body,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{FRAME_NAME_COLOR}">{}</text>"#,
            Num(el.x),
            Num(el.y - FRAME_NAME_FONT_SIZE * 0.5),
            font_family(0),
            Num(FRAME_NAME_FONT_SIZE),
            Escaped(name),
        );
    }
}

/// Opacity and rotation of one element.
fn element_attrs(el: &Element) -> String {
    let mut attrs = String::new();
    let opacity = (el.opacity / 100.0).clamp(0.0, 1.0);
    if opacity < 1.0 {
        let _ = write!(attrs, r#" opacity="{}""#, Num(opacity));
    }
    if el.angle != 0.0 && el.angle.is_finite() {
        let _ = write!(
            attrs,
            r#" transform="rotate({} {} {})""#,
            Num(el.angle.to_degrees()),
            Num(el.x + el.width / 2.0),
            Num(el.y + el.height / 2.0)
        );
    }
    attrs
}

fn is_visible_color(color: &str) -> bool {
    let color = color.trim();
    !color.is_empty()
        && !color.eq_ignore_ascii_case(TRANSPARENT)
        && !color.eq_ignore_ascii_case("none")
}

fn dash_array(stroke_style: &str, stroke_width: f64) -> Option<(f64, f64)> {
    match stroke_style {
        "dashed" => Some((8.0, 8.0 + stroke_width.max(0.0))),
        "dotted" => Some((1.5, 6.0 + stroke_width.max(0.0))),
        _ => None,
    }
}

/// Corner radius of a rounded box whose shorter side is `size`.
pub fn corner_radius(size: f64, roundness: &Roundness) -> f64 {
    match roundness.kind {
        Roundness::ADAPTIVE_RADIUS => {
            let fixed = roundness.value.unwrap_or(DEFAULT_ADAPTIVE_RADIUS);
            if size <= fixed / DEFAULT_PROPORTIONAL_RADIUS {
                size * DEFAULT_PROPORTIONAL_RADIUS
            } else {
                fixed
            }
        }
        Roundness::LEGACY | Roundness::PROPORTIONAL_RADIUS => size * DEFAULT_PROPORTIONAL_RADIUS,
        _ => 0.0,
    }
}

/// Font stack for a numeric font family id.
pub fn font_family(id: u32) -> &'static str {
    match id {
        1 => "Virgil, Excalifont, sans-serif",
        2 => "Helvetica, Arial, sans-serif",
        3 => "Cascadia Code, Cascadia Mono, monospace",
        5 => "Excalifont, Virgil, sans-serif",
        6 => "Nunito, sans-serif",
        7 => "Lilita One, sans-serif",
        8 => "Comic Shanns, monospace",
        9 => "Liberation Sans, Arial, sans-serif",
        _ => "sans-serif",
    }
}

fn absolute_points(el: &Element, points: &[[f64; 2]]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|[px, py]| px.is_finite() && py.is_finite())
        .map(|[px, py]| (el.x + px, el.y + py))
        .collect()
}

fn polyline_path(points: &[(f64, f64)]) -> String {
    let mut d = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{},{} ", Num(*x), Num(*y));
    }
    d.truncate(d.trim_end().len());
    d
}

/// Smooth curve through every point (Catmull-Rom, tension 0.5, as cubic Béziers).
fn catmull_rom_path(points: &[(f64, f64)]) -> String {
    if points.len() <= 2 {
        return polyline_path(points);
    }
    let get = |i: isize| -> (f64, f64) {
        let idx = i.clamp(0, points.len() as isize - 1) as usize;
        points[idx]
    };
    let tension = 0.5;
    let (x0, y0) = points[0];
    let mut d = format!("M{},{}", Num(x0), Num(y0));
    for i in 0..points.len() as isize - 1 {
        let (p0, p1, p2, p3) = (get(i - 1), get(i), get(i + 1), get(i + 2));
        let cp1 = (
            p1.0 + (p2.0 - p0.0) * tension / 3.0,
            p1.1 + (p2.1 - p0.1) * tension / 3.0,
        );
        let cp2 = (
            p2.0 - (p3.0 - p1.0) * tension / 3.0,
            p2.1 - (p3.1 - p1.1) * tension / 3.0,
        );
        let _ = write!(
            d,
            " C{},{} {},{} {},{}",
            Num(cp1.0),
            Num(cp1.1),
            Num(cp2.0),
            Num(cp2.1),
            Num(p2.0),
            Num(p2.1)
        );
    }
    d
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", Num(*x), Num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
enum Arrowhead {
    Lines(Vec<((f64, f64), (f64, f64))>),
    Polygon {
        points: Vec<(f64, f64)>,
        outline: bool,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        outline: bool,
    },
}

fn rotate_around(p: (f64, f64), center: (f64, f64), angle: f64) -> (f64, f64) {
    let (dx, dy) = (p.0 - center.0, p.1 - center.1);
    let (sin, cos) = angle.sin_cos();
    (center.0 + dx * cos - dy * sin, center.1 + dx * sin + dy * cos)
}

/// Arrowhead geometry at `tip` for a segment arriving from `tail`.
///
/// `None` for an unknown arrowhead name. A zero-length segment yields an empty line set.
fn arrowhead_shape(
    kind: &str,
    tail: (f64, f64),
    tip: (f64, f64),
    stroke_width: f64,
) -> Option<Arrowhead> {
    let (size, angle_deg, length_factor): (f64, f64, f64) = match kind {
        "arrow" => (25.0, 20.0, 0.5),
        "bar" => (15.0, 90.0, 0.5),
        "dot" | "circle" | "circle_outline" | "triangle" | "triangle_outline" => {
            (15.0, 25.0, 0.5)
        }
        "diamond" | "diamond_outline" => (12.0, 25.0, 0.25),
        _ => return None,
    };
    let (dx, dy) = (tip.0 - tail.0, tip.1 - tail.1);
    let len = dx.hypot(dy);
    if len < 1e-6 {
        return Some(Arrowhead::Lines(Vec::new()));
    }
    let (nx, ny) = (dx / len, dy / len);
    let min_size = size.min(len * length_factor);
    let back = (tip.0 - nx * min_size, tip.1 - ny * min_size);
    let angle = angle_deg.to_radians();
    let left = rotate_around(back, tip, -angle);
    let right = rotate_around(back, tip, angle);
    let outline = kind.ends_with("_outline");

    Some(match kind {
        "dot" | "circle" | "circle_outline" => Arrowhead::Circle {
            center: tip,
            radius: ((min_size + stroke_width - 2.0) / 2.0).max(0.5),
            outline,
        },
        "bar" => Arrowhead::Lines(vec![(left, right)]),
        "arrow" => Arrowhead::Lines(vec![(left, tip), (right, tip)]),
        "diamond" | "diamond_outline" => {
            let opposite = (tip.0 - nx * min_size * 2.0, tip.1 - ny * min_size * 2.0);
            Arrowhead::Polygon {
                points: vec![tip, left, opposite, right],
                outline,
            }
        }
        _ => Arrowhead::Polygon {
            points: vec![tip, left, right],
            outline,
        },
    })
}

/// SVG number: at most three decimals, no `-0`, non-finite values as `0`.
#[derive(Debug, Clone, Copy)]
struct Num(f64);

impl std::fmt::Display for Num {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let v = self.0;
        if !v.is_finite() {
            return f.write_str("0");
        }
        let mut v = (v * 1000.0).round() / 1000.0;
        if v == 0.0 {
            v = 0.0;
        }
        write!(f, "{v}")
    }
}

/// Writes text with XML special characters escaped.
struct Escaped<'a>(&'a str);

impl std::fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.0;
        let mut start = 0usize;
        for (i, b) in text.bytes().enumerate() {
            let esc = match b {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                b'\'' => "&#39;",
                _ => continue,
            };
            if start < i {
                f.write_str(&text[start..i])?;
            }
            f.write_str(esc)?;
            start = i + 1;
        }
        if start < text.len() {
            f.write_str(&text[start..])?;
        }
        Ok(())
    }
}

fn escape_xml(text: &str) -> String {
    Escaped(text).to_string()
}

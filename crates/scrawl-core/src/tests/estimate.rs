use super::assert_close;
use crate::geom::point;
use crate::*;
use serde_json::json;

#[test]
fn circle_box_is_center_minus_radius() {
    let bbox = estimate_bbox(&Primitive::Circle {
        cx: 10.0,
        cy: 10.0,
        r: 5.0,
    });
    assert_eq!(bbox, BBox::new(5.0, 5.0, 10.0, 10.0));
}

#[test]
fn rect_and_image_boxes_are_verbatim() {
    let rect = estimate_bbox(&Primitive::Rect {
        x: 3.0,
        y: -4.0,
        width: 120.0,
        height: 60.0,
    });
    assert_eq!(rect, BBox::new(3.0, -4.0, 120.0, 60.0));

    let image = estimate_bbox(&Primitive::Image {
        x: 1.5,
        y: 2.5,
        width: 10.0,
        height: 20.0,
    });
    assert_eq!(image, BBox::new(1.5, 2.5, 10.0, 20.0));
}

#[test]
fn ellipse_box_uses_both_radii() {
    let bbox = estimate_bbox(&Primitive::Ellipse {
        cx: 50.0,
        cy: 20.0,
        rx: 30.0,
        ry: 10.0,
    });
    assert_eq!(bbox, BBox::new(20.0, 10.0, 60.0, 20.0));
}

#[test]
fn line_box_is_endpoint_envelope_in_any_direction() {
    let bbox = estimate_bbox(&Primitive::Line {
        x1: 40.0,
        y1: 5.0,
        x2: 10.0,
        y2: 25.0,
    });
    assert_eq!(bbox, BBox::new(10.0, 5.0, 30.0, 20.0));
}

#[test]
fn text_box_hangs_above_the_baseline() {
    let bbox = estimate_bbox(&Primitive::Text {
        x: 0.0,
        y: 100.0,
        content: "hello\nab".to_string(),
        font_size: 10.0,
        line_height: None,
    });
    assert_close(bbox.width, 5.0 * 10.0 * 0.6);
    assert_close(bbox.height, 2.0 * 10.0 * 1.25);
    assert_close(bbox.y, 100.0 - 25.0);
    assert_close(bbox.x, 0.0);
}

#[test]
fn empty_text_is_a_zero_box_at_its_anchor() {
    let bbox = estimate_bbox(&Primitive::Text {
        x: 7.0,
        y: 9.0,
        content: String::new(),
        font_size: 16.0,
        line_height: None,
    });
    assert_eq!(bbox, BBox::zero_at(7.0, 9.0));
    assert!(bbox.is_zero());
}

#[test]
fn unknown_kind_is_a_zero_box_at_origin() {
    let bbox = estimate_bbox(&Primitive::Unknown {
        kind: "foreignObject".to_string(),
    });
    assert_eq!(bbox, BBox::zero_at(0.0, 0.0));
}

#[test]
fn group_unions_measurable_children_only() {
    let group = Primitive::Group {
        children: vec![
            Primitive::Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            Primitive::Unknown {
                kind: "path".to_string(),
            },
            Primitive::Circle {
                cx: 30.0,
                cy: 30.0,
                r: 5.0,
            },
        ],
    };
    assert_eq!(estimate_bbox(&group), BBox::new(0.0, 0.0, 35.0, 35.0));

    let opaque = Primitive::Group {
        children: vec![Primitive::Unknown {
            kind: "path".to_string(),
        }],
    };
    assert_eq!(estimate_bbox(&opaque), BBox::zero_at(0.0, 0.0));
}

#[test]
fn polyline_box_covers_every_point() {
    let bbox = estimate_bbox(&Primitive::Polyline {
        points: vec![point(5.0, 5.0), point(-5.0, 8.0), point(2.0, -1.0)],
    });
    assert_eq!(bbox, BBox::new(-5.0, -1.0, 10.0, 9.0));
}

#[test]
fn sizes_are_never_negative() {
    let rect = estimate_bbox(&Primitive::Rect {
        x: 0.0,
        y: 0.0,
        width: -10.0,
        height: -3.0,
    });
    assert_eq!(rect.width, 0.0);
    assert_eq!(rect.height, 0.0);

    let circle = estimate_bbox(&Primitive::Circle {
        cx: 0.0,
        cy: 0.0,
        r: -2.0,
    });
    assert_eq!(circle, BBox::new(-2.0, -2.0, 4.0, 4.0));
}

#[test]
fn attribute_bags_coerce_missing_and_non_numeric_values() {
    let attrs = json!({ "cx": "abc", "r": 4 });
    let circle = Primitive::from_attributes("circle", attrs.as_object().unwrap());
    assert_eq!(
        circle,
        Primitive::Circle {
            cx: 0.0,
            cy: 0.0,
            r: 4.0
        }
    );

    let attrs = json!({ "x": "12px", "y": 40, "content": "abc" });
    let Primitive::Text { x, font_size, .. } =
        Primitive::from_attributes("text", attrs.as_object().unwrap())
    else {
        panic!("expected a text primitive");
    };
    assert_close(x, 12.0);
    assert_close(font_size, 16.0);
}

#[test]
fn attribute_bag_groups_read_children() {
    let attrs = json!({
        "children": [
            { "kind": "rect", "x": 0, "y": 0, "width": 4, "height": 4 },
            { "kind": "line", "x1": 10, "y1": 10, "x2": 12, "y2": 20 }
        ]
    });
    let group = Primitive::from_attributes("g", attrs.as_object().unwrap());
    assert_eq!(estimate_bbox(&group), BBox::new(0.0, 0.0, 12.0, 20.0));

    let unknown = Primitive::from_attributes("marker", attrs.as_object().unwrap());
    assert_eq!(estimate_bbox(&unknown), BBox::zero_at(0.0, 0.0));
}

#[test]
fn estimator_reports_the_measurer_line_height() {
    let estimator = GeometryEstimator::new(std::sync::Arc::new(DeterministicTextMeasurer {
        char_width_factor: 0.5,
        line_height_factor: 1.5,
    }));
    assert_close(estimator.line_height(), 1.5);
    assert_close(GeometryEstimator::default().line_height(), 1.25);
}

#[test]
fn default_measurer_uses_the_documented_factors() {
    let measurer = DeterministicTextMeasurer::default();
    assert_close(measurer.char_width_factor, 0.6);
    assert_close(measurer.line_height_factor, 1.25);

    let metrics = measurer.measure("abcd\nab", &TextStyle::with_font_size(10.0));
    assert_close(metrics.width, 24.0);
    assert_close(metrics.height, 25.0);

    let flat = DeterministicTextMeasurer {
        char_width_factor: 0.0,
        ..DeterministicTextMeasurer::default()
    };
    let metrics = flat.measure("abcd", &TextStyle::with_font_size(10.0));
    assert_close(metrics.width, 0.0);
    assert_close(metrics.height, 12.5);
}

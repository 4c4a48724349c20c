use super::assert_close;
use crate::ids::IdSource;
use crate::*;
use rustc_hash::FxHashSet;
use serde_json::json;

fn shapes(value: serde_json::Value) -> Vec<Element> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn unlabeled_shapes_pass_through_unchanged() {
    let input = shapes(json!([
        { "id": "a", "type": "rectangle", "x": 0, "y": 0, "width": 10, "height": 10 },
        { "id": "b", "type": "ellipse", "x": 20, "y": 0, "width": 10, "height": 10,
          "label": { "text": "   " } }
    ]));
    let out = materialize_labels(input.clone(), &ClassLabelMap::new());

    assert_eq!(out.len(), 2);
    assert_eq!(out[0], input[0]);
    assert_eq!(out[1].id, "b");
    assert!(out[1].label.is_none());
    assert!(out[1].bound_elements.is_none());
}

#[test]
fn inline_label_is_centered_on_its_owner() {
    let input = shapes(json!([{
        "id": "n1", "type": "rectangle", "x": 100, "y": 50, "width": 200, "height": 80,
        "strokeColor": "#ff0000", "groupIds": ["g1"],
        "label": { "text": " Start ", "fontSize": 20 }
    }]));
    let out = materialize_labels(input, &ClassLabelMap::new());
    assert_eq!(out.len(), 2);

    let (shape, label) = (&out[0], &out[1]);
    let text = label.text_data().unwrap();
    assert_eq!(text.text, "Start");
    assert_eq!(text.original_text, "Start");
    assert_eq!(text.text_align, "center");
    assert_eq!(text.vertical_align, "middle");
    assert_eq!(text.container_id.as_deref(), Some("n1"));
    assert_close(label.width, 5.0 * 20.0 * 0.6);
    assert_close(label.height, 20.0 * 1.25);
    assert_close(label.x, 200.0 - label.width / 2.0);
    assert_close(label.y, 90.0 - label.height / 2.0);
    assert_eq!(label.stroke_color, "#ff0000");
    assert_eq!(label.group_ids, ["g1"]);

    assert!(shape.label.is_none());
    assert_eq!(shape.bound_element_ids().collect::<Vec<_>>(), [label.id.as_str()]);
}

#[test]
fn unknown_kinds_center_labels_on_their_stored_box() {
    let input = shapes(json!([{
        "id": "c1", "type": "circle", "x": 100, "y": 50, "width": 200, "height": 80,
        "label": { "text": "Start", "fontSize": 20 }
    }]));
    let out = materialize_labels(input, &ClassLabelMap::new());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].type_name(), "circle");

    let label = &out[1];
    assert_eq!(label.container_id(), Some("c1"));
    assert_close(label.x + label.width / 2.0, 200.0);
    assert_close(label.y + label.height / 2.0, 90.0);
}

#[test]
fn class_labels_are_left_top_aligned_with_padding() {
    let mut class_labels = ClassLabelMap::new();
    class_labels.insert("Foo", "Foo\n+int x\n+bar()");
    let input = shapes(json!([{
        "id": "Foo", "type": "rectangle", "x": 40, "y": 60, "width": 120, "height": 90
    }]));
    let out = materialize_labels(input, &class_labels);

    let label = &out[1];
    let text = label.text_data().unwrap();
    assert_eq!(text.text, "Foo\n+int x\n+bar()");
    assert_eq!(text.text_align, "left");
    assert_eq!(text.vertical_align, "top");
    assert_eq!(text.font_size, 20.0);
    assert_close(label.x, 48.0);
    assert_close(label.y, 68.0);
    assert_close(label.height, 3.0 * 20.0 * 1.25);
}

#[test]
fn class_id_metadata_resolves_labels() {
    let mut class_labels = ClassLabelMap::new();
    class_labels.insert("Animal", "Animal\n+age");
    let input = shapes(json!([{
        "id": "classId-Animal-0", "type": "rectangle", "x": 0, "y": 0, "width": 50, "height": 50,
        "metadata": { "classId": "Animal" }
    }]));
    let out = materialize_labels(input, &class_labels);
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].text_data().unwrap().text, "Animal\n+age");
    assert_eq!(out[1].container_id(), Some("classId-Animal-0"));
}

#[test]
fn inline_text_wins_over_class_map_but_keeps_class_placement() {
    let mut class_labels = ClassLabelMap::new();
    class_labels.insert("Foo", "Foo\n+x");
    let input = shapes(json!([{
        "id": "Foo", "type": "rectangle", "x": 0, "y": 0, "width": 50, "height": 50,
        "label": { "text": "Renamed", "fontSize": 14 }
    }]));
    let out = materialize_labels(input, &class_labels);
    let text = out[1].text_data().unwrap();
    assert_eq!(text.text, "Renamed");
    assert_eq!(text.font_size, 14.0);
    assert_eq!(text.text_align, "left");
}

#[test]
fn unsized_inline_labels_default_to_sixteen() {
    let input = shapes(json!([{
        "id": "n", "type": "diamond", "x": 0, "y": 0, "width": 50, "height": 50,
        "label": { "text": "ok" }
    }]));
    let out = materialize_labels(input, &ClassLabelMap::new());
    assert_eq!(out[1].text_data().unwrap().font_size, 16.0);
}

#[test]
fn every_label_follows_its_owner_with_unique_ids() {
    let input = shapes(json!([
        { "id": "a", "type": "rectangle", "label": { "text": "A" } },
        { "id": "e", "type": "arrow", "points": [[0, 0], [50, 0]] },
        { "id": "b", "type": "rectangle", "label": { "text": "B" } },
        { "type": "ellipse", "label": { "text": "anonymous" } }
    ]));
    let out = materialize_labels(input, &ClassLabelMap::new());
    assert_eq!(out.len(), 7);

    let ids: FxHashSet<&str> = out.iter().map(|el| el.id.as_str()).collect();
    assert_eq!(ids.len(), out.len());

    for (i, el) in out.iter().enumerate() {
        if let Some(container) = el.container_id() {
            let owner = &out[i - 1];
            assert_eq!(owner.id, container);
            assert!(owner.bound_element_ids().any(|id| id == el.id));
        }
        assert!(el.label.is_none());
    }
    assert!(!out[5].id.is_empty());

    let scene = assemble_scene(out, &OutputParams::default());
    assert!(scene.link_issues().is_empty(), "{:?}", scene.link_issues());
}

struct Sequential(i64);

impl IdSource for Sequential {
    fn next_id(&mut self) -> String {
        self.0 += 1;
        format!("id{}", self.0)
    }

    fn next_nonce(&mut self) -> i64 {
        7
    }

    fn timestamp_ms(&mut self) -> i64 {
        42
    }
}

#[test]
fn id_source_and_existing_bindings_are_respected() {
    let input = shapes(json!([{
        "id": "a", "type": "rectangle", "width": 10, "height": 10,
        "boundElements": [{ "id": "arrow1", "type": "arrow" }],
        "label": { "text": "A" }
    }]));
    let estimator = GeometryEstimator::default();
    let mut ids = Sequential(0);
    let out =
        LabelMaterializer::new(&estimator, &mut ids).materialize(input, &ClassLabelMap::new());

    assert_eq!(out[1].id, "id1");
    assert_eq!(out[1].seed, 7);
    assert_eq!(out[1].updated, 42);
    assert_eq!(
        out[0].bound_element_ids().collect::<Vec<_>>(),
        ["arrow1", "id1"]
    );
}

use super::assert_close;
use crate::*;
use serde_json::json;

const CLASS_TEXT: &str = "classDiagram\nclass Order {\n+id: int\n+total()\n}\n";

fn class_layout() -> PrecomputedLayout {
    PrecomputedLayout::from_json_str(
        &json!({
            "elements": [
                { "id": "Order", "type": "rectangle", "x": 30, "y": 40, "width": 160, "height": 100 }
            ],
            "files": { "f1": { "mimeType": "image/png", "dataURL": "data:image/png;base64," } }
        })
        .to_string(),
    )
    .unwrap()
}

#[test]
fn class_node_gets_its_members_as_a_companion_text() {
    let scene =
        diagram_to_scene(&class_layout(), CLASS_TEXT, None, &OutputParams::default()).unwrap();

    assert_eq!(scene.elements.len(), 2);
    let (shape, label) = (&scene.elements[0], &scene.elements[1]);
    assert_eq!(shape.id, "Order");
    let text = label.text_data().unwrap();
    assert_eq!(text.text, "Order\n+id: int\n+total()");
    assert_eq!(text.text_align, "left");
    assert_close(label.x, 38.0);
    assert_close(label.y, 48.0);
    assert_eq!(label.container_id(), Some("Order"));
    assert!(scene.files.contains_key("f1"));
    assert!(scene.link_issues().is_empty());
}

#[test]
fn layout_receives_merged_config() {
    let layout = |_: &str, cfg: &DiagramConfig| -> std::result::Result<LayoutOutput, LayoutError> {
        assert_eq!(cfg.get_bool("flowchart.htmlLabels"), Some(false));
        assert_eq!(cfg.get_str("theme"), Some("dark"));
        Ok(LayoutOutput::default())
    };
    let config = json!({ "theme": "dark" });
    let scene =
        diagram_to_scene(&layout, "flowchart LR\nA-->B", Some(&config), &OutputParams::default())
            .unwrap();
    assert!(scene.elements.is_empty());
}

fn rejecting_layout(
    _: &str,
    _: &DiagramConfig,
) -> std::result::Result<LayoutOutput, LayoutError> {
    Err(LayoutError::parse("Parse error on line 2: unexpected token"))
}

fn crashing_layout(
    _: &str,
    _: &DiagramConfig,
) -> std::result::Result<LayoutOutput, LayoutError> {
    Err(LayoutError::failed("worker crashed"))
}

#[test]
fn layout_failures_keep_their_class() {
    let params = OutputParams::default();
    let err =
        diagram_to_scene(&rejecting_layout, "classDiagram\nclass", None, &params).unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("unexpected token"));

    let err =
        diagram_to_scene(&crashing_layout, "classDiagram\nclass", None, &params).unwrap_err();
    assert!(!err.is_client_error());
}

#[test]
fn undetectable_text_never_reaches_layout() {
    let layout = |_: &str, _: &DiagramConfig| -> std::result::Result<LayoutOutput, LayoutError> {
        panic!("layout must not run")
    };
    let err =
        diagram_to_scene(&layout, "not a diagram", None, &OutputParams::default()).unwrap_err();
    assert!(matches!(err, Error::DetectType(_)));
}

#[test]
fn direct_scene_without_labels_is_preserved() {
    let elements: Vec<Element> = serde_json::from_value(json!([
        { "id": "a", "type": "rectangle", "x": 0, "y": 0, "width": 10, "height": 10 },
        { "id": "b", "type": "rectangle", "x": 20, "y": 0, "width": 10, "height": 10 }
    ]))
    .unwrap();
    let pipeline = ScenePipeline::new().unwrap();
    let scene =
        pipeline.elements_to_scene(elements.clone(), Default::default(), &OutputParams::default());
    assert_eq!(scene.elements, elements);
    assert_eq!(scene.app_state.view_background_color, "#ffffff");
}

#[test]
fn direct_scene_inline_labels_are_materialized() {
    let elements: Vec<Element> = serde_json::from_value(json!([
        { "id": "a", "type": "rectangle", "width": 10, "height": 10, "label": { "text": "A" } }
    ]))
    .unwrap();
    let scene = ScenePipeline::new()
        .unwrap()
        .elements_to_scene(elements, Default::default(), &OutputParams::default());
    assert_eq!(scene.elements.len(), 2);
    assert_eq!(scene.elements[1].text_data().unwrap().text_align, "center");
}

#[test]
fn bare_element_arrays_are_valid_layout_output() {
    let layout = PrecomputedLayout::from_json_str(r#"[{ "id": "x", "type": "ellipse" }]"#).unwrap();
    let out = layout.layout("", &DiagramConfig::default()).unwrap();
    assert_eq!(out.elements.len(), 1);

    let err = PrecomputedLayout::from_json_str("{").unwrap_err();
    assert!(!err.is_parse());
}

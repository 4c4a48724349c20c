use crate::*;

fn registry() -> DetectorRegistry {
    DetectorRegistry::builtin().unwrap()
}

#[test]
fn detects_common_headers() {
    let reg = registry();
    assert_eq!(reg.detect_type("classDiagram\nclass A").unwrap(), "classDiagram");
    assert_eq!(reg.detect_type("flowchart LR\nA-->B").unwrap(), "flowchart");
    assert_eq!(reg.detect_type("graph TD\nA-->B").unwrap(), "flowchart");
    assert_eq!(reg.detect_type("  sequenceDiagram\nA->>B: hi").unwrap(), "sequence");
    assert_eq!(reg.detect_type("stateDiagram-v2\n[*] --> A").unwrap(), "stateDiagram");
    assert_eq!(reg.detect_type("erDiagram\nA ||--o{ B : has").unwrap(), "er");
}

#[test]
fn front_matter_directives_and_comments_are_skipped() {
    let reg = registry();
    let text = "---\ntitle: Demo\n---\n%%{init: {\"theme\": \"dark\"}}%%\n%% a comment\nclassDiagram\nclass A\n";
    assert_eq!(reg.detect_type(text).unwrap(), "classDiagram");
}

#[test]
fn unknown_text_is_a_client_error() {
    let err = registry().detect_type("hello world").unwrap_err();
    assert!(matches!(err, Error::DetectType(_)));
    assert!(err.is_client_error());
    assert!(err.to_string().contains("No diagram type detected"));
}

#[test]
fn custom_detectors_can_be_registered() {
    let mut reg = DetectorRegistry::new().unwrap();
    assert!(reg.detect_type("classDiagram").is_err());
    reg.add(Detector::new("custom", r"^\s*custom").unwrap());
    assert_eq!(reg.detect_type("custom diagram").unwrap(), "custom");
    assert_eq!(reg.ids().collect::<Vec<_>>(), ["custom"]);
}

#[test]
fn invalid_patterns_are_reported() {
    let err = Detector::new("broken", "(").unwrap_err();
    assert!(matches!(err, Error::Pattern(_)));
    assert!(!err.is_client_error());
}

use crate::*;

#[test]
fn class_block_members_follow_the_name() {
    let map = extract_class_labels("classDiagram\nclass Foo {\n+int x\n}\n");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("Foo"), Some("Foo\n+int x"));
}

#[test]
fn declaration_without_brace_is_the_bare_name() {
    let map = extract_class_labels("classDiagram\n  class Animal\n  class Duck extra tokens\n");
    assert_eq!(map.get("Animal"), Some("Animal"));
    assert_eq!(map.get("Duck"), Some("Duck"));
}

#[test]
fn referenced_nodes_without_declarations_are_absent() {
    let map = extract_class_labels("classDiagram\nclass Foo\nFoo <|-- Bar\n");
    assert!(map.contains("Foo"));
    assert!(!map.contains("Bar"));
    assert_eq!(map.get("Bar"), None);
}

#[test]
fn inline_content_and_closing_line_prefix_are_members() {
    let text = "classDiagram\nclass Account { +id\n  +deposit()\n  +balance }\nclass Other\n";
    let map = extract_class_labels(text);
    assert_eq!(map.get("Account"), Some("Account\n+id\n+deposit()\n+balance"));
    assert_eq!(map.get("Other"), Some("Other"));
}

#[test]
fn single_line_block_does_not_swallow_following_lines() {
    let text = "classDiagram\nclass Point { +x }\nclass Line {\n+start\n}\n";
    let map = extract_class_labels(text);
    assert_eq!(map.get("Point"), Some("Point\n+x"));
    assert_eq!(map.get("Line"), Some("Line\n+start"));
}

#[test]
fn empty_block_degenerates_to_the_name() {
    let map = extract_class_labels("classDiagram\nclass Empty {}\nclass Blank {\n\n}\n");
    assert_eq!(map.get("Empty"), Some("Empty"));
    assert_eq!(map.get("Blank"), Some("Blank"));
}

#[test]
fn unterminated_block_captures_through_end_of_input() {
    let map = extract_class_labels("classDiagram\nclass Open {\n+a\n  +b  \n");
    assert_eq!(map.get("Open"), Some("Open\n+a\n+b"));
}

#[test]
fn later_declaration_wins() {
    let map = extract_class_labels("classDiagram\nclass A {\n+old\n}\nclass A {\n+new\n}\n");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("A"), Some("A\n+new"));
}

#[test]
fn crlf_input_is_handled() {
    let map = extract_class_labels("classDiagram\r\nclass Foo {\r\n+int x\r\n}\r\n");
    assert_eq!(map.get("Foo"), Some("Foo\n+int x"));
}

#[test]
fn non_class_lines_are_ignored() {
    let map = extract_class_labels("classDiagram\nclassDef hot fill:#f00\nnote for Foo \"x\"\n");
    assert!(map.is_empty());
}

#[test]
fn extraction_is_deterministic() {
    let text = "classDiagram\nclass B {\n+b\n}\nclass A\n";
    let first = extract_class_labels(text);
    let second = extract_class_labels(text);
    assert_eq!(first, second);
    let keys: Vec<_> = first.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["B", "A"]);
}

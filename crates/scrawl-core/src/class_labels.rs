//! Recovers class-body labels (`class Name { members }`) from raw diagram text.
//!
//! Layout steps frequently drop member lines from class nodes. This pass rebuilds them from the
//! source text so the materializer can attach them as explicit text.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node identifier to multi-line label text, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabelMap(IndexMap<String, String>);

impl ClassLabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Last write wins; a re-declared class keeps its original position.
    pub fn insert(&mut self, id: impl Into<String>, label: impl Into<String>) {
        self.0.insert(id.into(), label.into());
    }
}

impl FromIterator<(String, String)> for ClassLabelMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

const CLASS_PREFIX: &str = "class ";

/// Scans `text` for `class <name>` declarations and returns their labels.
///
/// - `class Foo` maps `Foo` to `Foo`.
/// - `class Foo {` starts a block; trimmed, non-blank lines up to the first line containing `}`
///   become member lines, and that line's non-blank prefix before `}` is the last member.
/// - `class Foo { +a }` closes on its own line; the inline content is the only member.
/// - A block left open at end of input captures everything up to the end.
///
/// Labels are `name` plus members joined with `\n`. Never fails.
pub fn extract_class_labels(text: &str) -> ClassLabelMap {
    let mut map = ClassLabelMap::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let Some(rest) = line.trim().strip_prefix(CLASS_PREFIX) else {
            continue;
        };
        let rest = rest.trim();

        let Some((head, after)) = rest.split_once('{') else {
            if let Some(name) = rest.split_whitespace().next() {
                map.insert(name, name);
            }
            continue;
        };

        let name = head.trim();
        let mut members: Vec<&str> = Vec::new();

        match after.split_once('}') {
            Some((inline, _)) => push_member(&mut members, inline),
            None => {
                push_member(&mut members, after);
                for body_line in lines.by_ref() {
                    if let Some((tail, _)) = body_line.split_once('}') {
                        push_member(&mut members, tail);
                        break;
                    }
                    push_member(&mut members, body_line);
                }
            }
        }

        if name.is_empty() {
            tracing::debug!("class block without a name ignored");
            continue;
        }

        let label = std::iter::once(name)
            .chain(members)
            .collect::<Vec<_>>()
            .join("\n");
        map.insert(name, label.trim());
    }

    tracing::debug!(classes = map.len(), "extracted class labels");
    map
}

fn push_member<'a>(members: &mut Vec<&'a str>, raw: &'a str) {
    let member = raw.trim();
    if !member.is_empty() {
        members.push(member);
    }
}

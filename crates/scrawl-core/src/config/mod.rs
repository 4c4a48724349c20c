use serde_json::{Map, Value, json};

/// Configuration handed to the layout step: a JSON object read with dotted paths.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramConfig(Value);

impl Default for DiagramConfig {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl DiagramConfig {
    /// Plain SVG text labels instead of HTML labels, so label text survives conversion into
    /// scene elements.
    pub fn layout_defaults() -> Self {
        Self(json!({
            "flowchart": { "htmlLabels": false },
            "class": { "htmlLabels": false },
        }))
    }

    /// [`DiagramConfig::layout_defaults`] with the caller's overrides merged on top.
    ///
    /// Objects merge key by key; any other override value replaces the default.
    pub fn for_layout(overrides: Option<&Value>) -> Self {
        let mut cfg = Self::layout_defaults();
        if let Some(overrides) = overrides {
            merge_into(&mut cfg.0, overrides);
        }
        cfg
    }

    /// The whole configuration, for layout steps that forward it to their engine.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        dotted_path
            .split('.')
            .try_fold(&self.0, |node, key| node.as_object()?.get(key))
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path).and_then(Value::as_bool)
    }
}

fn merge_into(target: &mut Value, overrides: &Value) {
    let (Value::Object(target), Value::Object(overrides)) = (&mut *target, overrides) else {
        *target = overrides.clone();
        return;
    };
    for (key, value) in overrides {
        match target.get_mut(key) {
            Some(slot) => merge_into(slot, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

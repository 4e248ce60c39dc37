//! Open field map produced by scanners

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One resource as a scanner describes it
///
/// The inventory never interprets fields; report writers render them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRecord(Map<String, Value>);

impl ResourceRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Field rendered as plain text for tabular output
    ///
    /// Strings are used as-is, null and missing fields become empty, arrays
    /// are joined with `; ` and anything else is JSON encoded.
    pub fn display_value(&self, name: &str) -> String {
        match self.0.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(value) => render_value(value),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_display_values() {
        let record = ResourceRecord::new()
            .field("Instance ID", "i-0abc")
            .field("vCPUs", 4)
            .field("EBS Optimized", true)
            .field("Security Groups", json!(["sg-1", "sg-2"]))
            .field("Public IP", Value::Null);

        assert_eq!(record.len(), 5);
        assert_eq!(record.display_value("Instance ID"), "i-0abc");
        assert_eq!(record.display_value("vCPUs"), "4");
        assert_eq!(record.display_value("EBS Optimized"), "true");
        assert_eq!(record.display_value("Security Groups"), "sg-1; sg-2");
        assert_eq!(record.display_value("Public IP"), "");
        assert_eq!(record.display_value("Missing"), "");
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let record = ResourceRecord::new().field("Bucket Name", "logs");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json, json!({"Bucket Name": "logs"}));
    }
}

//! Workspace export records
//!
//! Field names follow the export format of the dialog service. Anything we
//! do not model explicitly is kept in `extra` so a fetched record can be
//! pushed back without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `next_step.behavior` value that marks a jump
pub const JUMP_BEHAVIOR: &str = "jump_to";

/// Node types whose label is their title/conditions rather than their type
const PLAIN_NODE_TYPES: &[&str] = &["standard", "frame"];

/// Conditions that always match; such a node must stay last among its siblings
const CATCH_ALL_CONDITIONS: &[&str] = &["true", "anything_else"];

/// A single dialog node as stored in a workspace export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogNode {
    /// Node id, unique within a workspace
    pub dialog_node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Parent node id; `None` means a child of the dialog root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Previous sibling under the same parent; `None` means first child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_sibling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<NextStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digress_in: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digress_out: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digress_out_slots: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Control transfer after a node is evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    pub behavior: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DialogNode {
    /// A bare standard node with no position; mostly useful for fixtures
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            dialog_node: id.into(),
            title: None,
            parent: None,
            previous_sibling: None,
            conditions: None,
            node_type: Some("standard".to_string()),
            next_step: None,
            digress_in: None,
            digress_out: None,
            digress_out_slots: None,
            extra: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn after(mut self, previous_sibling: &str) -> Self {
        self.previous_sibling = Some(previous_sibling.to_string());
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn when(mut self, conditions: &str) -> Self {
        self.conditions = Some(conditions.to_string());
        self
    }

    pub fn of_type(mut self, node_type: &str) -> Self {
        self.node_type = Some(node_type.to_string());
        self
    }

    pub fn jumping_to(mut self, target: &str) -> Self {
        self.next_step = Some(NextStep {
            behavior: JUMP_BEHAVIOR.to_string(),
            dialog_node: Some(target.to_string()),
            selector: Some("body".to_string()),
            extra: Map::new(),
        });
        self
    }

    /// True when the node's conditions always match (`true` / `anything_else`)
    pub fn is_catch_all(&self) -> bool {
        self.conditions
            .as_deref()
            .map(|c| {
                let c = c.trim().to_lowercase();
                CATCH_ALL_CONDITIONS.contains(&c.as_str())
            })
            .unwrap_or(false)
    }

    /// Destination id when this node jumps elsewhere
    pub fn jump_target(&self) -> Option<&str> {
        self.next_step
            .as_ref()
            .filter(|step| step.behavior == JUMP_BEHAVIOR)
            .and_then(|step| step.dialog_node.as_deref())
    }

    /// Human-readable label used by the diagram
    pub fn label(&self) -> String {
        let node_type = self.node_type.as_deref().unwrap_or("standard");
        if !PLAIN_NODE_TYPES.contains(&node_type) {
            return match &self.conditions {
                Some(conditions) => format!("{} - {}", node_type, conditions),
                None => node_type.to_string(),
            };
        }
        self.title
            .clone()
            .or_else(|| self.conditions.clone())
            .unwrap_or_else(|| "no label".to_string())
    }

    /// Drop digression settings that only make sense next to the dialog root
    pub fn clear_digressions(&mut self) {
        self.digress_in = None;
        self.digress_out = None;
        self.digress_out_slots = None;
    }
}

/// A full workspace export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default)]
    pub dialog_nodes: Vec<DialogNode>,
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Intent {
    pub fn new(name: impl Into<String>, examples: &[String]) -> Self {
        Self {
            intent: name.into(),
            description: None,
            examples: examples.iter().map(Example::new).collect(),
            extra: Map::new(),
        }
    }

    pub fn example_texts(&self) -> Vec<String> {
        self.examples.iter().map(|e| e.text.clone()).collect()
    }
}

impl Example {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    #[serde(default)]
    pub values: Vec<EntityValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Value type for synonym-based entity values
pub const SYNONYMS_VALUE_TYPE: &str = "synonyms";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityValue {
    pub value: String,
    #[serde(default = "default_value_type", rename = "type")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_value_type() -> String {
    SYNONYMS_VALUE_TYPE.to_string()
}

impl Entity {
    pub fn new(name: impl Into<String>, values: Vec<EntityValue>) -> Self {
        Self {
            entity: name.into(),
            values,
            extra: Map::new(),
        }
    }

    pub fn value(&self, name: &str) -> Option<&EntityValue> {
        self.values.iter().find(|v| v.value == name)
    }
}

impl EntityValue {
    pub fn new(value: impl Into<String>, synonyms: Vec<String>) -> Self {
        Self {
            value: value.into(),
            value_type: default_value_type(),
            synonyms,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_prefers_title_then_conditions() {
        let node = DialogNode::new("n1").titled("Greeting").when("#hello");
        assert_eq!(node.label(), "Greeting");

        let node = DialogNode::new("n2").when("#hello");
        assert_eq!(node.label(), "#hello");

        assert_eq!(DialogNode::new("n3").label(), "no label");
    }

    #[test]
    fn test_label_for_behavioral_types() {
        let node = DialogNode::new("h1").of_type("event_handler").when("@size");
        assert_eq!(node.label(), "event_handler - @size");

        let node = DialogNode::new("s1").of_type("slot").titled("ignored");
        assert_eq!(node.label(), "slot");

        let node = DialogNode::new("f1").of_type("frame").titled("Order");
        assert_eq!(node.label(), "Order");
    }

    #[test]
    fn test_catch_all_detection() {
        assert!(DialogNode::new("a").when("anything_else").is_catch_all());
        assert!(DialogNode::new("b").when("TRUE").is_catch_all());
        assert!(!DialogNode::new("c").when("#yes").is_catch_all());
        assert!(!DialogNode::new("d").is_catch_all());
    }

    #[test]
    fn test_jump_target_only_for_jump_behavior() {
        let node = DialogNode::new("a").jumping_to("b");
        assert_eq!(node.jump_target(), Some("b"));

        let mut node = DialogNode::new("c");
        node.next_step = Some(NextStep {
            behavior: "skip_user_input".to_string(),
            dialog_node: Some("d".to_string()),
            selector: None,
            extra: Map::new(),
        });
        assert_eq!(node.jump_target(), None);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = r#"{
            "dialog_node": "node_1",
            "title": "Welcome",
            "parent": null,
            "previous_sibling": null,
            "conditions": "welcome",
            "type": "standard",
            "output": {"text": "Hello"},
            "digress_in": "does_not_return"
        }"#;
        let node: DialogNode = serde_json::from_str(raw).unwrap();
        assert_eq!(node.extra.get("output").unwrap()["text"], "Hello");
        assert_eq!(node.digress_in, Some(Value::String("does_not_return".into())));

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["output"]["text"], "Hello");
        assert_eq!(json["type"], "standard");
        assert!(json["parent"].is_null());
    }

    #[test]
    fn test_workspace_defaults_missing_sections() {
        let ws: Workspace = serde_json::from_str(r#"{"name": "empty"}"#).unwrap();
        assert!(ws.dialog_nodes.is_empty());
        assert!(ws.intents.is_empty());
        assert_eq!(ws.name.as_deref(), Some("empty"));
    }

    #[test]
    fn test_entity_value_type_defaults_to_synonyms() {
        let value: EntityValue = serde_json::from_str(r#"{"value": "large"}"#).unwrap();
        assert_eq!(value.value_type, SYNONYMS_VALUE_TYPE);
        assert!(value.synonyms.is_empty());
    }
}

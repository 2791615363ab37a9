//! Validated rich-text node tree.
//!
//! A serialized document is `{"root": {"type": "root", "children": [...]}}`.
//! Every node is an object with a string `type`, an optional `children`
//! array and type-specific fields that renderers read on demand.

use serde_json::{Map, Value};

use super::types::{MAX_TREE_DEPTH, NodePath, RenderError};

#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    node_type: String,
    fields: Map<String, Value>,
    children: Vec<ContentNode>,
    path: NodePath,
}

impl ContentNode {
    /// Parse and structurally validate a whole document.
    pub fn parse_document(document: &Value) -> Result<Self, RenderError> {
        let object = document.as_object().ok_or(RenderError::NotAnObject)?;
        let root = object
            .get("root")
            .filter(|root| !root.is_null())
            .ok_or(RenderError::MissingRoot)?;

        let path = NodePath::root();
        let node = parse_node(root, path.clone(), 1)?;
        if node.node_type != "root" {
            return Err(RenderError::malformed(
                &path,
                format!("expected a `root` node, found `{}`", node.node_type),
            ));
        }
        Ok(node)
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn children(&self) -> &[ContentNode] {
        &self.children
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn str_field(&self, field: &'static str) -> Result<Option<&str>, RenderError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(RenderError::invalid_field(&self.path, field, "a string")),
        }
    }

    pub fn u64_field(&self, field: &'static str) -> Result<Option<u64>, RenderError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                RenderError::invalid_field(&self.path, field, "a non-negative integer")
            }),
        }
    }

    pub fn bool_field(&self, field: &'static str) -> Result<Option<bool>, RenderError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(RenderError::invalid_field(&self.path, field, "a boolean")),
        }
    }

    pub fn object_field(
        &self,
        field: &'static str,
    ) -> Result<Option<&Map<String, Value>>, RenderError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(value)) => Ok(Some(value)),
            Some(_) => Err(RenderError::invalid_field(&self.path, field, "an object")),
        }
    }

    /// Concatenated `text` of this node and its descendants, in document order.
    pub fn collect_text(&self, out: &mut String) {
        if let Some(Value::String(text)) = self.fields.get("text") {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

fn parse_node(value: &Value, path: NodePath, depth: usize) -> Result<ContentNode, RenderError> {
    if depth > MAX_TREE_DEPTH {
        return Err(RenderError::TooDeep {
            path: path.to_string(),
            limit: MAX_TREE_DEPTH,
        });
    }

    let object = value
        .as_object()
        .ok_or_else(|| RenderError::malformed(&path, "node must be an object"))?;

    let node_type = match object.get("type") {
        Some(Value::String(node_type)) if !node_type.is_empty() => node_type.clone(),
        Some(_) => return Err(RenderError::invalid_field(&path, "type", "a non-empty string")),
        None => return Err(RenderError::malformed(&path, "node has no `type`")),
    };

    let children = match object.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, child)| parse_node(child, path.child(index), depth + 1))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(RenderError::invalid_field(&path, "children", "an array")),
    };

    let fields = object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "type" | "children"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(ContentNode {
        node_type,
        fields,
        children,
        path,
    })
}

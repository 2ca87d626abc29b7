use serde::{Deserialize, Serialize};

/// One node of the JSON interchange format.
///
/// Serialized with a `"type"` tag. Empty `attributes`/`children` lists and
/// absent attribute values are omitted, so the rendered form is always
/// sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonNode {
    Element {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attributes: Vec<JsonAttribute>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<JsonNode>,
    },
    Text {
        data: String,
    },
    Comment {
        data: String,
    },
    CData {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<JsonNode>,
    },
    Directive {
        data: String,
    },
}

impl JsonNode {
    pub fn element(name: impl Into<String>) -> Self {
        JsonNode::Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        JsonNode::Text { data: data.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

//! Record schema definitions shared by the generator and the metadata store.
//!
//! A schema is an ordered list of [`SchemaField`]s. The generator receives it
//! serialized as `{"fields": [...]}` and must return objects keyed by the
//! field names.

use serde::{Deserialize, Serialize};

/// A single named field in a record schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub description: String,
}

/// The shape the generator must honor, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub fields: Vec<SchemaField>,
}

impl SchemaDefinition {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, field_type: &str) -> SchemaField {
        SchemaField {
            id: format!("f_{name}"),
            name: name.to_string(),
            field_type: field_type.to_string(),
            required: true,
            description: String::new(),
        }
    }

    #[test]
    fn serializes_type_under_its_wire_name() {
        let schema = SchemaDefinition::new(vec![field("id", "integer")]);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["fields"][0]["type"], "integer");
        assert!(json["fields"][0].get("field_type").is_none());
    }

    #[test]
    fn field_names_keep_declaration_order() {
        let schema = SchemaDefinition::new(vec![
            field("name", "string"),
            field("id", "integer"),
            field("email", "string"),
        ]);
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names, ["name", "id", "email"]);
    }
}

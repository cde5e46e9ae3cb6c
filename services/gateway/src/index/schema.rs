use crate::error::{BackendError, BackendResult};
use crate::model::Document;
use chrono::SecondsFormat;
use tantivy::schema::{Field, Schema, TantivyDocument, Value, STORED, STRING, TEXT};

#[derive(Debug, Clone)]
pub struct IndexSchema {
    pub id: Field,
    pub title: Field,
    pub content: Field,
    pub created_at: Field,
    schema: Schema,
}

impl IndexSchema {
    pub fn new() -> Self {
        let mut schema_builder = Schema::builder();
        let id = schema_builder.add_text_field("id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let content = schema_builder.add_text_field("content", TEXT | STORED);
        let created_at = schema_builder.add_text_field("created_at", STRING | STORED);

        IndexSchema {
            id,
            title,
            content,
            created_at,
            schema: schema_builder.build(),
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema.clone()
    }

    /// Resolves a searchable field by the name used in queries.
    pub fn text_field(&self, name: &str) -> BackendResult<Field> {
        match name {
            "title" => Ok(self.title),
            "content" => Ok(self.content),
            other => Err(BackendError::InternalError(format!(
                "field {} is not searchable",
                other
            ))),
        }
    }

    pub fn to_document(&self, document: &Document) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.id, &document.id);
        doc.add_text(self.title, &document.title);
        doc.add_text(self.content, &document.content);
        doc.add_text(
            self.created_at,
            document.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        );
        doc
    }

    /// Renders a stored document the way a remote engine returns `_source`.
    pub fn to_source(&self, doc: &TantivyDocument) -> serde_json::Value {
        serde_json::json!({
            "id": extract_field_value(doc, self.id),
            "title": extract_field_value(doc, self.title),
            "content": extract_field_value(doc, self.content),
            "created_at": extract_field_value(doc, self.created_at),
        })
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_field_value(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .unwrap_or_default()
}

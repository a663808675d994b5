//! Document types and binding of processed tables to them.

use crate::error::{EngineError, EngineResult};
use crate::header::is_yaml;
use crate::output::OutputTable;
use crate::pipeline::ProcessedTable;
use crate::warning::Warning;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A document type and the output columns it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Column names that must appear in the output, matched exactly.
    pub required_fields: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl DocumentTypeSchema {
    pub fn new(id: &str, name: &str, description: &str, required_fields: &[&str]) -> Self {
        DocumentTypeSchema {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            required_fields: required_fields.iter().map(ToString::to_string).collect(),
            active: true,
        }
    }

    /// Required fields the output does not carry, in declaration order.
    #[must_use]
    pub fn missing_fields(&self, output: &OutputTable) -> Vec<&str> {
        self.required_fields
            .iter()
            .filter(|f| !output.has_column(f))
            .map(String::as_str)
            .collect()
    }
}

/// Required fields given either as a list or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldList {
    List(Vec<String>),
    Csv(String),
}

impl FieldList {
    /// Split into trimmed, non-empty field names.
    #[must_use]
    pub fn into_fields(self) -> Vec<String> {
        let raw = match self {
            FieldList::List(fields) => fields,
            FieldList::Csv(text) => text.split(',').map(String::from).collect(),
        };
        raw.into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

/// User input for a new document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeDefinition {
    /// Derived from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: FieldList,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl DocumentTypeDefinition {
    pub fn new(name: &str, description: &str, fields: FieldList) -> Self {
        DocumentTypeDefinition {
            id: None,
            name: name.to_string(),
            description: description.to_string(),
            fields,
            active: true,
        }
    }

    /// Turn the definition into a schema.
    ///
    /// The id defaults to the lowercased name with spaces replaced by `_`.
    pub fn into_schema(self) -> EngineResult<DocumentTypeSchema> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Config(
                "Document type definition is missing a name".to_string(),
            ));
        }
        let required_fields = self.fields.into_fields();
        if required_fields.is_empty() {
            return Err(EngineError::Config(format!(
                "Document type '{name}' has no fields"
            )));
        }
        let id = self
            .id
            .unwrap_or_else(|| name.to_lowercase().replace(' ', "_"));

        Ok(DocumentTypeSchema {
            id,
            name,
            description: self.description,
            required_fields,
            active: self.active,
        })
    }
}

/// Document types keyed by id, in registration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentTypeRegistry {
    types: IndexMap<String, DocumentTypeSchema>,
}

impl DocumentTypeRegistry {
    /// A registry with no document types.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard trade document types.
    #[must_use]
    pub fn builtin() -> Self {
        const INVOICE_FIELDS: [&str; 4] = [
            "Commercial Invoice Number",
            "Commercial Invoice Date",
            "LC Number",
            "B/L Number",
        ];
        let schemas = [
            DocumentTypeSchema::new(
                "proforma",
                "Pro forma Invoice",
                "Generate proforma invoices",
                &["PI Number", "PI Date"],
            ),
            DocumentTypeSchema::new(
                "lc",
                "LC Document",
                "Letter of Credit processing",
                &["LC Number", "LC Date"],
            ),
            DocumentTypeSchema::new("packing", "Packing List", "Generate packing lists", &INVOICE_FIELDS),
            DocumentTypeSchema::new(
                "commercial",
                "Commercial Invoice",
                "Create commercial invoices",
                &INVOICE_FIELDS,
            ),
            DocumentTypeSchema::new(
                "value",
                "Value Sheet",
                "Generate value sheets",
                &["LC Number", "Bill of Entry Number", "B/E Date"],
            ),
            DocumentTypeSchema::new(
                "loading",
                "Loading List",
                "Create loading lists",
                &[
                    "LC Number",
                    "Loading Date",
                    "Loading Port",
                    "Destination Port",
                    "Container Number",
                    "Total Carton",
                    "Total Weight",
                ],
            ),
        ];

        DocumentTypeRegistry {
            types: schemas.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// Add a schema.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DuplicateDocumentType` if the id is taken.
    pub fn register(&mut self, schema: DocumentTypeSchema) -> EngineResult<()> {
        if self.types.contains_key(&schema.id) {
            return Err(EngineError::DuplicateDocumentType(schema.id));
        }
        debug!(id = %schema.id, fields = schema.required_fields.len(), "document type registered");
        self.types.insert(schema.id.clone(), schema);
        Ok(())
    }

    /// Build a schema from a definition and register it.
    pub fn create(&mut self, definition: DocumentTypeDefinition) -> EngineResult<&DocumentTypeSchema> {
        let schema = definition.into_schema()?;
        let id = schema.id.clone();
        self.register(schema)?;
        self.get(&id)
            .ok_or(EngineError::UnknownDocumentType(id))
    }

    /// Switch a document type on or off.
    pub fn set_active(&mut self, id: &str, active: bool) -> EngineResult<()> {
        let schema = self
            .types
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownDocumentType(id.to_string()))?;
        schema.active = active;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DocumentTypeSchema> {
        self.types.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentTypeSchema> {
        self.types.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Build a registry from a list of definitions.
    pub fn from_definitions(definitions: Vec<DocumentTypeDefinition>) -> EngineResult<Self> {
        let mut registry = Self::empty();
        for definition in definitions {
            registry.create(definition)?;
        }
        Ok(registry)
    }

    /// Parse a JSON list of definitions.
    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        let definitions = serde_json::from_str(content)
            .map_err(|e| EngineError::Config(format!("Invalid document type JSON: {e}")))?;
        Self::from_definitions(definitions)
    }

    /// Parse a YAML list of definitions.
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let definitions = serde_yaml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Invalid document type YAML: {e}")))?;
        Self::from_definitions(definitions)
    }

    /// Load definitions from a file; the file replaces the built-in types.
    pub fn from_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        if is_yaml(path) {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }
}

/// A processed table validated against a document type, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundDocument {
    pub document_type_id: String,
    pub document_type_name: String,
    pub output: OutputTable,
    pub warnings: Vec<Warning>,
    pub created_at: DateTime<Utc>,
}

/// Receives bound documents for storage.
pub trait DocumentSink {
    fn persist(&mut self, document: &BoundDocument) -> EngineResult<()>;
}

impl DocumentSink for Vec<BoundDocument> {
    fn persist(&mut self, document: &BoundDocument) -> EngineResult<()> {
        self.push(document.clone());
        Ok(())
    }
}

/// Writes each bound document as pretty-printed JSON to a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        JsonFileSink { path: path.into() }
    }
}

impl DocumentSink for JsonFileSink {
    fn persist(&mut self, document: &BoundDocument) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| EngineError::Persist(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| {
            EngineError::Persist(format!("Failed to write {}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), id = %document.document_type_id, "document saved");
        Ok(())
    }
}

/// Validates processed tables against the registry.
#[derive(Debug, Clone, Default)]
pub struct DocumentTypeBinder {
    registry: DocumentTypeRegistry,
}

impl DocumentTypeBinder {
    #[must_use]
    pub fn new(registry: DocumentTypeRegistry) -> Self {
        DocumentTypeBinder { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &DocumentTypeRegistry {
        &self.registry
    }

    /// Bind a processed table to a document type.
    ///
    /// Every required field must be an output column, matched exactly and
    /// case-sensitively. Missing columns are never created.
    ///
    /// # Errors
    ///
    /// `UnknownDocumentType`, `InactiveDocumentType`, or
    /// `MissingRequiredField` naming the first absent field.
    pub fn bind(&self, processed: ProcessedTable, document_type_id: &str) -> EngineResult<BoundDocument> {
        let schema = self
            .registry
            .get(document_type_id)
            .ok_or_else(|| EngineError::UnknownDocumentType(document_type_id.to_string()))?;
        if !schema.active {
            return Err(EngineError::InactiveDocumentType(schema.id.clone()));
        }
        if let Some(missing) = schema.missing_fields(&processed.output).first() {
            return Err(EngineError::MissingRequiredField((*missing).to_string()));
        }

        let mut output = processed.output;
        output.document_type_id = Some(schema.id.clone());
        debug!(id = %schema.id, "table bound to document type");

        Ok(BoundDocument {
            document_type_id: schema.id.clone(),
            document_type_name: schema.name.clone(),
            output,
            warnings: processed.warnings,
            created_at: Utc::now(),
        })
    }

    /// Bind, then hand the document to `sink`. A failed bind writes nothing.
    pub fn bind_and_persist(
        &self,
        processed: ProcessedTable,
        document_type_id: &str,
        sink: &mut dyn DocumentSink,
    ) -> EngineResult<BoundDocument> {
        let bound = self.bind(processed, document_type_id)?;
        sink.persist(&bound)?;
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types() {
        let registry = DocumentTypeRegistry::builtin();
        let ids: Vec<&str> = registry.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["proforma", "lc", "packing", "commercial", "value", "loading"]);
        assert_eq!(registry.get("loading").unwrap().required_fields.len(), 7);
    }

    #[test]
    fn test_create_from_csv_fields() {
        let mut registry = DocumentTypeRegistry::builtin();
        let schema = registry
            .create(DocumentTypeDefinition::new(
                "Bill of Lading",
                "Ocean shipments",
                FieldList::Csv("B/L Number, Vessel ,".to_string()),
            ))
            .unwrap();
        assert_eq!(schema.id, "bill_of_lading");
        assert_eq!(schema.required_fields, ["B/L Number", "Vessel"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = DocumentTypeRegistry::builtin();
        let err = registry
            .create(DocumentTypeDefinition::new(
                "LC",
                "again",
                FieldList::List(vec!["LC Number".to_string()]),
            ))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateDocumentType(id) if id == "lc"));
    }

    #[test]
    fn test_registry_from_yaml() {
        let registry = DocumentTypeRegistry::from_yaml_str(
            "- name: Weight Note\n  fields: Gross, Net\n- name: Draft\n  fields: [Amount]\n  active: false\n",
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.get("draft").unwrap().active);
        assert_eq!(registry.get("weight_note").unwrap().required_fields, ["Gross", "Net"]);
    }
}

use indexmap::IndexMap;
use serde_json::Value;

use super::{
  error::{Result, SchemaError},
  merge,
  resolver::RemoteSchemaStore,
  schema::Schema,
};

/// The name → schema mapping under normalization.
///
/// Preserves the insertion order of the source document so error messages
/// and generated output are deterministic. The catalog is only mutated
/// during normalization (`&mut` passes); validation and artifact extraction
/// take it by shared reference.
#[derive(Debug, Default)]
pub struct Catalog {
  schemas: IndexMap<String, Schema>,
  remote: RemoteSchemaStore,
}

impl Catalog {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a catalog from a parsed OpenAPI document.
  ///
  /// # Errors
  ///
  /// Returns [`SchemaError::MalformedSchema`] if the document does not
  /// define `components.schemas` or any schema is not an object.
  pub fn from_document(document: &Value) -> Result<Self> {
    let schemas = document
      .get("components")
      .and_then(|components| components.get("schemas"))
      .and_then(Value::as_object)
      .ok_or_else(|| SchemaError::malformed("The specification does not define components.schemas."))?;

    let mut catalog = Self::new();
    for (name, schema) in schemas {
      let schema = schema
        .as_object()
        .ok_or_else(|| SchemaError::malformed(format!("The schema {name} must be an object.")))?;
      catalog.schemas.insert(name.clone(), schema.clone());
    }
    Ok(catalog)
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&Schema> {
    self.schemas.get(name)
  }

  #[must_use]
  pub fn contains(&self, name: &str) -> bool {
    self.schemas.contains_key(name)
  }

  pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
    self.schemas.insert(name.into(), schema);
  }

  /// Mutable access to a single schema entry.
  pub fn get_mut(&mut self, name: &str) -> Option<&mut Schema> {
    self.schemas.get_mut(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Schema)> {
    self.schemas.iter()
  }

  #[must_use]
  pub fn names(&self) -> Vec<String> {
    self.schemas.keys().cloned().collect()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.schemas.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.schemas.is_empty()
  }

  /// Names of constructable schemas (those with an `x-tablename` after
  /// flattening), in document order.
  #[must_use]
  pub fn constructable_names(&self) -> Vec<String> {
    self
      .schemas
      .iter()
      .filter(|(_, schema)| merge::is_constructable(schema, self))
      .map(|(name, _)| name.clone())
      .collect()
  }

  /// The remote-schema store used to resolve cross-file references.
  #[must_use]
  pub fn remote(&self) -> &RemoteSchemaStore {
    &self.remote
  }

  /// Sets the spec context for remote reference resolution.
  pub fn set_spec_context(&self, path: impl Into<std::path::PathBuf>) {
    self.remote.set_context(path);
  }
}

mod mapping;

pub use mapping::{SqlType, map_sql_type};
use indexmap::IndexMap;
use serde::Serialize;

/// A typed column descriptor handed to the facade by the schema pipeline.
///
/// This is the boundary shape between schema normalization and the
/// SQL-mapping layer: every field has already been resolved, merged and
/// validated, so construction from a descriptor is infallible apart from
/// type mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
  /// The column name as it appears on the table.
  pub name: String,
  /// The OpenAPI `type` value.
  pub type_: String,
  /// The OpenAPI `format` value, if any.
  pub format: Option<String>,
  /// The `maxLength` constraint for string columns.
  pub max_length: Option<u64>,
  /// Whether the column accepts NULL.
  pub nullable: bool,
  /// Whether the column is part of the primary key.
  pub primary_key: bool,
  /// Explicit autoincrement setting for primary keys.
  pub autoincrement: Option<bool>,
  /// Foreign key target in `table.column` form.
  pub foreign_key: Option<String>,
  /// Whether the column stores its value as JSON regardless of `type`.
  pub json: bool,
  /// Server-side default expression.
  pub server_default: Option<String>,
  /// Extra keyword arguments forwarded verbatim to column construction.
  pub kwargs: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ColumnDescriptor {
  #[must_use]
  pub fn new(name: impl Into<String>, type_: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      type_: type_.into(),
      format: None,
      max_length: None,
      nullable: true,
      primary_key: false,
      autoincrement: None,
      foreign_key: None,
      json: false,
      server_default: None,
      kwargs: None,
    }
  }
}

/// A constructed column handle.
///
/// The handle owns its resolved SQL type; emitters read it to render
/// `sqlalchemy.Column(...)` calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
  pub name: String,
  pub sql_type: SqlType,
  pub nullable: bool,
  pub primary_key: bool,
  pub autoincrement: Option<bool>,
  pub foreign_key: Option<String>,
  pub server_default: Option<String>,
  pub kwargs: Option<serde_json::Map<String, serde_json::Value>>,
}

/// The cardinality of a relationship between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum RelationshipKind {
  #[strum(to_string = "one-to-one")]
  OneToOne,
  #[strum(to_string = "one-to-many")]
  OneToMany,
  #[strum(to_string = "many-to-one")]
  ManyToOne,
  #[strum(to_string = "many-to-many")]
  ManyToMany,
}

/// A constructed relationship handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
  pub kind: RelationshipKind,
  /// The referenced model name.
  pub model_name: String,
  /// Back reference to define on the referenced model.
  pub backref: Option<String>,
  /// Whether the link is list-valued; `Some(false)` marks one-to-one.
  pub uselist: Option<bool>,
  /// The association table name for many-to-many relationships.
  pub secondary: Option<String>,
}

/// A table handle: a named, ordered collection of columns plus optional
/// composite index and unique constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
  pub name: String,
  pub columns: Vec<Column>,
  pub composite_index: Option<serde_json::Value>,
  pub composite_unique: Option<serde_json::Value>,
}

impl Table {
  #[must_use]
  pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
    Self {
      name: name.into(),
      columns,
      composite_index: None,
      composite_unique: None,
    }
  }
}

/// Handle for the declarative base all generated models extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeclarativeBase;

impl DeclarativeBase {
  /// The attribute path emitters use to reference the base class.
  #[must_use]
  pub fn qualified_name(&self) -> &'static str {
    "models.Base"
  }
}

#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
  #[error("unsupported type for a column: {type_}")]
  UnsupportedType { type_: String },

  #[error("unsupported format '{format}' for {type_} column")]
  UnsupportedFormat { format: String, type_: String },

  #[error("'{name}' is already registered with a different definition")]
  Conflict { name: String },
}

/// In-memory registry standing in for the SQL-mapping runtime's metadata.
///
/// The pipeline registers tables, association tables and relationships here;
/// emitters walk the registry to produce source text. Registration is
/// idempotent: registering the same name with an identical definition is a
/// no-op, while the same name with a different definition is rejected.
#[derive(Debug, Default)]
pub struct ModelRegistry {
  tables: IndexMap<String, Table>,
  associations: IndexMap<String, Table>,
  relationships: IndexMap<String, Relationship>,
}

impl ModelRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the declarative base handle.
  #[must_use]
  pub fn declarative_base(&self) -> DeclarativeBase {
    DeclarativeBase
  }

  /// Constructs a column handle from a descriptor.
  ///
  /// # Errors
  ///
  /// Returns [`FacadeError`] if the descriptor's type/format pair has no SQL
  /// mapping.
  pub fn create_column(&self, descriptor: &ColumnDescriptor) -> Result<Column, FacadeError> {
    let sql_type = map_sql_type(descriptor)?;
    Ok(Column {
      name: descriptor.name.clone(),
      sql_type,
      nullable: descriptor.nullable,
      primary_key: descriptor.primary_key,
      autoincrement: descriptor.autoincrement,
      foreign_key: descriptor.foreign_key.clone(),
      server_default: descriptor.server_default.clone(),
      kwargs: descriptor.kwargs.clone(),
    })
  }

  /// Registers a relationship under `<model>.<property>`.
  ///
  /// # Errors
  ///
  /// Returns [`FacadeError::Conflict`] if the key is taken by a different
  /// relationship.
  pub fn create_relationship(
    &mut self,
    model: &str,
    property: &str,
    relationship: Relationship,
  ) -> Result<&Relationship, FacadeError> {
    let key = format!("{model}.{property}");
    if let Some(existing) = self.relationships.get(&key) {
      if *existing != relationship {
        return Err(FacadeError::Conflict { name: key });
      }
    } else {
      self.relationships.insert(key.clone(), relationship);
    }
    Ok(&self.relationships[&key])
  }

  /// Registers a model table.
  ///
  /// # Errors
  ///
  /// Returns [`FacadeError::Conflict`] if the name is taken by a different
  /// table.
  pub fn register_table(&mut self, table: Table) -> Result<(), FacadeError> {
    Self::register(&mut self.tables, table)
  }

  /// Registers an association table under `name`.
  ///
  /// # Errors
  ///
  /// Returns [`FacadeError::Conflict`] if the name is taken by a different
  /// table.
  pub fn register_association(&mut self, name: &str, table: Table) -> Result<(), FacadeError> {
    if let Some(existing) = self.associations.get(name) {
      if *existing != table {
        return Err(FacadeError::Conflict { name: name.to_string() });
      }
      return Ok(());
    }
    self.associations.insert(name.to_string(), table);
    Ok(())
  }

  #[must_use]
  pub fn tables(&self) -> &IndexMap<String, Table> {
    &self.tables
  }

  #[must_use]
  pub fn associations(&self) -> &IndexMap<String, Table> {
    &self.associations
  }

  #[must_use]
  pub fn relationships(&self) -> &IndexMap<String, Relationship> {
    &self.relationships
  }

  fn register(store: &mut IndexMap<String, Table>, table: Table) -> Result<(), FacadeError> {
    if let Some(existing) = store.get(&table.name) {
      if *existing != table {
        return Err(FacadeError::Conflict { name: table.name });
      }
      return Ok(());
    }
    store.insert(table.name.clone(), table);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id_column() -> ColumnDescriptor {
    let mut descriptor = ColumnDescriptor::new("id", "integer");
    descriptor.primary_key = true;
    descriptor.nullable = false;
    descriptor
  }

  #[test]
  fn create_column_maps_descriptor_fields() {
    let registry = ModelRegistry::new();
    let column = registry.create_column(&id_column()).unwrap();
    assert_eq!(column.name, "id");
    assert_eq!(column.sql_type, SqlType::Integer);
    assert!(column.primary_key);
    assert!(!column.nullable);
  }

  #[test]
  fn register_association_identical_is_noop() {
    let mut registry = ModelRegistry::new();
    let column = registry.create_column(&id_column()).unwrap();
    let table = Table::new("employee_project", vec![column]);
    registry.register_association("employee_project", table.clone()).unwrap();
    registry.register_association("employee_project", table).unwrap();
    assert_eq!(registry.associations().len(), 1);
  }

  #[test]
  fn register_association_conflict_is_rejected() {
    let mut registry = ModelRegistry::new();
    let column = registry.create_column(&id_column()).unwrap();
    let table = Table::new("employee_project", vec![column.clone()]);
    let other = Table::new("employee_project", vec![column.clone(), column]);
    registry.register_association("employee_project", table).unwrap();
    let error = registry.register_association("employee_project", other).unwrap_err();
    assert!(matches!(error, FacadeError::Conflict { .. }));
  }

  #[test]
  fn duplicate_relationship_is_noop() {
    let mut registry = ModelRegistry::new();
    let relationship = Relationship {
      kind: RelationshipKind::ManyToOne,
      model_name: "Division".to_string(),
      backref: None,
      uselist: None,
      secondary: None,
    };
    registry
      .create_relationship("Employee", "division", relationship.clone())
      .unwrap();
    registry.create_relationship("Employee", "division", relationship).unwrap();
    assert_eq!(registry.relationships().len(), 1);
  }
}

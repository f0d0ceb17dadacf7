//! Orchestration for the OpenAPI to SQLAlchemy model lowering pipeline.
//!
//! The `Orchestrator` owns the catalog and the facade registry for one run.
//! `normalize` runs the whole pipeline to completion: reference cycle
//! scanning, relationship lowering with foreign-key placement and
//! association synthesis, then table construction. Validation verdicts and
//! model artifacts are derived views over the frozen result.

use std::path::Path;

use indexmap::IndexMap;
use oas3_sqlgen_support::{Column, ModelRegistry, Relationship, RelationshipKind, Table};
use serde_json::Value;

use super::{
  artifacts::{self, ModelsDocument},
  association,
  catalog::Catalog,
  error::{Result, SchemaError},
  foreign_key, graph, inheritance, merge, peek,
  relationship::{self, ClassifiedProperty},
  schema::Schema,
  stats::{NormalizationStats, NormalizationWarning},
  validation::{self, ModelVerdict},
};

#[derive(Debug)]
pub struct Orchestrator {
  catalog: Catalog,
  registry: ModelRegistry,
  stats: NormalizationStats,
  associations: Vec<String>,
  normalized: bool,
}

impl Orchestrator {
  /// Creates an orchestrator from a parsed OpenAPI document.
  ///
  /// # Errors
  ///
  /// Returns [`SchemaError::MalformedSchema`] if the document does not
  /// define `components.schemas`.
  pub fn new(document: &Value) -> Result<Self> {
    Ok(Self {
      catalog: Catalog::from_document(document)?,
      registry: ModelRegistry::new(),
      stats: NormalizationStats::default(),
      associations: Vec::new(),
      normalized: false,
    })
  }

  /// Creates an orchestrator and sets the spec context used to resolve
  /// remote references relative to the document's location.
  pub fn with_spec_context(document: &Value, spec_path: &Path) -> Result<Self> {
    let orchestrator = Self::new(document)?;
    orchestrator.catalog.set_spec_context(spec_path);
    Ok(orchestrator)
  }

  #[must_use]
  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  #[must_use]
  pub fn registry(&self) -> &ModelRegistry {
    &self.registry
  }

  #[must_use]
  pub fn stats(&self) -> &NormalizationStats {
    &self.stats
  }

  /// Names of catalog entries synthesized for association tables.
  #[must_use]
  pub fn associations(&self) -> &[String] {
    &self.associations
  }

  /// Runs the normalization pipeline to completion.
  ///
  /// Safe to call more than once: the pipeline's mutations are idempotent
  /// and repeat runs are no-ops.
  pub fn normalize(&mut self) -> Result<()> {
    if self.normalized {
      return Ok(());
    }

    self.scan_reference_cycles();
    self.record_unmanaged();
    let constructable = self.catalog.constructable_names();
    self.lower_relationships(&constructable)?;
    self.build_tables()?;

    self.normalized = true;
    Ok(())
  }

  /// Validation verdicts for the failing schemas.
  #[must_use]
  pub fn check(&self) -> IndexMap<String, ModelVerdict> {
    validation::check_models(&self.catalog)
  }

  /// The versioned artifact document for the emitter.
  ///
  /// Association tables are tables, not models, and are excluded.
  pub fn models_document(&self) -> Result<ModelsDocument> {
    artifacts::extract_models(&self.catalog, &self.associations)
  }

  fn scan_reference_cycles(&mut self) {
    for cycle in graph::reference_cycles(&self.catalog) {
      self.stats.record_warning(NormalizationWarning::ReferenceCycle {
        path: cycle.join(" -> "),
      });
      self.stats.record_cycle(cycle);
    }
  }

  /// Records a warning for every named schema that cannot be managed.
  fn record_unmanaged(&mut self) {
    let constructable = self.catalog.constructable_names();
    let unmanaged: Vec<(String, String)> = self
      .catalog
      .iter()
      .filter(|(name, _)| !constructable.contains(name))
      .filter_map(|(name, schema)| {
        validation::check_model(schema, &self.catalog)
          .reason
          .map(|reason| (name.clone(), reason))
      })
      .collect();

    for (schema_name, reason) in unmanaged {
      self
        .stats
        .record_warning(NormalizationWarning::UnmanagedSchema { schema_name, reason });
    }
  }

  /// Classifies every property of every constructable schema and lowers
  /// relationships: foreign keys are placed on the correct side and
  /// many-to-many associations are synthesized into the catalog.
  fn lower_relationships(&mut self, constructable: &[String]) -> Result<()> {
    for name in constructable {
      let Some(schema) = self.catalog.get(name).cloned() else {
        continue;
      };
      let (_, merged) = merge::prepare(name, &schema, &self.catalog)?;
      let required = required_names(&merged);
      let Some(Value::Object(properties)) = merged.get("properties").cloned() else {
        continue;
      };

      for (property_name, property) in &properties {
        let ClassifiedProperty::Relationship(artifact) = relationship::classify(property_name, property, &self.catalog)?
        else {
          continue;
        };
        let property_required = required.contains(property_name);

        match artifact.kind {
          RelationshipKind::ManyToOne | RelationshipKind::OneToOne => {
            if let Some(fk_column) = &artifact.fk_column {
              foreign_key::place_for_object_ref(
                &mut self.catalog,
                name,
                property_name,
                &artifact.model_name,
                fk_column,
                property_required,
              )?;
              self.stats.record_foreign_key();
            }
          }
          RelationshipKind::OneToMany => {
            foreign_key::place_for_array_ref(&mut self.catalog, name, &artifact.model_name, property_required)?;
            self.stats.record_foreign_key();
          }
          RelationshipKind::ManyToMany => {
            if let Some(secondary) = &artifact.secondary {
              let table_name =
                association::synthesize(&mut self.catalog, &mut self.registry, name, &artifact.model_name, secondary)?;
              if !self.associations.contains(&table_name) {
                self.associations.push(table_name);
              }
              self.stats.record_association();
            }
          }
        }

        self.registry.create_relationship(
          name,
          property_name,
          Relationship {
            kind: artifact.kind,
            model_name: artifact.model_name.clone(),
            backref: artifact.backref.clone(),
            uselist: artifact.uselist,
            secondary: artifact.secondary.clone(),
          },
        )?;
        self.stats.record_relationship(artifact.kind);
      }
    }
    Ok(())
  }

  /// Builds and registers one table per tablename.
  ///
  /// Schemas sharing a tablename (single-table inheritance) contribute to
  /// the same table; a child's inherited columns re-add identically and
  /// its local columns extend the set.
  fn build_tables(&mut self) -> Result<()> {
    let mut tables: IndexMap<String, IndexMap<String, Column>> = IndexMap::new();
    let mut constraints: IndexMap<String, (Option<Value>, Option<Value>)> = IndexMap::new();

    for name in self.catalog.constructable_names() {
      if self.associations.contains(&name) {
        continue;
      }
      let Some(schema) = self.catalog.get(&name).cloned() else {
        continue;
      };

      // Enforces the single-table/joined-table declaration rules. Children
      // contribute to their table through the shared tablename below.
      inheritance::classify(&name, &schema, &self.catalog)?;
      self.stats.record_model();

      let (_, merged) = merge::prepare(&name, &schema, &self.catalog)?;
      let Some(tablename) = peek::tablename(&merged, &self.catalog)? else {
        continue;
      };
      let required = required_names(&merged);

      let table_constraints = constraints.entry(tablename.clone()).or_default();
      if let Some(index) = peek::composite_index(&merged, &self.catalog)? {
        table_constraints.0.get_or_insert(index);
      }
      if let Some(unique) = peek::composite_unique(&merged, &self.catalog)? {
        table_constraints.1.get_or_insert(unique);
      }

      let columns = tables.entry(tablename.clone()).or_default();
      let Some(Value::Object(properties)) = merged.get("properties") else {
        continue;
      };
      for (property_name, property) in properties {
        if !matches!(
          relationship::classify(property_name, property, &self.catalog)?,
          ClassifiedProperty::Column
        ) {
          continue;
        }
        let descriptor = self.column_descriptor(property_name, property, &required)?;
        let column = self.registry.create_column(&descriptor)?;
        if let Some(existing) = columns.get(property_name) {
          if *existing != column {
            return Err(SchemaError::malformed(format!(
              "The table {tablename} defines the column {property_name} more than once with \
               different definitions."
            )));
          }
          continue;
        }
        columns.insert(property_name.clone(), column);
        self.stats.record_column();
      }
    }

    for (tablename, columns) in tables {
      let (composite_index, composite_unique) = constraints.shift_remove(&tablename).unwrap_or_default();
      let mut table = Table::new(tablename, columns.into_values().collect());
      table.composite_index = composite_index;
      table.composite_unique = composite_unique;
      self.registry.register_table(table)?;
    }
    Ok(())
  }

  fn column_descriptor(
    &self,
    property_name: &str,
    property: &Value,
    required: &[String],
  ) -> Result<oas3_sqlgen_support::ColumnDescriptor> {
    let property_schema = property.as_object().ok_or_else(|| {
      SchemaError::malformed(format!("The property {property_name} must be an object schema."))
    })?;
    let (_, merged) = merge::prepare("", property_schema, &self.catalog)?;

    let json = peek::json(&merged, &self.catalog)?.unwrap_or(false);
    let primary_key = peek::primary_key(&merged, &self.catalog)?.unwrap_or(false);
    let property_required = required.contains(&property_name.to_string());
    let nullable = match peek::nullable(&merged, &self.catalog)? {
      Some(explicit) => explicit,
      None => !primary_key && !property_required,
    };

    let mut descriptor =
      oas3_sqlgen_support::ColumnDescriptor::new(property_name, peek::type_(&merged, &self.catalog)?);
    descriptor.format = peek::format(&merged, &self.catalog)?;
    descriptor.max_length = peek::max_length(&merged, &self.catalog)?;
    descriptor.nullable = nullable;
    descriptor.primary_key = primary_key;
    descriptor.autoincrement = peek::autoincrement(&merged, &self.catalog)?;
    descriptor.foreign_key = peek::foreign_key(&merged, &self.catalog)?;
    descriptor.json = json;
    descriptor.server_default = peek::server_default(&merged, &self.catalog)?;
    descriptor.kwargs = peek::kwargs(&merged, &self.catalog)?;
    Ok(descriptor)
  }
}

fn required_names(merged: &Schema) -> Vec<String> {
  merged
    .get("required")
    .and_then(Value::as_array)
    .map(|names| names.iter().filter_map(Value::as_str).map(String::from).collect())
    .unwrap_or_default()
}

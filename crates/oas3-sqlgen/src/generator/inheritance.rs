use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  foreign_key, merge, peek, resolver,
  schema::Schema,
};

/// How a constructable schema relates to a parent model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inheritance {
  /// No parent reference through `allOf`.
  None,
  /// Child mapped onto the parent's table; inherits the primary key.
  SingleTable { parent: String },
  /// Child with its own table joined to the parent through a foreign key.
  JoinedTable { parent: String },
}

impl Inheritance {
  #[must_use]
  pub fn parent(&self) -> Option<&str> {
    match self {
      Self::None => None,
      Self::SingleTable { parent } | Self::JoinedTable { parent } => Some(parent),
    }
  }
}

/// Classifies a constructable schema's inheritance.
///
/// A schema participates in inheritance when `x-inherits` is `true` or
/// names a parent; the parent must be a constructable schema referenced
/// through `allOf`. Single-table children share the parent's tablename and
/// must not redeclare its primary key; joined-table children declare their
/// own tablename and must declare a foreign-key column referencing the
/// parent's primary key.
pub fn classify(name: &str, schema: &Schema, catalog: &Catalog) -> Result<Inheritance> {
  let inherits = peek::prefer_local(peek::inherits, schema, catalog)?;
  let parent = match inherits {
    None | Some(Value::Bool(false)) => return Ok(Inheritance::None),
    Some(Value::Bool(true)) => first_constructable_parent(schema, catalog)?.ok_or_else(|| {
      SchemaError::malformed(format!(
        "The schema {name} sets x-inherits but does not reference a constructable parent through allOf."
      ))
    })?,
    Some(Value::String(parent_name)) => {
      let candidates = parent_candidates(schema, catalog)?;
      if !candidates.contains(&parent_name) {
        return Err(SchemaError::malformed(format!(
          "The x-inherits value {parent_name} of the schema {name} does not match any constructable \
           allOf reference."
        )));
      }
      parent_name
    }
    Some(_) => unreachable!("peek::inherits only returns booleans and strings"),
  };

  let (_, merged) = merge::prepare(name, schema, catalog)?;
  let child_tablename = peek::tablename(&merged, catalog)?.ok_or_else(|| {
    SchemaError::malformed(format!("The schema {name} must set the x-tablename property."))
  })?;

  let parent_schema = catalog
    .get(&parent)
    .cloned()
    .ok_or_else(|| SchemaError::not_found(format!("{parent} was not found in schemas.")))?;
  let (_, parent_merged) = merge::prepare(&parent, &parent_schema, catalog)?;
  let parent_tablename = peek::tablename(&parent_merged, catalog)?.ok_or_else(|| {
    SchemaError::malformed(format!("The schema {parent} must set the x-tablename property."))
  })?;

  if child_tablename == parent_tablename {
    check_single_table(name, schema, catalog)?;
    Ok(Inheritance::SingleTable { parent })
  } else {
    check_joined_table(name, schema, &parent_merged, &parent, catalog)?;
    Ok(Inheritance::JoinedTable { parent })
  }
}

/// Constructable schema names referenced through the schema's `allOf`.
fn parent_candidates(schema: &Schema, catalog: &Catalog) -> Result<Vec<String>> {
  let Some(Value::Array(children)) = schema.get("allOf") else {
    return Ok(Vec::new());
  };

  let mut candidates = Vec::new();
  for child in children {
    let Some(child_schema) = child.as_object() else {
      continue;
    };
    if !child_schema.contains_key("$ref") {
      continue;
    }
    let (candidate_name, candidate) = resolver::resolve("", child_schema, catalog)?;
    if merge::is_constructable(&candidate, catalog) {
      candidates.push(candidate_name);
    }
  }
  Ok(candidates)
}

fn first_constructable_parent(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  Ok(parent_candidates(schema, catalog)?.into_iter().next())
}

/// Single-table children must not redeclare the inherited primary key.
fn check_single_table(name: &str, schema: &Schema, catalog: &Catalog) -> Result<()> {
  for (property_name, property) in local_properties(schema) {
    if peek::primary_key(&property, catalog)?.unwrap_or(false) {
      return Err(SchemaError::malformed(format!(
        "The single-table child schema {name} redeclares the primary key {property_name} inherited \
         from its parent."
      )));
    }
  }
  Ok(())
}

/// Joined-table children must declare a foreign-key column referencing the
/// parent's primary key.
fn check_joined_table(
  name: &str,
  schema: &Schema,
  parent_merged: &Schema,
  parent: &str,
  catalog: &Catalog,
) -> Result<()> {
  let parent_tablename = peek::tablename(parent_merged, catalog)?.unwrap_or_default();
  let Some((parent_pk, _)) = foreign_key::primary_key_property(parent_merged, catalog)? else {
    return Err(SchemaError::malformed(format!(
      "The schema {parent} must define a primary key to be inherited from."
    )));
  };
  let expected = format!("{parent_tablename}.{parent_pk}");

  for (_, property) in local_properties(schema) {
    if peek::foreign_key(&property, catalog)?.as_deref() == Some(expected.as_str()) {
      return Ok(());
    }
  }

  Err(SchemaError::malformed(format!(
    "The joined-table child schema {name} must declare a foreign key column referencing {expected}."
  )))
}

/// Properties declared on the schema itself or its inline `allOf` children,
/// in declaration order. `$ref` children are inherited and skipped.
fn local_properties(schema: &Schema) -> Vec<(String, Schema)> {
  let mut found = Vec::new();

  if let Some(Value::Object(properties)) = schema.get("properties") {
    for (name, property) in properties {
      if let Some(property_schema) = property.as_object() {
        found.push((name.clone(), property_schema.clone()));
      }
    }
  }

  if let Some(Value::Array(children)) = schema.get("allOf") {
    for child in children {
      let Some(child_schema) = child.as_object() else {
        continue;
      };
      if child_schema.contains_key("$ref") {
        continue;
      }
      found.extend(local_properties(child_schema));
    }
  }

  found
}

use oas3_sqlgen_support::RelationshipKind;
use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  foreign_key, merge, peek, resolver,
  schema::Schema,
};

/// The lowered description of a relationship property.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipArtifact {
  pub kind: RelationshipKind,
  /// The referenced model's schema name.
  pub model_name: String,
  pub backref: Option<String>,
  pub uselist: Option<bool>,
  /// The association tablename for many-to-many relationships.
  pub secondary: Option<String>,
  /// The referenced column for to-one relationships: the target's primary
  /// key or the `x-foreign-key-column` override.
  pub fk_column: Option<String>,
}

/// What a property lowers to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedProperty {
  /// A plain column (primitive type or `x-json` value).
  Column,
  /// A reference to another model.
  Relationship(RelationshipArtifact),
}

/// Classifies a property after `$ref` resolution and `allOf` flattening.
///
/// A property is a relationship exactly when it resolves to an object type
/// with `x-tablename`, or to an array whose items do. `x-json` objects stay
/// columns.
pub fn classify(property_name: &str, property: &Value, catalog: &Catalog) -> Result<ClassifiedProperty> {
  let property_schema = property.as_object().ok_or_else(|| {
    SchemaError::malformed(format!("The property {property_name} must be an object schema."))
  })?;
  let (_, merged) = merge::prepare("", property_schema, catalog)?;

  if peek::json(&merged, catalog)?.unwrap_or(false) {
    return Ok(ClassifiedProperty::Column);
  }

  let type_ = peek::type_(&merged, catalog)?;
  match type_.as_str() {
    "integer" | "number" | "string" | "boolean" => Ok(ClassifiedProperty::Column),
    "object" => classify_object(property_name, property_schema, &merged, catalog),
    "array" => classify_array(property_name, &merged, catalog),
    other => Err(SchemaError::malformed(format!(
      "The type {other} of the property {property_name} is not supported."
    ))),
  }
}

/// The schema name a property refers to, through a direct `$ref` or a
/// single `$ref` child inside `allOf`. Follows the `$ref` chain to its
/// final name.
pub(crate) fn referenced_model_name(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  if schema.contains_key("$ref") {
    let (name, _) = resolver::resolve("", schema, catalog)?;
    return Ok(Some(name));
  }

  let Some(Value::Array(children)) = schema.get("allOf") else {
    return Ok(None);
  };

  let mut found: Option<String> = None;
  for child in children {
    let Some(child_schema) = child.as_object() else {
      continue;
    };
    if !child_schema.contains_key("$ref") {
      continue;
    }
    if found.is_some() {
      return Err(SchemaError::malformed(
        "A relationship property may contain at most one reference to another schema.",
      ));
    }
    let (name, _) = resolver::resolve("", child_schema, catalog)?;
    found = Some(name);
  }
  Ok(found)
}

/// To-one reference: many-to-one by default, one-to-one when the property
/// disables `x-uselist`.
fn classify_object(
  property_name: &str,
  property_schema: &Schema,
  merged: &Schema,
  catalog: &Catalog,
) -> Result<ClassifiedProperty> {
  if peek::tablename(merged, catalog)?.is_none() {
    return Err(SchemaError::malformed(format!(
      "The object property {property_name} must reference a schema with x-tablename set."
    )));
  }
  let model_name = referenced_model_name(property_schema, catalog)?.ok_or_else(|| {
    SchemaError::malformed(format!(
      "The object property {property_name} must reference another schema."
    ))
  })?;

  let local_uselist = peek::local(peek::uselist, property_schema, catalog)?;
  let target_uselist = target_uselist(&model_name, catalog)?;
  if let (Some(local), Some(target)) = (local_uselist, target_uselist)
    && local != target
  {
    return Err(SchemaError::malformed(format!(
      "The two ends of the relationship defined by the property {property_name} declare conflicting \
       x-uselist values."
    )));
  }

  let uselist = local_uselist.or(target_uselist);
  let kind = if uselist == Some(false) {
    RelationshipKind::OneToOne
  } else {
    RelationshipKind::ManyToOne
  };

  Ok(ClassifiedProperty::Relationship(RelationshipArtifact {
    kind,
    backref: peek::prefer_local(peek::backref, merged, catalog)?,
    uselist,
    secondary: None,
    fk_column: Some(fk_column(property_name, merged, &model_name, catalog)?),
    model_name,
  }))
}

/// To-many reference: one-to-many without `x-secondary`, many-to-many with
/// it.
fn classify_array(property_name: &str, merged: &Schema, catalog: &Catalog) -> Result<ClassifiedProperty> {
  if peek::prefer_local(peek::uselist, merged, catalog)? == Some(false) {
    return Err(SchemaError::malformed(format!(
      "The array property {property_name} cannot set x-uselist to false."
    )));
  }

  let items = merged.get("items").and_then(Value::as_object).ok_or_else(|| {
    SchemaError::malformed(format!("The array property {property_name} must define object items."))
  })?;
  let (_, item_merged) = merge::prepare("", items, catalog)?;

  let item_type = peek::type_(&item_merged, catalog)?;
  if item_type != "object" || peek::tablename(&item_merged, catalog)?.is_none() {
    return Err(SchemaError::malformed(format!(
      "The items of the array property {property_name} must be an object schema with x-tablename set."
    )));
  }
  let model_name = referenced_model_name(items, catalog)?.ok_or_else(|| {
    SchemaError::malformed(format!(
      "The items of the array property {property_name} must reference another schema."
    ))
  })?;

  let backref = match peek::prefer_local(peek::backref, merged, catalog)? {
    Some(value) => Some(value),
    None => peek::backref(&item_merged, catalog)?,
  };
  let secondary = peek::prefer_local(peek::secondary, merged, catalog)?;

  let kind = if secondary.is_some() {
    RelationshipKind::ManyToMany
  } else {
    RelationshipKind::OneToMany
  };

  Ok(ClassifiedProperty::Relationship(RelationshipArtifact {
    kind,
    model_name,
    backref,
    uselist: None,
    secondary,
    fk_column: None,
  }))
}

/// The column a to-one foreign key points at.
fn fk_column(property_name: &str, merged: &Schema, target_name: &str, catalog: &Catalog) -> Result<String> {
  if let Some(column) = peek::prefer_local(peek::foreign_key_column, merged, catalog)? {
    return Ok(column);
  }

  let target = catalog
    .get(target_name)
    .cloned()
    .ok_or_else(|| SchemaError::not_found(format!("{target_name} was not found in schemas.")))?;
  let (_, target_merged) = merge::prepare(target_name, &target, catalog)?;
  match foreign_key::primary_key_property(&target_merged, catalog)? {
    Some((pk_name, _)) => Ok(pk_name),
    None => Err(SchemaError::malformed(format!(
      "The schema {target_name} referenced by the property {property_name} must define a primary key."
    ))),
  }
}

/// The `x-uselist` declared on the referenced schema itself.
fn target_uselist(target_name: &str, catalog: &Catalog) -> Result<Option<bool>> {
  let Some(target) = catalog.get(target_name) else {
    return Ok(None);
  };
  peek::local(peek::uselist, target, catalog)
}

//! Side-effect-free schema readers.
//!
//! Each reader returns the property's value if present on the schema and
//! otherwise follows at most one `$ref` before giving up. None of the
//! readers flatten `allOf`; [`prefer_local`] layers local-first traversal on
//! top of any reader.

use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  resolver,
  schema::Schema,
};

/// Reads a key from the schema, traversing a single `$ref` if needed.
fn peek_key(schema: &Schema, key: &str, catalog: &Catalog) -> Result<Option<Value>> {
  if let Some(value) = schema.get(key) {
    return Ok(Some(value.clone()));
  }
  if let Some(ref_value) = schema.get("$ref") {
    let reference = ref_value
      .as_str()
      .ok_or_else(|| SchemaError::malformed("The value of $ref must ba a string."))?;
    let (_, target) = resolver::get_ref(reference, catalog)?;
    return Ok(target.get(key).cloned());
  }
  Ok(None)
}

fn string_key(schema: &Schema, key: &str, catalog: &Catalog) -> Result<Option<String>> {
  match peek_key(schema, key, catalog)? {
    None => Ok(None),
    Some(Value::String(value)) => Ok(Some(value)),
    Some(_) => Err(SchemaError::malformed(format!(
      "The {key} property must be of type string."
    ))),
  }
}

fn bool_key(schema: &Schema, key: &str, catalog: &Catalog) -> Result<Option<bool>> {
  match peek_key(schema, key, catalog)? {
    None => Ok(None),
    Some(Value::Bool(value)) => Ok(Some(value)),
    Some(_) => Err(SchemaError::malformed(format!(
      "The {key} property must be of type boolean."
    ))),
  }
}

/// The `type` of a schema.
///
/// # Errors
///
/// Returns [`SchemaError::TypeMissing`] when the schema defines no type and
/// [`SchemaError::MalformedSchema`] when the value is not a string.
pub fn type_(schema: &Schema, catalog: &Catalog) -> Result<String> {
  match peek_key(schema, "type", catalog)? {
    None => Err(SchemaError::TypeMissing("Every schema must have a type.".to_string())),
    Some(Value::String(value)) => Ok(value),
    Some(_) => Err(SchemaError::malformed("The type property must be of type string.")),
  }
}

pub fn format(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "format", catalog)
}

pub fn nullable(schema: &Schema, catalog: &Catalog) -> Result<Option<bool>> {
  bool_key(schema, "nullable", catalog)
}

pub fn description(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "description", catalog)
}

pub fn primary_key(schema: &Schema, catalog: &Catalog) -> Result<Option<bool>> {
  bool_key(schema, "x-primary-key", catalog)
}

pub fn autoincrement(schema: &Schema, catalog: &Catalog) -> Result<Option<bool>> {
  bool_key(schema, "x-autoincrement", catalog)
}

pub fn tablename(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "x-tablename", catalog)
}

pub fn foreign_key(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "x-foreign-key", catalog)
}

pub fn foreign_key_column(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "x-foreign-key-column", catalog)
}

pub fn secondary(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "x-secondary", catalog)
}

pub fn backref(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "x-backref", catalog)
}

pub fn uselist(schema: &Schema, catalog: &Catalog) -> Result<Option<bool>> {
  bool_key(schema, "x-uselist", catalog)
}

pub fn json(schema: &Schema, catalog: &Catalog) -> Result<Option<bool>> {
  bool_key(schema, "x-json", catalog)
}

pub fn server_default(schema: &Schema, catalog: &Catalog) -> Result<Option<String>> {
  string_key(schema, "x-server-default", catalog)
}

/// The `x-inherits` value: `true`/`false` or the parent schema name.
pub fn inherits(schema: &Schema, catalog: &Catalog) -> Result<Option<Value>> {
  match peek_key(schema, "x-inherits", catalog)? {
    None => Ok(None),
    Some(value @ (Value::Bool(_) | Value::String(_))) => Ok(Some(value)),
    Some(_) => Err(SchemaError::malformed(
      "The x-inherits property must be of type boolean or string.",
    )),
  }
}

pub fn max_length(schema: &Schema, catalog: &Catalog) -> Result<Option<u64>> {
  match peek_key(schema, "maxLength", catalog)? {
    None => Ok(None),
    Some(Value::Number(value)) if value.as_u64().is_some() => Ok(value.as_u64()),
    Some(_) => Err(SchemaError::malformed(
      "The maxLength property must be a positive integer.",
    )),
  }
}

/// The table-level composite index definition.
pub fn composite_index(schema: &Schema, catalog: &Catalog) -> Result<Option<Value>> {
  array_key(schema, "x-composite-index", catalog)
}

/// The table-level composite unique-constraint definition.
pub fn composite_unique(schema: &Schema, catalog: &Catalog) -> Result<Option<Value>> {
  array_key(schema, "x-composite-unique", catalog)
}

fn array_key(schema: &Schema, key: &str, catalog: &Catalog) -> Result<Option<Value>> {
  match peek_key(schema, key, catalog)? {
    None => Ok(None),
    Some(value @ Value::Array(_)) => Ok(Some(value)),
    Some(_) => Err(SchemaError::malformed(format!(
      "The {key} property must be of type array."
    ))),
  }
}

/// Extra keyword arguments forwarded to column construction.
pub fn kwargs(schema: &Schema, catalog: &Catalog) -> Result<Option<Schema>> {
  match peek_key(schema, "x-kwargs", catalog)? {
    None => Ok(None),
    Some(Value::Object(value)) => Ok(Some(value)),
    Some(_) => Err(SchemaError::malformed("The x-kwargs property must be of type object.")),
  }
}

/// Returns the first value the reader finds along the local traversal,
/// ignoring inherited `allOf` children, falling back to the plain reader.
///
/// Local means: the schema's own keys first, then inline (non-`$ref`)
/// `allOf` children in order, recursively.
pub fn prefer_local<T>(
  get_value: impl Fn(&Schema, &Catalog) -> Result<Option<T>> + Copy,
  schema: &Schema,
  catalog: &Catalog,
) -> Result<Option<T>> {
  if let Some(value) = local(get_value, schema, catalog)? {
    return Ok(Some(value));
  }
  get_value(schema, catalog)
}

/// Reads a value along the local traversal only: the schema's own keys and
/// inline `allOf` children, never following `$ref`.
pub fn local<T>(
  get_value: impl Fn(&Schema, &Catalog) -> Result<Option<T>> + Copy,
  schema: &Schema,
  catalog: &Catalog,
) -> Result<Option<T>> {
  let mut own = schema.clone();
  own.remove("$ref");
  own.remove("allOf");
  if let Some(value) = get_value(&own, catalog)? {
    return Ok(Some(value));
  }

  if let Some(Value::Array(children)) = schema.get("allOf") {
    for child in children {
      let Some(child_schema) = child.as_object() else {
        continue;
      };
      if child_schema.contains_key("$ref") {
        continue;
      }
      if let Some(value) = local(get_value, child_schema, catalog)? {
        return Ok(Some(value));
      }
    }
  }

  Ok(None)
}

//! Python type expressions for generated model artifacts.

use super::ColumnSchemaArtifacts;
use crate::generator::error::{Result, SchemaError};

/// Where a type expression appears in the generated model file. Object and
/// array references render as model protocol types in column and `__init__`
/// positions and as TypedDict types in `from_dict`/`to_dict` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeContext {
  Column,
  Init,
  FromDict,
  TypedDict,
}

/// Whether the column's value may be absent.
///
/// Explicit `nullable` wins; otherwise a column is nullable exactly when it
/// is neither required nor generated.
pub(crate) fn effective_nullable(artifacts: &ColumnSchemaArtifacts) -> bool {
  artifacts
    .nullable
    .unwrap_or(!(artifacts.required.unwrap_or(false) || artifacts.generated.unwrap_or(false)))
}

/// Calculates the Python type expression for a column.
pub(crate) fn calculate(artifacts: &ColumnSchemaArtifacts, context: TypeContext) -> Result<String> {
  let base = base_type(artifacts, context)?;

  let optional = match context {
    TypeContext::Column | TypeContext::TypedDict => effective_nullable(artifacts),
    TypeContext::Init | TypeContext::FromDict => {
      effective_nullable(artifacts) || !artifacts.required.unwrap_or(false) || artifacts.generated.unwrap_or(false)
    }
  };

  if optional {
    Ok(format!("typing.Optional[{base}]"))
  } else {
    Ok(base)
  }
}

fn base_type(artifacts: &ColumnSchemaArtifacts, context: TypeContext) -> Result<String> {
  if artifacts.json {
    return Ok("typing.Any".to_string());
  }

  let format = artifacts.format.as_deref();
  match artifacts.type_.as_str() {
    "integer" => Ok("int".to_string()),
    "number" => Ok("float".to_string()),
    "boolean" => Ok("bool".to_string()),
    "string" => Ok(
      match format {
        Some("date") => "datetime.date",
        Some("date-time") => "datetime.datetime",
        Some("binary") => "bytes",
        _ => "str",
      }
      .to_string(),
    ),
    "object" => Ok(reference_type(artifacts, context)?),
    "array" => Ok(format!("typing.Sequence[{}]", reference_type(artifacts, context)?)),
    other => Err(SchemaError::malformed(format!(
      "The type {other} has no Python representation."
    ))),
  }
}

fn reference_type(artifacts: &ColumnSchemaArtifacts, context: TypeContext) -> Result<String> {
  let de_ref = artifacts.de_ref.as_deref().ok_or_else(|| {
    SchemaError::malformed("An object or array column must reference another model.")
  })?;
  Ok(match context {
    TypeContext::Column | TypeContext::Init => format!("\"T{de_ref}\""),
    TypeContext::FromDict | TypeContext::TypedDict => format!("\"{de_ref}Dict\""),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn artifacts(type_: &str) -> ColumnSchemaArtifacts {
    ColumnSchemaArtifacts {
      type_: type_.to_string(),
      format: None,
      nullable: None,
      required: None,
      de_ref: None,
      generated: None,
      description: None,
      json: false,
    }
  }

  #[test]
  fn primitive_types() {
    let mut a = artifacts("integer");
    a.required = Some(true);
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "int");
    a.type_ = "number".to_string();
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "float");
    a.type_ = "boolean".to_string();
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "bool");
  }

  #[test]
  fn string_formats() {
    let mut a = artifacts("string");
    a.required = Some(true);
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "str");
    a.format = Some("date".to_string());
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "datetime.date");
    a.format = Some("date-time".to_string());
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "datetime.datetime");
    a.format = Some("binary".to_string());
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "bytes");
  }

  #[test]
  fn not_required_column_is_optional() {
    let a = artifacts("integer");
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "typing.Optional[int]");
  }

  #[test]
  fn generated_column_is_plain_but_optional_in_init() {
    let mut a = artifacts("integer");
    a.generated = Some(true);
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "int");
    assert_eq!(calculate(&a, TypeContext::Init).unwrap(), "typing.Optional[int]");
  }

  #[test]
  fn object_reference_types_by_context() {
    let mut a = artifacts("object");
    a.de_ref = Some("Division".to_string());
    a.required = Some(true);
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "\"TDivision\"");
    assert_eq!(calculate(&a, TypeContext::FromDict).unwrap(), "\"DivisionDict\"");
  }

  #[test]
  fn array_reference_is_sequence() {
    let mut a = artifacts("array");
    a.de_ref = Some("Project".to_string());
    a.required = Some(true);
    assert_eq!(
      calculate(&a, TypeContext::Column).unwrap(),
      "typing.Sequence[\"TProject\"]"
    );
    assert_eq!(
      calculate(&a, TypeContext::TypedDict).unwrap(),
      "typing.Sequence[\"ProjectDict\"]"
    );
  }

  #[test]
  fn json_column_is_any() {
    let mut a = artifacts("object");
    a.json = true;
    a.required = Some(true);
    assert_eq!(calculate(&a, TypeContext::Column).unwrap(), "typing.Any");
  }
}

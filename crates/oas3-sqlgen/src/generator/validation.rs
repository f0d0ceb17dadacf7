use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::{catalog::Catalog, error::SchemaError, merge, peek, schema::Schema};

/// The outcome of checking a single schema.
///
/// Validation never raises; every failure is reported as a verdict with a
/// human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelVerdict {
  pub valid: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

impl ModelVerdict {
  fn valid() -> Self {
    Self {
      valid: true,
      reason: None,
    }
  }

  fn invalid(reason: impl Into<String>) -> Self {
    Self {
      valid: false,
      reason: Some(reason.into()),
    }
  }
}

/// Checks whether a schema can be managed as a model.
///
/// All pipeline errors are converted into verdict reasons; resolution and
/// flattening failures keep their source messages behind a
/// `malformed schema ::` / `reference ::` prefix.
pub fn check_model(schema: &Schema, catalog: &Catalog) -> ModelVerdict {
  let merged = match merge::prepare("", schema, catalog) {
    Ok((_, merged)) => merged,
    Err(error) => return verdict_for_error(&error),
  };

  match merged.get("type") {
    None => return ModelVerdict::invalid(r#"no "type" key was found, define a type"#),
    Some(Value::String(type_)) => {
      if type_ != "object" {
        return ModelVerdict::invalid(format!(
          r#"the type of the schema is "{type_}", change it to be "object""#
        ));
      }
    }
    Some(other) => {
      return ModelVerdict::invalid(format!("the type value is {other}, change it to a string value"));
    }
  }

  match peek::tablename(&merged, catalog) {
    Ok(Some(_)) => ModelVerdict::valid(),
    Ok(None) => ModelVerdict::invalid(r#"no "x-tablename" key was found, define the name of the table"#),
    Err(error) => verdict_for_error(&error),
  }
}

/// Checks every named schema, returning verdicts for the failing ones only.
pub fn check_models(catalog: &Catalog) -> IndexMap<String, ModelVerdict> {
  catalog
    .iter()
    .map(|(name, schema)| (name.clone(), check_model(schema, catalog)))
    .filter(|(_, verdict)| !verdict.valid)
    .collect()
}

fn verdict_for_error(error: &SchemaError) -> ModelVerdict {
  match error {
    SchemaError::MalformedSchema(message) => ModelVerdict::invalid(format!("malformed schema :: {message} ")),
    SchemaError::SchemaNotFound(message) => ModelVerdict::invalid(format!("reference :: '{message}' ")),
    SchemaError::MissingArgument(message) => ModelVerdict::invalid(format!("missing argument :: {message} ")),
    SchemaError::TypeMissing(_) => ModelVerdict::invalid(r#"no "type" key was found, define a type"#),
  }
}

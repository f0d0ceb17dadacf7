//! Per-model artifacts consumed by the source-text emitter.
//!
//! The extractor presumes a normalized, validated catalog: columns appear in
//! declaration order with inherited columns first, argument lists split
//! required-before-optional, and every string is owned by the artifact.

pub(crate) mod docstring;
pub(crate) mod python_type;

use python_type::TypeContext;
use serde::Serialize;
use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  merge, peek,
  relationship::referenced_model_name,
  schema::Schema,
};

/// Version of the artifact document layout.
pub const ARTIFACT_VERSION: u32 = 1;

/// Raw column facts gathered from the schema before typing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnSchemaArtifacts {
  pub type_: String,
  pub format: Option<String>,
  pub nullable: Option<bool>,
  pub required: Option<bool>,
  /// The referenced model for object/array columns.
  pub de_ref: Option<String>,
  /// True for primary keys backed by autoincrement.
  pub generated: Option<bool>,
  pub description: Option<String>,
  /// True when the column stores its value as JSON.
  pub json: bool,
}

/// A typed column attribute of the generated model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnArtifacts {
  pub name: String,
  #[serde(rename = "type")]
  pub type_: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// One argument of the generated `__init__` and `from_dict` signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnArgArtifacts {
  pub name: String,
  pub init_type: String,
  pub from_dict_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<String>,
}

/// Arguments split by requiredness, each group in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ArgArtifacts {
  pub required: Vec<ColumnArgArtifacts>,
  pub optional: Vec<ColumnArgArtifacts>,
}

/// One of the two TypedDict classes generated per model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedDictClassArtifacts {
  pub props: Vec<ColumnArtifacts>,
  pub empty: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_class: Option<String>,
}

/// The required/optional TypedDict pair for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedDictArtifacts {
  pub required: TypedDictClassArtifacts,
  pub optional: TypedDictClassArtifacts,
}

/// Everything the emitter needs to write one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelArtifacts {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// The fully qualified reference into the runtime's models namespace.
  pub parent_class: String,
  /// Whether the model has no columns.
  pub empty: bool,
  pub columns: Vec<ColumnArtifacts>,
  pub args: ArgArtifacts,
  pub typed_dict: TypedDictArtifacts,
  pub docstring: String,
}

/// The stable, versioned document handed to the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelsDocument {
  pub version: u32,
  pub models: Vec<ModelArtifacts>,
}

/// Extracts the artifacts for a single constructable model.
pub fn extract_model(name: &str, schema: &Schema, catalog: &Catalog) -> Result<ModelArtifacts> {
  let (_, merged) = merge::prepare(name, schema, catalog)?;
  let description = peek::description(&merged, catalog)?;
  let required_names = required_names(&merged);

  let mut columns = Vec::new();
  let mut required_args = Vec::new();
  let mut optional_args = Vec::new();
  let mut required_props = Vec::new();
  let mut optional_props = Vec::new();

  if let Some(Value::Object(properties)) = merged.get("properties") {
    for (property_name, property) in properties {
      let gathered = gather_column(property_name, property, &required_names, catalog)?;

      columns.push(ColumnArtifacts {
        name: property_name.clone(),
        type_: python_type::calculate(&gathered, TypeContext::Column)?,
        description: gathered.description.clone(),
      });

      let arg = ColumnArgArtifacts {
        name: property_name.clone(),
        init_type: python_type::calculate(&gathered, TypeContext::Init)?,
        from_dict_type: python_type::calculate(&gathered, TypeContext::FromDict)?,
        default: None,
      };
      let prop = ColumnArtifacts {
        name: property_name.clone(),
        type_: python_type::calculate(&gathered, TypeContext::TypedDict)?,
        description: gathered.description.clone(),
      };

      if gathered.required.unwrap_or(false) && !gathered.generated.unwrap_or(false) {
        required_args.push(arg);
        required_props.push(prop);
      } else {
        optional_args.push(ColumnArgArtifacts {
          default: Some("None".to_string()),
          ..arg
        });
        optional_props.push(prop);
      }
    }
  }

  let empty = columns.is_empty();
  let typed_dict = typed_dicts(name, required_props, optional_props);
  let mut artifacts = ModelArtifacts {
    name: name.to_string(),
    description,
    parent_class: format!("models.{name}"),
    empty,
    columns,
    args: ArgArtifacts {
      required: required_args,
      optional: optional_args,
    },
    typed_dict,
    docstring: String::new(),
  };
  artifacts.docstring = docstring::model_docstring(&artifacts);
  Ok(artifacts)
}

/// Extracts the versioned artifact document for every constructable model,
/// skipping the given names (synthesized association tables are tables, not
/// models).
pub fn extract_models(catalog: &Catalog, skip: &[String]) -> Result<ModelsDocument> {
  let mut models = Vec::new();
  for name in catalog.constructable_names() {
    if skip.contains(&name) {
      continue;
    }
    let schema = catalog
      .get(&name)
      .cloned()
      .ok_or_else(|| SchemaError::not_found(format!("{name} was not found in schemas.")))?;
    models.push(extract_model(&name, &schema, catalog)?);
  }
  Ok(ModelsDocument {
    version: ARTIFACT_VERSION,
    models,
  })
}

/// Gathers the raw schema facts for one column.
fn gather_column(
  property_name: &str,
  property: &Value,
  required_names: &[String],
  catalog: &Catalog,
) -> Result<ColumnSchemaArtifacts> {
  let property_schema = property.as_object().ok_or_else(|| {
    SchemaError::malformed(format!("The property {property_name} must be an object schema."))
  })?;
  let (_, merged) = merge::prepare("", property_schema, catalog)?;

  let json = peek::json(&merged, catalog)?.unwrap_or(false);
  let type_ = peek::type_(&merged, catalog)?;
  let required = required_names.contains(&property_name.to_string());

  let de_ref = match type_.as_str() {
    "object" if !json => referenced_model_name(property_schema, catalog)?,
    "array" => match merged.get("items").and_then(Value::as_object) {
      Some(items) => referenced_model_name(items, catalog)?,
      None => None,
    },
    _ => None,
  };

  let primary_key = peek::primary_key(&merged, catalog)?.unwrap_or(false);
  let autoincrement = peek::autoincrement(&merged, catalog)?;
  let generated = primary_key && type_ == "integer" && autoincrement != Some(false);

  Ok(ColumnSchemaArtifacts {
    format: peek::format(&merged, catalog)?,
    nullable: peek::nullable(&merged, catalog)?,
    required: Some(required),
    de_ref,
    generated: Some(generated),
    description: peek::description(&merged, catalog)?,
    json,
    type_,
  })
}

fn typed_dicts(
  model_name: &str,
  required_props: Vec<ColumnArtifacts>,
  optional_props: Vec<ColumnArtifacts>,
) -> TypedDictArtifacts {
  let dict_name = format!("{model_name}Dict");
  let base_name = format!("_{model_name}DictBase");
  let has_required = !required_props.is_empty();
  let has_optional = !optional_props.is_empty();

  let required = TypedDictClassArtifacts {
    empty: !has_required,
    name: has_required.then(|| if has_optional { base_name.clone() } else { dict_name.clone() }),
    parent_class: has_required.then(|| "typing.TypedDict".to_string()),
    props: required_props,
  };
  let optional = TypedDictClassArtifacts {
    empty: !has_optional,
    name: (has_optional || !has_required).then(|| dict_name.clone()),
    parent_class: if has_optional || !has_required {
      Some(if has_required {
        base_name
      } else {
        "typing.TypedDict".to_string()
      })
    } else {
      None
    },
    props: optional_props,
  };

  TypedDictArtifacts { required, optional }
}

fn required_names(merged: &Schema) -> Vec<String> {
  merged
    .get("required")
    .and_then(Value::as_array)
    .map(|names| {
      names
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect()
    })
    .unwrap_or_default()
}


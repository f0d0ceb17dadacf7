use std::{
  cell::RefCell,
  collections::{HashMap, HashSet},
  fs,
  path::PathBuf,
  sync::LazyLock,
};

use regex::Regex;
use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  schema::Schema,
};

static LOCAL_REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#/components/schemas/(\w+)$").unwrap());

/// Resolves a schema to the first schema in its `$ref` chain that no longer
/// has a `$ref` key, recording the name at each step.
///
/// Returns the final schema together with the *last* referenced name.
/// Revisiting a reference along the chain fails with
/// [`SchemaError::MalformedSchema`] so pathological chains terminate.
pub fn resolve(name: &str, schema: &Schema, catalog: &Catalog) -> Result<(String, Schema)> {
  let mut seen: HashSet<String> = HashSet::new();
  let mut current_name = name.to_string();
  let mut current = schema.clone();

  loop {
    let Some(ref_value) = current.get("$ref") else {
      return Ok((current_name, current));
    };
    let reference = ref_value
      .as_str()
      .ok_or_else(|| SchemaError::malformed("The value of $ref must ba a string."))?
      .to_string();
    if !seen.insert(reference.clone()) {
      return Err(SchemaError::malformed(format!("cyclic $ref: {reference}")));
    }

    let (next_name, next_schema) = get_ref(&reference, catalog)?;
    current_name = next_name;
    current = next_schema;
  }
}

/// Retrieves the schema referenced by a single `$ref` value.
///
/// Local references must match `#/components/schemas/<Name>`; anything not
/// starting with `#` is treated as a remote reference.
pub fn get_ref(reference: &str, catalog: &Catalog) -> Result<(String, Schema)> {
  if !reference.starts_with('#') {
    return get_remote_ref(reference, catalog.remote());
  }

  let captures = LOCAL_REF_RE.captures(reference).ok_or_else(|| {
    SchemaError::not_found(format!(
      "{reference} format incorrect, expected #/components/schemas/<SchemaName>"
    ))
  })?;
  let name = &captures[1];
  let schema = catalog
    .get(name)
    .ok_or_else(|| SchemaError::not_found(format!("{name} was not found in schemas.")))?;

  Ok((name.to_string(), schema.clone()))
}

/// Retrieves a schema from another file based on a `context#/pointer`
/// reference, rewriting any `$ref` inside it to be context-qualified.
pub fn get_remote_ref(reference: &str, store: &RemoteSchemaStore) -> Result<(String, Schema)> {
  let (context, pointer) = separate_context_path(reference)?;
  let context = normalize_context(&context);
  let document = store.document(&context)?;
  let (name, found) = retrieve_schema(&document, &pointer)?;
  let mapped = map_remote_schema_refs(&found, &context)?;
  let schema = mapped.as_object().cloned().ok_or_else(|| {
    SchemaError::not_found(format!(
      "The remote reference does not resolve to a schema object. The reference is: {reference}"
    ))
  })?;
  Ok((name, schema))
}

/// Splits a reference into its context and pointer parts.
///
/// A well-formed reference contains exactly one `#`.
pub(crate) fn separate_context_path(reference: &str) -> Result<(String, String)> {
  let parts: Vec<&str> = reference.split('#').collect();
  if parts.len() != 2 {
    return Err(SchemaError::malformed(format!(
      "A reference must contain exactly one #. Actual reference: {reference}"
    )));
  }
  Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Normalizes a context path: collapses `.`/`..` components and folds case.
///
/// Case folding matches the original tool's behavior on case-insensitive
/// filesystems; mixed-case sibling paths on case-sensitive systems are
/// unspecified.
pub(crate) fn normalize_context(context: &str) -> String {
  let lowered = context.to_lowercase();
  let mut parts: Vec<&str> = Vec::new();
  for component in lowered.split('/') {
    match component {
      "" | "." => {}
      ".." => {
        if matches!(parts.last(), Some(&"..")) || parts.is_empty() {
          parts.push("..");
        } else {
          parts.pop();
        }
      }
      other => parts.push(other),
    }
  }
  if parts.is_empty() {
    ".".to_string()
  } else {
    parts.join("/")
  }
}

fn context_dir(context: &str) -> &str {
  context.rsplit_once('/').map_or("", |(head, _)| head)
}

/// Qualifies a single `$ref` value found inside a remotely loaded schema.
///
/// Three cases: intra-document references get the loading context
/// prepended; sibling and relative references are joined with the loading
/// context's directory and normalized. References that are already
/// spec-qualified are left untouched, which keeps the rewrite idempotent.
pub(crate) fn add_remote_context(context: &str, reference: &str) -> Result<String> {
  let (ref_context, ref_path) = separate_context_path(reference)?;

  if ref_context.is_empty() {
    return Ok(format!("{context}#{ref_path}"));
  }

  let head = context_dir(context);
  if normalize_context(&ref_context) == ref_context && (head.is_empty() || ref_context.starts_with(&format!("{head}/")))
  {
    return Ok(format!("{ref_context}#{ref_path}"));
  }

  let joined = if head.is_empty() {
    ref_context
  } else {
    format!("{head}/{ref_context}")
  };
  Ok(format!("{}#{}", normalize_context(&joined), ref_path))
}

/// Walks a JSON value and rewrites every `$ref` string value with
/// [`add_remote_context`]. Only `$ref` values are substituted; all other
/// strings are untouched.
pub(crate) fn map_remote_schema_refs(value: &Value, context: &str) -> Result<Value> {
  match value {
    Value::Object(map) => {
      let mut mapped = Schema::new();
      for (key, entry) in map {
        if key == "$ref"
          && let Value::String(reference) = entry
        {
          mapped.insert(key.clone(), Value::String(add_remote_context(context, reference)?));
          continue;
        }
        mapped.insert(key.clone(), map_remote_schema_refs(entry, context)?);
      }
      Ok(Value::Object(mapped))
    }
    Value::Array(entries) => Ok(Value::Array(
      entries
        .iter()
        .map(|entry| map_remote_schema_refs(entry, context))
        .collect::<Result<_>>()?,
    )),
    other => Ok(other.clone()),
  }
}

/// Descends a parsed remote document along a `/`-delimited pointer.
fn retrieve_schema(document: &Value, pointer: &str) -> Result<(String, Value)> {
  let path = pointer.strip_prefix('/').unwrap_or(pointer);
  let components: Vec<&str> = path.split('/').collect();

  let mut current = document;
  for (index, component) in components.iter().enumerate() {
    current = current.get(component).ok_or_else(|| {
      SchemaError::not_found(format!(
        "The schema was not found in the remote schemas. Path subsection: {}",
        components[index..].join("/")
      ))
    })?;
  }

  let name = components.last().copied().unwrap_or_default().to_string();
  Ok((name, current.clone()))
}

/// In-memory store for remotely referenced documents.
///
/// Owns the spec context (the path of the root document) and a cache of
/// parsed documents keyed by normalized context. The store lives on the
/// catalog and is reset between independent runs; interior mutability keeps
/// the read-side resolver API free of `&mut` plumbing. The pipeline is
/// single-threaded.
#[derive(Debug, Default)]
pub struct RemoteSchemaStore {
  documents: RefCell<HashMap<String, Value>>,
  spec_context: RefCell<Option<PathBuf>>,
}

impl RemoteSchemaStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the path of the root OpenAPI document remote contexts are
  /// resolved against.
  pub fn set_context(&self, path: impl Into<PathBuf>) {
    *self.spec_context.borrow_mut() = Some(path.into());
  }

  /// Clears the cache and the spec context.
  pub fn reset(&self) {
    self.documents.borrow_mut().clear();
    *self.spec_context.borrow_mut() = None;
  }

  /// Returns the parsed document for a context, loading and caching it on
  /// first use.
  fn document(&self, context: &str) -> Result<Value> {
    if let Some(document) = self.documents.borrow().get(context) {
      return Ok(document.clone());
    }

    let document = self.load(context)?;
    self.documents.borrow_mut().insert(context.to_string(), document.clone());
    Ok(document)
  }

  fn load(&self, context: &str) -> Result<Value> {
    let extension = context.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    if !matches!(extension, "json" | "yaml" | "yml") {
      return Err(SchemaError::not_found(format!(
        "The remote context is not a JSON nor YAML file. The path is: {context}"
      )));
    }

    let spec_context = self.spec_context.borrow();
    let Some(spec_path) = spec_context.as_ref() else {
      return Err(SchemaError::MissingArgument(
        "Cannot find the file containing the remote reference, set the path of the OpenAPI \
         specification on the remote schema store before resolving remote references."
          .to_string(),
      ));
    };

    let spec_dir = spec_path.parent().map(PathBuf::from).unwrap_or_default();
    let remote_path = spec_dir.join(context);
    let contents = fs::read_to_string(&remote_path).map_err(|_| {
      SchemaError::not_found(format!(
        "The file with the remote reference was not found. The path is: {context}"
      ))
    })?;

    if extension == "json" {
      serde_json::from_str(&contents).map_err(|_| {
        SchemaError::not_found(format!(
          "The remote reference file is not valid JSON. The path is: {context}"
        ))
      })
    } else {
      serde_yaml::from_str(&contents).map_err(|_| {
        SchemaError::not_found(format!(
          "The remote reference file is not valid YAML. The path is: {context}"
        ))
      })
    }
  }
}

/// Errors surfaced while lowering OpenAPI schemas to the relational model.
///
/// Normalization propagates these eagerly; the validation pass catches them
/// and converts them to per-schema verdicts instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
  /// Structural errors in the document: bad `$ref` syntax, bad `allOf`
  /// values, conflicting merges, invalid primary keys for associations.
  #[error("{0}")]
  MalformedSchema(String),

  /// A named schema or remote file is missing or unparseable.
  #[error("{0}")]
  SchemaNotFound(String),

  /// A remote reference was encountered before the spec context was set.
  #[error("{0}")]
  MissingArgument(String),

  /// A schema is missing its `type` key. Recovered by validation.
  #[error("{0}")]
  TypeMissing(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

impl From<oas3_sqlgen_support::FacadeError> for SchemaError {
  fn from(error: oas3_sqlgen_support::FacadeError) -> Self {
    Self::MalformedSchema(error.to_string())
  }
}

impl SchemaError {
  pub(crate) fn malformed(message: impl Into<String>) -> Self {
    Self::MalformedSchema(message.into())
  }

  pub(crate) fn not_found(message: impl Into<String>) -> Self {
    Self::SchemaNotFound(message.into())
  }
}

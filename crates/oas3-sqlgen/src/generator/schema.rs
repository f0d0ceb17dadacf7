use serde_json::Value;

/// A single OpenAPI schema: an ordered mapping of string keys to JSON
/// values.
///
/// Schemas stay untyped through the whole pipeline so unknown `x-`
/// extension keys and malformed shapes survive into validation; order
/// preservation makes catalog iteration and generated output follow the
/// source document.
pub type Schema = serde_json::Map<String, Value>;

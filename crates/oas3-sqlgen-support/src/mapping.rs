use serde::Serialize;

use crate::{ColumnDescriptor, FacadeError};

/// The SQL column types the mapping layer can produce.
///
/// Mirrors the SQLAlchemy types the emitter renders; `String`/`Binary`
/// carry the optional length constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum SqlType {
  #[strum(to_string = "Integer")]
  Integer,
  #[strum(to_string = "BigInteger")]
  BigInteger,
  #[strum(to_string = "Float")]
  Float,
  #[strum(to_string = "String")]
  String { length: Option<u64> },
  #[strum(to_string = "LargeBinary")]
  Binary { length: Option<u64> },
  #[strum(to_string = "Date")]
  Date,
  #[strum(to_string = "DateTime")]
  DateTime,
  #[strum(to_string = "Boolean")]
  Boolean,
  #[strum(to_string = "JSON")]
  Json,
}

/// Maps an OpenAPI `type`/`format` pair to its SQL column type.
///
/// A descriptor with `json` set always maps to [`SqlType::Json`], matching
/// the `x-json` extension contract.
///
/// # Errors
///
/// Returns [`FacadeError::UnsupportedType`] for types outside the supported
/// subset and [`FacadeError::UnsupportedFormat`] for unknown formats of a
/// supported type.
pub fn map_sql_type(descriptor: &ColumnDescriptor) -> Result<SqlType, FacadeError> {
  if descriptor.json {
    return Ok(SqlType::Json);
  }

  let format = descriptor.format.as_deref();
  match descriptor.type_.as_str() {
    "integer" => match format {
      None | Some("int32") => Ok(SqlType::Integer),
      Some("int64") => Ok(SqlType::BigInteger),
      Some(other) => Err(unsupported_format(other, &descriptor.type_)),
    },
    "number" => match format {
      None | Some("float") => Ok(SqlType::Float),
      Some(other) => Err(unsupported_format(other, &descriptor.type_)),
    },
    "string" => match format {
      None | Some("password") | Some("byte") => Ok(SqlType::String {
        length: descriptor.max_length,
      }),
      Some("binary") => Ok(SqlType::Binary {
        length: descriptor.max_length,
      }),
      Some("date") => Ok(SqlType::Date),
      Some("date-time") => Ok(SqlType::DateTime),
      Some(other) => Err(unsupported_format(other, &descriptor.type_)),
    },
    "boolean" => Ok(SqlType::Boolean),
    other => Err(FacadeError::UnsupportedType {
      type_: other.to_string(),
    }),
  }
}

fn unsupported_format(format: &str, type_: &str) -> FacadeError {
  FacadeError::UnsupportedFormat {
    format: format.to_string(),
    type_: type_.to_string(),
  }
}

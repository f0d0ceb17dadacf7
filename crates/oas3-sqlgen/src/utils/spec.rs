use std::{ffi::OsStr, path::Path};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecFormat {
  #[default]
  Json,
  Yaml,
}

impl SpecFormat {
  #[must_use]
  pub fn from_extension(ext: &str) -> Self {
    match ext {
      "yaml" | "yml" => Self::Yaml,
      _ => Self::Json,
    }
  }
}

/// Loads an OpenAPI document as an untyped JSON value.
///
/// The pipeline works on untyped documents so unknown `x-` extension keys
/// and malformed shapes survive into validation.
pub struct SpecLoader {
  contents: String,
  format: SpecFormat,
}

impl SpecLoader {
  pub async fn open(path: &Path) -> anyhow::Result<Self> {
    let format = path
      .extension()
      .and_then(OsStr::to_str)
      .map_or(SpecFormat::default(), SpecFormat::from_extension);

    let contents = tokio::fs::read_to_string(path).await?;

    Ok(Self { contents, format })
  }

  pub fn parse(&self) -> anyhow::Result<Value> {
    match self.format {
      SpecFormat::Json => Ok(serde_json::from_str(&self.contents)?),
      SpecFormat::Yaml => Ok(serde_yaml::from_str(&self.contents)?),
    }
  }
}

//! Docstring composition for generated model files.
//!
//! The layout mirrors the emitted Python source: a four-space indented
//! protocol docstring with an `Attrs:` section, wrapped at the widths the
//! emitter's templates expect.

use itertools::Itertools;

use super::{ColumnArtifacts, ModelArtifacts};
use crate::utils::text::wrap;

const DEFAULT_DOCSTRING: &str = "SQLAlchemy model protocol.";
const DESCRIPTION_WIDTH: usize = 75;
const ATTR_FIRST_WIDTH: usize = 71;
const ATTR_REMAINING_WIDTH: usize = 67;

/// Builds the docstring for a model.
///
/// A model without description or columns gets the bare default. Otherwise
/// the default is followed by the wrapped description and an `Attrs:` block
/// documenting every column.
pub(crate) fn model_docstring(artifacts: &ModelArtifacts) -> String {
  if artifacts.description.is_none() && artifacts.empty {
    return DEFAULT_DOCSTRING.to_string();
  }

  let description = match &artifacts.description {
    None => format!("\n    {DEFAULT_DOCSTRING}"),
    Some(text) => {
      let joined = wrap(text, DESCRIPTION_WIDTH).join("\n    ");
      format!("\n    {DEFAULT_DOCSTRING}\n\n    {joined}")
    }
  };

  let attr_docs = if artifacts.empty {
    String::new()
  } else {
    let joined = artifacts
      .columns
      .iter()
      .map(|column| attr_doc(column, &artifacts.name))
      .join("\n        ");
    format!("\n\n    Attrs:\n        {joined}")
  };

  format!("{description}{attr_docs}\n\n    ")
}

/// The documentation line for one column attribute.
///
/// `<name>: <description>` with the first line wrapped at 71 columns and
/// continuations at 67, joined with the continuation indent.
pub(crate) fn attr_doc(column: &ColumnArtifacts, model_name: &str) -> String {
  let description = column
    .description
    .clone()
    .unwrap_or_else(|| format!("The {} of the {model_name}.", column.name));
  let doc = format!("{}: {description}", column.name);

  let mut wrapped = wrap(&doc, ATTR_FIRST_WIDTH);
  if wrapped.len() > 1 {
    let remaining = wrapped[1..].join(" ");
    let mut lines = vec![wrapped.remove(0)];
    lines.extend(wrap(&remaining, ATTR_REMAINING_WIDTH));
    wrapped = lines;
  }
  wrapped.join("\n            ")
}

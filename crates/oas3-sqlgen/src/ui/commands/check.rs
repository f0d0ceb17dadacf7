use std::path::Path;

use comfy_table::{Attribute, Cell, ContentArrangement, Row, Table};
use oas3_sqlgen::{
  generator::{catalog::Catalog, validation},
  utils::spec::SpecLoader,
};

use crate::ui::{Colors, colors::IntoComfyColor, term_width};

/// Validates every schema in the document and prints the failures.
pub async fn check_models(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let document = SpecLoader::open(input).await?.parse()?;
  let catalog = Catalog::from_document(&document)?;
  catalog.set_spec_context(input);

  let verdicts = validation::check_models(&catalog);
  if verdicts.is_empty() {
    println!("All {} schemas can be managed.", catalog.len());
    return Ok(());
  }

  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut row = Row::new();
  row.add_cell(Cell::new("SCHEMA").fg(IntoComfyColor::into(colors.label())));
  row.add_cell(Cell::new("REASON").fg(IntoComfyColor::into(colors.label())));
  table.set_header(row);

  for (name, verdict) in &verdicts {
    let mut row = Row::new();
    row.add_cell(
      Cell::new(name)
        .fg(IntoComfyColor::into(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(Cell::new(verdict.reason.as_deref().unwrap_or_default()).fg(IntoComfyColor::into(colors.primary())));
    table.add_row(row);
  }

  println!("{table}");
  println!("{} of {} schemas cannot be managed.", verdicts.len(), catalog.len());

  Ok(())
}

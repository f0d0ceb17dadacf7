use std::path::Path;

use crossterm::style::Stylize;
use oas3_sqlgen::{generator::orchestrator::Orchestrator, utils::spec::SpecLoader};

use crate::ui::Colors;

/// Runs the full pipeline and writes the model artifact document.
pub async fn generate_models(input: &Path, output: &Path, compact: bool, colors: &Colors) -> anyhow::Result<()> {
  let document = SpecLoader::open(input).await?.parse()?;

  let mut orchestrator = Orchestrator::with_spec_context(&document, input)?;
  orchestrator.normalize()?;

  let models = orchestrator.models_document()?;
  let serialized = if compact {
    serde_json::to_string(&models)?
  } else {
    serde_json::to_string_pretty(&models)?
  };
  tokio::fs::write(output, serialized).await?;

  let stats = orchestrator.stats();
  println!(
    "{} {} models, {} columns, {} relationships, {} association tables",
    "generated".with(colors.success()),
    stats.models_processed,
    stats.columns_created,
    stats.relationships_created,
    stats.associations_synthesized,
  );
  for warning in &stats.warnings {
    println!("{} {warning}", "warning".with(colors.accent()));
  }

  Ok(())
}

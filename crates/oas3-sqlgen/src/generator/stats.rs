use strum::Display;

use oas3_sqlgen_support::RelationshipKind;

/// Counters and warnings accumulated while normalizing a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizationStats {
  pub models_processed: usize,
  pub columns_created: usize,
  pub relationships_created: usize,
  pub many_to_many_created: usize,
  pub foreign_keys_placed: usize,
  pub associations_synthesized: usize,
  pub cycles_detected: usize,
  pub cycle_details: Vec<Vec<String>>,
  pub warnings: Vec<NormalizationWarning>,
}

impl NormalizationStats {
  pub fn record_model(&mut self) {
    self.models_processed += 1;
  }

  pub fn record_column(&mut self) {
    self.columns_created += 1;
  }

  pub fn record_relationship(&mut self, kind: RelationshipKind) {
    self.relationships_created += 1;
    if matches!(kind, RelationshipKind::ManyToMany) {
      self.many_to_many_created += 1;
    }
  }

  pub fn record_foreign_key(&mut self) {
    self.foreign_keys_placed += 1;
  }

  pub fn record_association(&mut self) {
    self.associations_synthesized += 1;
  }

  pub fn record_cycle(&mut self, cycle: Vec<String>) {
    self.cycles_detected += 1;
    self.cycle_details.push(cycle);
  }

  pub fn record_warning(&mut self, warning: NormalizationWarning) {
    self.warnings.push(warning);
  }
}

/// Non-fatal findings reported alongside the normalized catalog.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum NormalizationWarning {
  #[strum(to_string = "Schema '{schema_name}' is not managed: {reason}")]
  UnmanagedSchema { schema_name: String, reason: String },
  #[strum(to_string = "Schemas form a reference cycle: {path}")]
  ReferenceCycle { path: String },
}

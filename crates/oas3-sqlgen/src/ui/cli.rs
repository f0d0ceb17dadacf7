use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use super::colors::{ColorMode, ThemeMode};

#[derive(Parser, Debug)]
#[command(name = "oas3-sqlgen")]
#[command(author, version, about = "OpenAPI to SQLAlchemy model generator")]
#[command(propagate_version = true)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Coloring
  #[arg(
    long,
    value_enum,
    value_name = "WHEN",
    default_value = "auto",
    global = true,
    display_order = 100,
    help_heading = "Terminal Output"
  )]
  pub color: ColorMode,

  /// Theme
  #[arg(
    long,
    value_enum,
    value_name = "THEME",
    default_value = "auto",
    global = true,
    display_order = 100,
    help_heading = "Terminal Output"
  )]
  pub theme: ThemeMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Check which schemas can be managed as SQLAlchemy models
  Check {
    /// Path to the OpenAPI specification file
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::AnyPath)]
    input: PathBuf,
  },
  /// Generate the model artifact document consumed by the source emitter
  Generate {
    /// Path to the OpenAPI specification file
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::AnyPath)]
    input: PathBuf,

    /// Path for the generated artifact document
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::AnyPath)]
    output: PathBuf,

    /// Write compact JSON instead of pretty-printed output
    #[arg(long, default_value_t = false)]
    compact: bool,
  },
}

use clap::Parser;

use crate::ui::{Cli, Colors, Commands, colors};

mod ui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let colors = Colors::new(colors::colors_enabled(cli.color), colors::detect_theme(cli.theme));

  match cli.command {
    Commands::Check { input } => ui::commands::check_models(&input, &colors).await?,
    Commands::Generate { input, output, compact } => {
      ui::commands::generate_models(&input, &output, compact, &colors).await?;
    }
  }

  Ok(())
}

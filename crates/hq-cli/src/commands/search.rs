use anyhow::Result;
use clap::Args;
use hq_engine::Engine;

#[derive(Args, Debug)]
pub struct SearchCommand {
  /// Substring of a code or display name
  pub query: String,

  /// Maximum results
  #[arg(short, long, default_value = "10")]
  pub limit: usize,
}

pub async fn execute(cmd: SearchCommand, engine: &Engine) -> Result<()> {
  engine.directory.ensure_loaded().await;

  let matches = engine.directory.search(&cmd.query, cmd.limit);
  if matches.is_empty() {
    println!("no matches for '{}'", cmd.query);
    return Ok(());
  }
  for info in matches {
    println!("{}  {}", info.code, info.name);
  }
  Ok(())
}

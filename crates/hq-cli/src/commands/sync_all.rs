use anyhow::Result;
use clap::Args;
use hq_engine::Engine;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct SyncAllCommand {
  /// Symbols refreshed between pauses
  #[arg(long, default_value = "50")]
  pub batch_size: usize,

  /// Pause between batches, in milliseconds
  #[arg(long, default_value = "2000")]
  pub delay_ms: u64,
}

pub async fn execute(cmd: SyncAllCommand, engine: &Engine) -> Result<()> {
  let tracked = engine.store.all_synced().await?;
  if tracked.is_empty() {
    println!("nothing to update: the archive is empty");
    return Ok(());
  }

  let spinner = ProgressBar::new_spinner();
  spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
  spinner.set_message(format!("refreshing {} symbols", tracked.len()));
  spinner.enable_steady_tick(Duration::from_millis(120));

  let updated = engine
    .bars
    .update_all_cached(cmd.batch_size, Duration::from_millis(cmd.delay_ms))
    .await?;

  spinner.finish_with_message(format!("updated {}/{} symbols", updated, tracked.len()));
  Ok(())
}

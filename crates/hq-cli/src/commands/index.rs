use anyhow::Result;
use clap::Args;
use hq_engine::Engine;

#[derive(Args, Debug)]
pub struct IndexCommand {
  /// International index symbols (^HSI, ^DJI, ^IXIC, ...); empty prints
  /// the domestic benchmarks
  pub symbols: Vec<String>,
}

pub async fn execute(cmd: IndexCommand, engine: &Engine) -> Result<()> {
  if cmd.symbols.is_empty() {
    for idx in engine.indices.cn_indices().await {
      println!(
        "{:<10} {:<8} {:>12.2}  {:+.2} ({:+.2}%)",
        idx.symbol, idx.name, idx.price, idx.change, idx.change_pct
      );
    }
    return Ok(());
  }

  for symbol in &cmd.symbols {
    match engine.indices.index(symbol).await {
      Some(idx) => println!(
        "{:<10} {:<8} {:>12.2}  {:+.2} ({:+.2}%)  [{}]",
        idx.symbol, idx.name, idx.price, idx.change, idx.change_pct, idx.time
      ),
      None => println!("{:<10} unavailable", symbol),
    }
  }
  Ok(())
}

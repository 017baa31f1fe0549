use anyhow::{bail, Result};
use clap::Args;
use hq_core::Symbol;
use hq_engine::Engine;

#[derive(Args, Debug)]
pub struct FetchCommand {
  /// Symbol code (600519, sz000001, hk00700)
  pub code: String,

  /// Number of trailing days
  #[arg(short, long, default_value = "90")]
  pub days: usize,

  /// Fuse today's live quote during the trading session
  #[arg(short, long)]
  pub live: bool,

  /// Also print the technical analysis report
  #[arg(short, long)]
  pub analyze: bool,
}

pub async fn execute(cmd: FetchCommand, engine: &Engine) -> Result<()> {
  let symbol = Symbol::parse(&cmd.code)?;

  let Some(bars) = engine.bars.bars(&symbol, cmd.days, cmd.live).await? else {
    bail!("no data available for {}", symbol.code());
  };

  println!("{} - {} bars", symbol.code(), bars.len());
  for bar in &bars {
    println!(
      "{}  O {:>10.2}  H {:>10.2}  L {:>10.2}  C {:>10.2}  V {:>14.0}",
      bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
    );
  }

  if cmd.analyze {
    match engine.analyzer.analyze(&symbol).await? {
      Some(report) => {
        println!();
        println!("score {:>3}  close {:.2}  ({})", report.score, report.latest_price, report.as_of);
        println!(
          "KDJ {:.2}/{:.2}/{:.2}  MACD {:.4}  BBI {:.2}",
          report.kdj_k, report.kdj_d, report.kdj_j, report.macd, report.bbi
        );
      }
      None => println!("not enough history for analysis"),
    }
  }

  Ok(())
}

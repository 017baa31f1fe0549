use anyhow::{bail, Result};
use clap::Args;
use hq_core::Symbol;
use hq_engine::Engine;

#[derive(Args, Debug)]
pub struct QuoteCommand {
  /// Symbol codes (at most 50)
  #[arg(required_unless_present = "top")]
  pub codes: Vec<String>,

  /// Print the intraday minute tape for a single symbol
  #[arg(short, long)]
  pub intraday: bool,

  /// Market snapshot over the first N directory symbols instead of
  /// explicit codes
  #[arg(long)]
  pub top: Option<usize>,
}

pub async fn execute(cmd: QuoteCommand, engine: &Engine) -> Result<()> {
  if let Some(top) = cmd.top {
    engine.directory.ensure_loaded().await;
    let universe: Vec<Symbol> = engine
      .directory
      .codes()
      .iter()
      .filter_map(|c| Symbol::parse(c).ok())
      .collect();
    for q in engine.quotes.market_snapshot(&universe, top).await {
      println!("{:<8} {:<10} now {:>9.2}  {:+.2}%", q.symbol, q.name, q.now, q.change_pct());
    }
    return Ok(());
  }

  let symbols: Vec<Symbol> =
    cmd.codes.iter().map(|c| Symbol::parse(c)).collect::<hq_core::Result<_>>()?;

  if cmd.intraday {
    let [symbol] = symbols.as_slice() else {
      bail!("--intraday takes exactly one symbol");
    };
    let Some(series) = engine.intraday.series(symbol).await else {
      bail!("no intraday data for {}", symbol.code());
    };
    println!(
      "{} {}  now {:.2} ({:+.2}%)  [{}]",
      series.code, series.name, series.now, series.change_pct, series.date
    );
    for point in &series.points {
      println!("{}  {:>8.2}  avg {:>8.2}  vol {:>12.0}", point.time, point.price, point.avg, point.volume);
    }
    return Ok(());
  }

  let quotes = engine.quotes.quotes(&symbols).await?;
  if quotes.is_empty() {
    bail!("no quotes available");
  }
  for q in quotes {
    println!(
      "{:<8} {:<10} now {:>9.2}  {:+.2}%  open {:>9.2}  high {:>9.2}  low {:>9.2}",
      q.symbol,
      q.name,
      q.now,
      q.change_pct(),
      q.open,
      q.high,
      q.low
    );
  }
  Ok(())
}

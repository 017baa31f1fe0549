use anyhow::Result;
use hq_engine::Engine;

pub async fn execute(engine: &Engine) -> Result<()> {
  let stats = engine.store.stats().await?;
  println!("archive: {} symbols, {} rows, {:.2} MB", stats.symbols, stats.total_rows, stats.size_bytes as f64 / (1024.0 * 1024.0));

  let queue = engine.queue.stats();
  println!(
    "queue: depth {}, pending {}, completed {}, failed {}, workers {}",
    queue.queue_depth, queue.pending, queue.completed, queue.failed, queue.workers
  );

  let watchlist = engine.watchlist.groups()?;
  println!(
    "watchlist: {} favorites, {} holdings, {} watching",
    watchlist.favorites.len(),
    watchlist.holdings.len(),
    watchlist.watching.len()
  );
  Ok(())
}

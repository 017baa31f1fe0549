use crate::error::{StoreError, StoreResult};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite serves one writer at a time; WAL plus a busy timeout lets the
/// worker pool and request path share the file without surfacing
/// `SQLITE_BUSY` to callers.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    conn
      .batch_execute(
        "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;",
      )
      .map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Build a pooled connection set and bring the schema up to date.
pub fn establish_pool(database_url: &str) -> StoreResult<SqlitePool> {
  // An in-memory database exists per connection, so it must not be pooled
  // wider than one.
  let max_size = if database_url.contains(":memory:") { 1 } else { 8 };
  establish_pool_with_size(database_url, max_size)
}

pub fn establish_pool_with_size(database_url: &str, max_size: u32) -> StoreResult<SqlitePool> {
  let manager = ConnectionManager::<SqliteConnection>::new(database_url);
  let pool = Pool::builder()
    .max_size(max_size.max(1))
    .connection_customizer(Box::new(ConnectionOptions))
    .build(manager)
    .map_err(|e| StoreError::Pool(e.to_string()))?;

  let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
  conn
    .run_pending_migrations(MIGRATIONS)
    .map_err(|e| StoreError::Migration(e.to_string()))?;

  Ok(pool)
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Query error: {0}")]
  Query(#[from] diesel::result::Error),

  #[error("Connection error: {0}")]
  Connection(#[from] diesel::ConnectionError),

  #[error("Pool error: {0}")]
  Pool(String),

  #[error("Migration error: {0}")]
  Migration(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Runtime error: {0}")]
  Runtime(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_store_error_display_pool() {
    let err = StoreError::Pool("exhausted".to_string());
    assert_eq!(err.to_string(), "Pool error: exhausted");
  }

  #[test]
  fn test_store_error_from_diesel() {
    let err = StoreError::from(diesel::result::Error::NotFound);
    assert!(matches!(err, StoreError::Query(_)));
  }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("Provider error: {0}")]
  Provider(#[from] hq_core::Error),

  #[error("Storage error: {0}")]
  Storage(#[from] hq_store::StoreError),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("IO error: {0}")]
  Io(String),

  #[error("Task error: {0}")]
  Task(String),
}

// Implement conversions manually
impl From<serde_json::Error> for EngineError {
  fn from(err: serde_json::Error) -> Self {
    EngineError::Serialization(err.to_string())
  }
}

impl From<std::io::Error> for EngineError {
  fn from(err: std::io::Error) -> Self {
    EngineError::Io(err.to_string())
  }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_engine_error_display_invalid_input() {
    let err = EngineError::InvalidInput("too many symbols".to_string());
    assert_eq!(err.to_string(), "Invalid input: too many symbols");
  }

  #[test]
  fn test_engine_error_from_provider_error() {
    let err = EngineError::from(hq_core::Error::Http("down".to_string()));
    assert!(matches!(err, EngineError::Provider(_)));
    assert!(err.to_string().contains("HTTP error"));
  }

  #[test]
  fn test_engine_error_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = EngineError::from(io_err);
    assert!(matches!(err, EngineError::Io(_)));
    assert!(err.to_string().contains("file missing"));
  }
}

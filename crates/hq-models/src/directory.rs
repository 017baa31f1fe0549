use serde::{Deserialize, Serialize};

/// One listed security in the symbol directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
  pub code: String,
  pub name: String,
}

/// On-disk shape of the symbol directory cache file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryCacheFile {
  pub codes: Vec<SymbolInfo>,
  pub updated_at: Option<chrono::NaiveDateTime>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_file_round_trip() {
    let file = DirectoryCacheFile {
      codes: vec![SymbolInfo { code: "600519".to_string(), name: "贵州茅台".to_string() }],
      updated_at: None,
    };
    let json = serde_json::to_string(&file).unwrap();
    let parsed: DirectoryCacheFile = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.codes.len(), 1);
    assert_eq!(parsed.codes[0].code, "600519");
  }
}

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Rule keys from a comma-separated `--keys` value; blank entries are skipped.
pub fn split_keys(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|key| {
            let key = key.trim();
            (!key.is_empty()).then(|| key.to_owned())
        })
        .collect()
}

/// Read and deserialize a JSON document, naming the file on failure.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keys_trims_and_skips_blanks() {
        let parts = split_keys(" goal, ,chapter:3,  license:Cook:Adept ");
        assert_eq!(parts, vec!["goal", "chapter:3", "license:Cook:Adept"]);
        assert!(split_keys(" , ").is_empty());
    }

    #[test]
    fn read_json_names_missing_files() {
        let path = std::env::temp_dir().join("fantasylife-tester-missing.json");
        let err = read_json::<serde_json::Value>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("fantasylife-tester-missing.json"));
    }
}

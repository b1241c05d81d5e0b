//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        match self.config.get(section, key).map(|v| v.trim().to_string()) {
            None => Ok(None),
            Some(v) if v.is_empty() => Ok(None),
            Some(v) => Self::parse_bool(&v).map(Some).ok_or(v),
        }
    }

    fn get_keys(&self, section: &str) -> Vec<String> {
        // Sections and keys are lowercased by `Ini::new()`.
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[filters]
price_min = 5
avg_vol_min = 1000000

[selection]
top_n = 20
max_per_sector = 0.3
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("filters", "price_min"), Some("5".to_string()));
        assert_eq!(adapter.get_string("selection", "max_per_sector"), Some("0.3".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[filters]\nprice_min = 5\n").unwrap();
        assert_eq!(adapter.get_string("filters", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[news]\na = true\nb = Yes\nc = 1\nd = false\ne = no\nf = off\ng =\n",
        )
        .unwrap();
        assert_eq!(adapter.get_bool("news", "a"), Ok(Some(true)));
        assert_eq!(adapter.get_bool("news", "b"), Ok(Some(true)));
        assert_eq!(adapter.get_bool("news", "c"), Ok(Some(true)));
        assert_eq!(adapter.get_bool("news", "d"), Ok(Some(false)));
        assert_eq!(adapter.get_bool("news", "e"), Ok(Some(false)));
        assert_eq!(adapter.get_bool("news", "f"), Ok(Some(false)));
        assert_eq!(adapter.get_bool("news", "g"), Ok(None));
        assert_eq!(adapter.get_bool("news", "missing"), Ok(None));
    }

    #[test]
    fn get_bool_rejects_unrecognised_value() {
        let adapter = FileConfigAdapter::from_string("[news]\nenabled = maybe\n").unwrap();
        assert_eq!(adapter.get_bool("news", "enabled"), Err("maybe".to_string()));
    }

    #[test]
    fn get_keys_preserves_declaration_order() {
        let adapter = FileConfigAdapter::from_string(
            "[weights]\ngap = 1.0\nrelvol = 2.0\nanalyst = 0.5\nAvgVol = 0.1\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_keys("weights"),
            vec!["gap", "relvol", "analyst", "avgvol"]
        );
        assert!(adapter.get_keys("missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[news]\nenabled = true\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_bool("news", "enabled"), Ok(Some(true)));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/strategy.ini");
        assert!(result.is_err());
    }
}

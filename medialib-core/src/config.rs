//! Library configuration.
//!
//! Loaded from environment variables with defaults for anything unset or
//! unparsable.

/// Options applied to every fetch and representation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Include hidden assets in fetch results (default: false)
    pub include_hidden_assets: bool,
    /// Maximum number of assets per fetch (default: unlimited)
    pub fetch_limit: Option<usize>,
    /// Allow the store to download cloud-backed assets for representations (default: true)
    pub network_access_allowed: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            include_hidden_assets: false,
            fetch_limit: None,
            network_access_allowed: true,
        }
    }
}

impl LibraryConfig {
    /// Load configuration from environment variables.
    ///
    /// - `MEDIALIB_INCLUDE_HIDDEN` (`true`/`false`)
    /// - `MEDIALIB_FETCH_LIMIT` (positive integer)
    /// - `MEDIALIB_NETWORK_ACCESS` (`true`/`false`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let include_hidden_assets = lookup("MEDIALIB_INCLUDE_HIDDEN")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.include_hidden_assets);

        let fetch_limit = lookup("MEDIALIB_FETCH_LIMIT")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .or(defaults.fetch_limit);

        let network_access_allowed = lookup("MEDIALIB_NETWORK_ACCESS")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.network_access_allowed);

        Self {
            include_hidden_assets,
            fetch_limit,
            network_access_allowed,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> LibraryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LibraryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, LibraryConfig::default());
        assert!(config.network_access_allowed);
        assert!(!config.include_hidden_assets);
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("MEDIALIB_INCLUDE_HIDDEN", "yes"),
            ("MEDIALIB_FETCH_LIMIT", "25"),
            ("MEDIALIB_NETWORK_ACCESS", "false"),
        ]);
        assert!(config.include_hidden_assets);
        assert_eq!(config.fetch_limit, Some(25));
        assert!(!config.network_access_allowed);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("MEDIALIB_INCLUDE_HIDDEN", "maybe"),
            ("MEDIALIB_FETCH_LIMIT", "0"),
        ]);
        assert!(!config.include_hidden_assets);
        assert_eq!(config.fetch_limit, None);
    }
}

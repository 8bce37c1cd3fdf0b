use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_COLS: usize = 18;
pub const DEFAULT_ROWS: usize = 14;
/// Time between fertilizing a vegetable and it turning ripe.
pub const DEFAULT_RIPENING_SECS: u64 = 10;

pub const ENV_COLS: &str = "VEGGIE_PATCH_COLS";
pub const ENV_ROWS: &str = "VEGGIE_PATCH_ROWS";
pub const ENV_RIPENING_SECS: &str = "VEGGIE_PATCH_RIPENING_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GardenConfig {
    pub cols: usize,
    pub rows: usize,
    pub ripening_delay_secs: u64,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            ripening_delay_secs: DEFAULT_RIPENING_SECS,
        }
    }
}

impl GardenConfig {
    pub fn ripening_delay(&self) -> Duration {
        Duration::from_secs(self.ripening_delay_secs)
    }

    /// Parses a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(input: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| format!("Invalid garden config: {e}"))?;
        config.validate()
    }

    /// Defaults overridden by `VEGGIE_PATCH_*` environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        if let Some(cols) = parse_var::<usize, _>(&lookup, ENV_COLS)? {
            config.cols = cols;
        }
        if let Some(rows) = parse_var::<usize, _>(&lookup, ENV_ROWS)? {
            config.rows = rows;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_RIPENING_SECS)? {
            config.ripening_delay_secs = secs;
        }
        config.validate()
    }

    fn validate(self) -> Result<Self, String> {
        if self.cols == 0 || self.rows == 0 {
            return Err(format!(
                "Garden dimensions must be strictly positive, got {}x{}.",
                self.cols, self.rows
            ));
        }
        Ok(self)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{key}={raw:?} is not valid: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_matches_demo_plot() {
        let config = GardenConfig::default();
        assert_eq!((config.cols, config.rows), (18, 14));
        assert_eq!(config.ripening_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GardenConfig::from_json(r#"{ "cols": 5 }"#).unwrap();
        assert_eq!(config.cols, 5);
        assert_eq!(config.rows, DEFAULT_ROWS);
        assert_eq!(config.ripening_delay_secs, DEFAULT_RIPENING_SECS);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let result = GardenConfig::from_json(r#"{ "rows": 0 }"#);
        assert!(result.is_err(), "A zero-row garden must be rejected");
    }

    #[test]
    fn test_env_overrides() {
        let config = GardenConfig::from_lookup(lookup_from(&[
            (ENV_COLS, "3"),
            (ENV_RIPENING_SECS, " 2 "),
        ]))
        .unwrap();
        assert_eq!(config.cols, 3);
        assert_eq!(config.rows, DEFAULT_ROWS);
        assert_eq!(config.ripening_delay_secs, 2);
    }

    #[test]
    fn test_env_garbage_is_reported() {
        let err = GardenConfig::from_lookup(lookup_from(&[(ENV_ROWS, "many")])).unwrap_err();
        assert!(err.contains(ENV_ROWS), "Error must name the variable: {err}");
    }
}

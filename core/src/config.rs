use serde::{Deserialize, Serialize};

/// Query-time tunables shared by the CLI and the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of words in a snippet window.
    #[serde(default = "default_snippet_window")]
    pub snippet_window: usize,
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    /// Upper bound applied to caller-supplied result counts.
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
}

fn default_snippet_window() -> usize { 100 }
fn default_top_n() -> usize { 10 }
fn default_max_top_n() -> usize { 100 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_window: default_snippet_window(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
        }
    }
}

impl SearchConfig {
    /// Clamp a requested result count into `1..=max_top_n`.
    pub fn clamp_top_n(&self, requested: usize) -> usize {
        requested.max(1).min(self.max_top_n.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: SearchConfig = serde_json::from_str(r#"{"snippet_window": 20}"#).unwrap();
        assert_eq!(cfg.snippet_window, 20);
        assert_eq!(cfg.default_top_n, 10);
        assert_eq!(cfg.max_top_n, 100);
    }

    #[test]
    fn clamps_top_n() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.clamp_top_n(0), 1);
        assert_eq!(cfg.clamp_top_n(5), 5);
        assert_eq!(cfg.clamp_top_n(1000), 100);
    }
}

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::models::RecordKind;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Crawl-state persistence and trimming settings
    #[serde(default)]
    pub state: StateSettings,

    /// Per-site URL patterns for classification and key derivation
    #[serde(default = "defaults::sites")]
    pub sites: Vec<SitePattern>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.state.max_urls_per_key == 0 {
            return Err(StateError::validation("state.max_urls_per_key must be > 0"));
        }
        if self.state.run_id_format.trim().is_empty() {
            return Err(StateError::validation("state.run_id_format is empty"));
        }
        if self.state.site_dir.as_os_str().is_empty() {
            return Err(StateError::validation("state.site_dir is empty"));
        }
        for site in &self.sites {
            if site.domain.trim().is_empty() {
                return Err(StateError::validation("sites entry with empty domain"));
            }
            for pattern in [&site.board_pattern, &site.topic_pattern]
                .into_iter()
                .chain(site.comment_pattern.as_ref())
            {
                regex::Regex::new(pattern).map_err(|e| {
                    StateError::validation(format!(
                        "invalid pattern for {}: {e}",
                        site.domain
                    ))
                })?;
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state: StateSettings::default(),
            sites: defaults::sites(),
        }
    }
}

/// Crawl-state persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSettings {
    /// Per-site state directory holding the run pointer and run snapshots
    #[serde(default = "defaults::site_dir")]
    pub site_dir: PathBuf,

    /// chrono format string for generated run ids
    #[serde(default = "defaults::run_id_format")]
    pub run_id_format: String,

    /// Maximum URLs kept per grouping key after trimming
    #[serde(default = "defaults::max_urls_per_key")]
    pub max_urls_per_key: usize,

    /// Record kinds that mark their source URL as scraped
    #[serde(default = "defaults::mark_as_scraped")]
    pub mark_as_scraped: Vec<RecordKind>,
}

impl StateSettings {
    /// Generate a run id with the configured format.
    pub fn run_id(&self) -> String {
        Local::now().format(&self.run_id_format).to_string()
    }
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            site_dir: defaults::site_dir(),
            run_id_format: defaults::run_id_format(),
            max_urls_per_key: defaults::max_urls_per_key(),
            mark_as_scraped: defaults::mark_as_scraped(),
        }
    }
}

/// URL patterns for one crawled site.
///
/// Patterns are anchored regexes over the URL path with named captures:
/// `forum_id` on every pattern, `topic_num` on topic and comment patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePattern {
    /// Domain substring the URL host must contain
    pub domain: String,

    /// Path pattern of a board/forum listing page
    pub board_pattern: String,

    /// Path pattern of a topic/thread page
    pub topic_pattern: String,

    /// Optional path pattern of a single-comment page
    #[serde(default)]
    pub comment_pattern: Option<String>,
}

mod defaults {
    use super::SitePattern;
    use crate::models::RecordKind;
    use std::path::PathBuf;

    // State defaults
    pub fn site_dir() -> PathBuf {
        "state".into()
    }
    pub fn run_id_format() -> String {
        "%Y_%m%d".into()
    }
    pub fn max_urls_per_key() -> usize {
        1000
    }
    pub fn mark_as_scraped() -> Vec<RecordKind> {
        vec![RecordKind::ArchivedTopic, RecordKind::Article]
    }

    // Site defaults: a classic BBS layout, boards at the path root and
    // topics under a reader CGI.
    pub fn sites() -> Vec<SitePattern> {
        vec![SitePattern {
            domain: "5ch.net".to_string(),
            board_pattern: r"^/(?P<forum_id>[a-z0-9]+)/?$".to_string(),
            topic_pattern: r"^/test/read\.cgi/(?P<forum_id>[a-z0-9]+)/(?P<topic_num>\d+)/?$"
                .to_string(),
            comment_pattern: Some(
                r"^/test/read\.cgi/(?P<forum_id>[a-z0-9]+)/(?P<topic_num>\d+)/(?P<comment_num>\d+)/?$"
                    .to_string(),
            ),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_trim_bound() {
        let mut config = Config::default();
        config.state.max_urls_per_key = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_broken_pattern() {
        let mut config = Config::default();
        config.sites[0].topic_pattern = "([unclosed".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [state]
            max_urls_per_key = 50

            [[sites]]
            domain = "forum.example"
            board_pattern = "^/(?P<forum_id>\\w+)/$"
            topic_pattern = "^/(?P<forum_id>\\w+)/(?P<topic_num>\\d+)$"
            "#,
        )
        .unwrap();

        assert_eq!(config.state.max_urls_per_key, 50);
        assert_eq!(config.state.run_id_format, "%Y_%m%d");
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].comment_pattern, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn mark_as_scraped_parses_kind_names() {
        let config: Config = toml::from_str(
            r#"
            [state]
            mark_as_scraped = ["archived_topic", "article"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.state.mark_as_scraped,
            vec![RecordKind::ArchivedTopic, RecordKind::Article]
        );
    }
}

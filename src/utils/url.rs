// src/utils/url.rs

//! URL classification and grouping-key derivation.
//!
//! Sites describe their board/topic/comment layouts as path regexes with
//! named captures (`forum_id`, `topic_num`, `comment_num`). Compiled rules
//! classify candidate URLs and derive the grouping keys under which crawl
//! history is partitioned.

use regex::Regex;
use url::Url;

use crate::error::{Result, StateError};
use crate::gate::{ClassifyFn, KeyFn, UrlKind};
use crate::models::SitePattern;

#[derive(Debug, Clone, Copy)]
enum PatternKind {
    Board,
    Topic,
    Comment,
}

#[derive(Debug, Clone)]
struct CompiledSite {
    domain: String,
    board: Regex,
    topic: Regex,
    comment: Option<Regex>,
}

/// Compiled per-site URL rules.
#[derive(Debug, Clone, Default)]
pub struct SiteRules {
    sites: Vec<CompiledSite>,
}

impl SiteRules {
    /// Compile configured site patterns.
    pub fn compile(patterns: &[SitePattern]) -> Result<Self> {
        let mut sites = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let compile = |p: &str| {
                Regex::new(p).map_err(|e| {
                    StateError::config(format!("invalid pattern for {}: {e}", pattern.domain))
                })
            };
            sites.push(CompiledSite {
                domain: pattern.domain.clone(),
                board: compile(&pattern.board_pattern)?,
                topic: compile(&pattern.topic_pattern)?,
                comment: pattern
                    .comment_pattern
                    .as_deref()
                    .map(compile)
                    .transpose()?,
            });
        }
        Ok(Self { sites })
    }

    /// Run the matching site's pattern of the given kind against the URL
    /// path, returning the requested capture groups.
    fn capture(&self, url: &str, kind: PatternKind, groups: &[&str]) -> Option<Vec<String>> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        for site in &self.sites {
            if !host.contains(&site.domain) {
                continue;
            }
            let regex = match kind {
                PatternKind::Board => Some(&site.board),
                PatternKind::Topic => Some(&site.topic),
                PatternKind::Comment => site.comment.as_ref(),
            };
            let Some(regex) = regex else { continue };
            if let Some(captures) = regex.captures(parsed.path()) {
                let values: Option<Vec<String>> = groups
                    .iter()
                    .map(|g| captures.name(g).map(|m| m.as_str().to_string()))
                    .collect();
                return values;
            }
        }
        None
    }

    /// Whether the URL is a board/forum listing page.
    pub fn is_board_url(&self, url: &str) -> bool {
        self.capture(url, PatternKind::Board, &[]).is_some()
    }

    /// Whether the URL is a topic/thread page.
    pub fn is_topic_url(&self, url: &str) -> bool {
        self.capture(url, PatternKind::Topic, &[]).is_some()
    }

    /// Whether the URL is a single-comment page.
    pub fn is_comment_url(&self, url: &str) -> bool {
        self.capture(url, PatternKind::Comment, &[]).is_some()
    }

    /// Listing/detail split for the response-classification policy.
    pub fn classify(&self, url: &str) -> UrlKind {
        if self.is_board_url(url) {
            UrlKind::Listing
        } else {
            UrlKind::Detail
        }
    }

    /// Grouping key of a URL: `<sld>_<forum_id>`.
    ///
    /// Matches board, topic and comment URLs; `None` for anything else.
    pub fn forum_id_from_url(&self, url: &str) -> Option<String> {
        let captured = self
            .capture(url, PatternKind::Board, &["forum_id"])
            .or_else(|| self.capture(url, PatternKind::Topic, &["forum_id"]))
            .or_else(|| self.capture(url, PatternKind::Comment, &["forum_id"]))?;
        let sld = sld_from_url(url)?;
        Some(format!("{sld}_{}", captured[0]))
    }

    /// Topic identity of a URL: `<sld>_<forum_id>_<topic_num>`.
    pub fn topic_id_from_url(&self, url: &str) -> Option<String> {
        let captured = self
            .capture(url, PatternKind::Topic, &["forum_id", "topic_num"])
            .or_else(|| self.capture(url, PatternKind::Comment, &["forum_id", "topic_num"]))?;
        let sld = sld_from_url(url)?;
        Some(format!("{sld}_{}_{}", captured[0], captured[1]))
    }

    /// Grouping-key closure for the request gate.
    pub fn key_fn(&self) -> KeyFn {
        let rules = self.clone();
        Box::new(move |url| rules.forum_id_from_url(url))
    }

    /// Classifier closure for the request gate.
    pub fn classify_fn(&self) -> ClassifyFn {
        let rules = self.clone();
        Box::new(move |url| rules.classify(url))
    }
}

/// Second-level domain of a URL, e.g. `5ch` for `https://mao.5ch.net/bass/`.
pub fn sld_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    Some(labels[labels.len() - 2].to_string())
}

/// Extract the host name from an absolute http(s) URL.
pub fn extract_hostname(url: &str) -> Option<String> {
    if !url.starts_with("http") {
        return None;
    }
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    fn rules() -> SiteRules {
        SiteRules::compile(&Config::default().sites).unwrap()
    }

    #[test]
    fn classifies_board_and_topic_urls() {
        let rules = rules();
        assert!(rules.is_board_url("https://mao.5ch.net/bass/"));
        assert!(!rules.is_board_url("https://mao.5ch.net/test/read.cgi/bass/1579966729/"));

        assert!(rules.is_topic_url("https://mao.5ch.net/test/read.cgi/bass/1579966729/"));
        assert!(!rules.is_topic_url("https://mao.5ch.net/bass/"));

        assert_eq!(rules.classify("https://mao.5ch.net/bass/"), UrlKind::Listing);
        assert_eq!(
            rules.classify("https://mao.5ch.net/test/read.cgi/bass/1579966729/"),
            UrlKind::Detail
        );
        // Unknown layouts fall back to detail handling.
        assert_eq!(rules.classify("https://other.example/whatever"), UrlKind::Detail);
    }

    #[test]
    fn wrong_domain_does_not_match() {
        let rules = rules();
        assert!(!rules.is_board_url("https://elsewhere.example/bass/"));
        assert_eq!(rules.forum_id_from_url("https://elsewhere.example/bass/"), None);
    }

    #[test]
    fn forum_id_joins_sld_and_capture() {
        let rules = rules();
        assert_eq!(
            rules.forum_id_from_url("https://mao.5ch.net/bass/"),
            Some("5ch_bass".to_string())
        );
        assert_eq!(
            rules.forum_id_from_url("https://egg.5ch.net/test/read.cgi/ruins/1491723120/"),
            Some("5ch_ruins".to_string())
        );
        assert_eq!(rules.forum_id_from_url("https://mao.5ch.net/"), None);
    }

    #[test]
    fn topic_id_includes_topic_number() {
        let rules = rules();
        assert_eq!(
            rules.topic_id_from_url("https://mao.5ch.net/test/read.cgi/bass/1579966729/"),
            Some("5ch_bass_1579966729".to_string())
        );
        assert_eq!(rules.topic_id_from_url("https://mao.5ch.net/bass/"), None);
    }

    #[test]
    fn sld_extraction() {
        assert_eq!(sld_from_url("https://mao.5ch.net/bass/"), Some("5ch".to_string()));
        assert_eq!(
            sld_from_url("https://blog.livedoor.jp/some_blog/"),
            Some("livedoor".to_string())
        );
        assert_eq!(sld_from_url("https://localhost/x"), None);
        assert_eq!(sld_from_url("not a url"), None);
    }

    #[test]
    fn hostname_extraction() {
        assert_eq!(
            extract_hostname("https://matsuri.5ch.net/nissin"),
            Some("matsuri.5ch.net".to_string())
        );
        assert_eq!(extract_hostname("/relative/path"), None);
    }
}

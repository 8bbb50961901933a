//! # Source Registry
//!
//! Read-only roster of monitored competitors, fixed at startup.
//!
//! - Loads from TOML (`[[sources]]` tables) or a JSON array.
//! - Names are unique; lookup is case-insensitive and tolerant of
//!   punctuation/whitespace noise.
//! - Falls back to a built-in seed when no roster file exists.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_REGISTRY_PATH: &str = "MONITOR_REGISTRY_PATH";

/// Escalation tier of a source. Only HIGH sources raise alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    pub priority: Priority,
}

impl MonitoredSource {
    pub fn new<I, S>(
        name: impl Into<String>,
        url: impl Into<String>,
        keywords: I,
        priority: Priority,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            url: url.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            priority,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<MonitoredSource>,
}

impl SourceRegistry {
    /// Build a registry, rejecting blank or duplicate names.
    pub fn from_sources(sources: Vec<MonitoredSource>) -> Result<Self> {
        let mut seen = HashSet::new();
        for s in &sources {
            let key = normalize(&s.name);
            if key.is_empty() {
                bail!("registry entry with url {} has an empty name", s.url);
            }
            if !seen.insert(key) {
                bail!("duplicate source name in registry: {}", s.name);
            }
        }
        Ok(Self { sources })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading registry from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let sources = parse_sources(&content, ext.as_str())
            .with_context(|| format!("parsing registry {}", path.display()))?;
        Self::from_sources(sources)
    }

    /// Load using env var + fallbacks:
    /// 1) $MONITOR_REGISTRY_PATH
    /// 2) config/registry.toml
    /// 3) config/registry.json
    /// 4) built-in seed (Korean site keywords plus English equivalents)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_REGISTRY_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_REGISTRY_PATH} points to non-existent path"));
        }
        for candidate in ["config/registry.toml", "config/registry.json"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default_seed())
    }

    /// Built-in roster: the four firms tracked since the first release.
    pub fn default_seed() -> Self {
        Self {
            sources: vec![
                MonitoredSource::new(
                    "Kim & Chang",
                    "https://www.kimchang.com",
                    [
                        "채용", "뉴스", "공지사항", "사건", "수임",
                        "recruiting", "news", "notices", "cases", "engagements",
                    ],
                    Priority::High,
                ),
                MonitoredSource::new(
                    "Bae, Kim & Lee",
                    "https://www.shinkim.com",
                    [
                        "소식", "인사", "업무영역", "성과",
                        "news", "people", "practice areas", "achievements",
                    ],
                    Priority::High,
                ),
                MonitoredSource::new(
                    "Lee & Ko",
                    "https://www.kwangjoong.co.kr",
                    [
                        "변호사", "법무자문", "송무", "기업법무",
                        "attorneys", "advisory", "litigation", "corporate",
                    ],
                    Priority::Medium,
                ),
                MonitoredSource::new(
                    "Jipyong",
                    "https://www.jipyong.com",
                    [
                        "전문분야", "변호사소개", "최신소식",
                        "expertise", "attorney profiles", "latest news",
                    ],
                    Priority::Medium,
                ),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&MonitoredSource> {
        let key = normalize(name);
        self.sources.iter().find(|s| normalize(&s.name) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitoredSource> {
        self.sources.iter()
    }

    pub fn sources(&self) -> &[MonitoredSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<MonitoredSource>> {
    #[derive(Deserialize)]
    struct TomlRegistry {
        #[serde(default)]
        sources: Vec<MonitoredSource>,
    }

    if hint_ext == "toml" {
        let v: TomlRegistry = toml::from_str(s)?;
        return Ok(v.sources);
    }
    if let Ok(v) = serde_json::from_str::<Vec<MonitoredSource>>(s) {
        return Ok(v);
    }
    match toml::from_str::<TomlRegistry>(s) {
        Ok(v) => Ok(v.sources),
        Err(_) => Err(anyhow!("unsupported registry format")),
    }
}

/// Lowercase, turn separators into spaces, collapse whitespace.
fn normalize(s: &str) -> String {
    let out = s
        .trim()
        .to_lowercase()
        .replace(['—', '–', '-', '_', '/', '\\', '.', ',', '\''], " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn seed_has_two_high_two_medium() {
        let r = SourceRegistry::default_seed();
        assert_eq!(r.len(), 4);
        let high = r.iter().filter(|s| s.priority == Priority::High).count();
        assert_eq!(high, 2);
    }

    #[test]
    fn seed_keeps_korean_keywords() {
        let r = SourceRegistry::default_seed();
        let kc = r.get("Kim & Chang").unwrap();
        assert!(kc.keywords.contains("채용"));
        assert!(kc.keywords.contains("recruiting"));
        assert!(r.get("Jipyong").unwrap().keywords.contains("최신소식"));
        assert!(r.iter().all(|s| s.keywords.iter().any(|k| !k.is_ascii())));
    }

    #[test]
    fn shipped_roster_matches_seed() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/registry.toml");
        let shipped = SourceRegistry::load_from(&path).unwrap();
        assert_eq!(shipped.sources(), SourceRegistry::default_seed().sources());
    }

    #[test]
    fn lookup_is_case_and_punctuation_insensitive() {
        let r = SourceRegistry::default_seed();
        assert_eq!(r.get("kim & chang").unwrap().url, "https://www.kimchang.com");
        assert_eq!(r.get("  BAE KIM & LEE ").unwrap().name, "Bae, Kim & Lee");
        assert!(r.get("Unknown LLP").is_none());
    }

    #[test]
    fn duplicates_are_rejected() {
        let a = MonitoredSource::new("Acme", "https://a", ["x"], Priority::Low);
        let b = MonitoredSource::new("ACME", "https://b", ["y"], Priority::High);
        assert!(SourceRegistry::from_sources(vec![a, b]).is_err());
    }

    #[test]
    fn empty_registry_is_valid() {
        let r = SourceRegistry::from_sources(vec![]).unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn parses_toml_and_json() {
        let toml = r#"
            [[sources]]
            name = "Acme"
            url = "https://acme.test"
            keywords = ["hiring", "news"]
            priority = "HIGH"
        "#;
        let json = r#"[{"name":"Beta","url":"https://beta.test","priority":"LOW"}]"#;
        let t = parse_sources(toml, "toml").unwrap();
        assert_eq!(t[0].priority, Priority::High);
        assert!(t[0].keywords.contains("hiring"));
        let j = parse_sources(json, "json").unwrap();
        assert_eq!(j[0].name, "Beta");
        assert!(j[0].keywords.is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_seed() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_REGISTRY_PATH);

        let seeded = SourceRegistry::load_default().unwrap();
        assert_eq!(seeded.len(), 4);

        let p = tmp.path().join("roster.json");
        fs::write(
            &p,
            r#"[{"name":"Solo","url":"https://solo.test","priority":"MEDIUM"}]"#,
        )
        .unwrap();
        env::set_var(ENV_REGISTRY_PATH, p.display().to_string());
        let custom = SourceRegistry::load_default().unwrap();
        assert_eq!(custom.len(), 1);
        env::remove_var(ENV_REGISTRY_PATH);

        env::set_current_dir(&old).unwrap();
    }
}

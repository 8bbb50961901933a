use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

use crate::fetch::types::{ChangeCounters, Observation, SourceFetcher};
use crate::registry::MonitoredSource;

const NEWS_MARKERS: &[&str] = &[
    "news", "press", "announcement", "media", "insight", "뉴스", "소식", "공지", "보도",
];
const JOB_MARKERS: &[&str] = &[
    "career", "recruit", "hiring", "job", "vacanc", "intern", "채용", "모집", "인턴",
];

/// Headlines kept in `new_content`.
const MAX_NEW_CONTENT: usize = 3;

/// Fetches the source's landing page and scans it for keywords.
///
/// Headings, list items and links that mention a keyword count as website
/// updates; those that also carry a news or recruiting marker word count as
/// news articles or job postings.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("competitor-monitor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }

    /// Pure part of the fetch: derive counters from a page body.
    pub fn observe_html(source: &MonitoredSource, html: &str) -> Observation {
        let keywords: Vec<String> = source
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let text = clean_text(&strip_scripts(html)).to_lowercase();
        let keyword_matches = keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as u32)
            .sum();

        let relevant: Vec<String> = extract_headlines(html)
            .into_iter()
            .filter(|h| {
                let lower = h.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            })
            .collect();

        let count_with = |markers: &[&str]| {
            relevant
                .iter()
                .filter(|h| {
                    let lower = h.to_lowercase();
                    markers.iter().any(|m| lower.contains(m))
                })
                .count() as u32
        };

        Observation {
            keyword_matches,
            changes: ChangeCounters {
                website_updates: relevant.len() as u32,
                news_articles: count_with(NEWS_MARKERS),
                job_postings: count_with(JOB_MARKERS),
            },
            new_content: relevant
                .iter()
                .take(MAX_NEW_CONTENT)
                .map(|h| format!("{}: {}", source.name, h))
                .collect(),
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, source: &MonitoredSource) -> Result<Observation> {
        let body = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("GET {}", source.url))?
            .error_for_status()
            .with_context(|| format!("non-2xx from {}", source.url))?
            .text()
            .await
            .context("reading page body")?;
        Ok(Self::observe_html(source, &body))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn strip_scripts(html: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>").expect("static regex")
    });
    re.replace_all(html, " ").into_owned()
}

/// Text of headings, list items, links and the title, normalized and
/// de-duplicated in document order.
fn extract_headlines(html: &str) -> Vec<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:h[1-6]|a|li|title)\b[^>]*>(.*?)</(?:h[1-6]|a|li|title)>")
            .expect("static regex")
    });

    let mut seen = HashSet::new();
    re.captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| normalize_text(m.as_str()))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Strip tags and entities, capped at 300 chars for headline-sized snippets.
pub fn normalize_text(s: &str) -> String {
    let out = clean_text(s);
    if out.chars().count() > 300 {
        out.chars().take(300).collect()
    } else {
        out
    }
}

/// Strip tags, decode entities, collapse whitespace.
fn clean_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    let out = re_tags.replace_all(s, " ");

    let out = html_escape::decode_html_entities(&out)
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Priority;

    const PAGE: &str = r#"
        <html><head><title>Acme Law</title>
        <style>.news { color: red }</style>
        <script>var news = "hiring";</script></head>
        <body>
          <h2>Latest <b>news</b>: Acme advises on merger</h2>
          <ul>
            <li><a href="/careers">Careers &amp; recruiting: associate hiring</a></li>
            <li>Office relocation</li>
          </ul>
          <p>More news soon.</p>
        </body></html>
    "#;

    fn src() -> MonitoredSource {
        MonitoredSource::new(
            "Acme",
            "https://acme.test",
            ["news", "recruiting"],
            Priority::High,
        )
    }

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        assert_eq!(
            normalize_text("  <b>Hello</b>&nbsp;&nbsp; \u{201C}world\u{201D} "),
            r#"Hello "world""#
        );
    }

    #[test]
    fn long_text_is_capped_but_fully_scanned() {
        let body = format!("<p>{}</p><p>news</p>", "filler ".repeat(100));
        assert_eq!(normalize_text(&body).chars().count(), 300);
        let obs = HttpFetcher::observe_html(&src(), &body);
        assert_eq!(obs.keyword_matches, 1);
    }

    #[test]
    fn korean_page_is_classified() {
        let kc = MonitoredSource::new(
            "Kim & Chang",
            "https://www.kimchang.com",
            ["채용", "뉴스"],
            Priority::High,
        );
        let page = "<h2>2025년 하반기 신입 변호사 채용 공고</h2>\
                    <li><a>최신 뉴스: 대형 인수합병 자문</a></li>\
                    <p>사무소 소개</p>";
        let obs = HttpFetcher::observe_html(&kc, page);
        assert_eq!(obs.keyword_matches, 2);
        assert_eq!(obs.changes.job_postings, 1);
        assert_eq!(obs.changes.news_articles, 1);
        assert_eq!(obs.changes.website_updates, 2);
    }

    #[test]
    fn headlines_are_deduplicated() {
        let h = extract_headlines("<a>One</a><li><a>One</a></li><h1>Two</h1>");
        assert_eq!(h, vec!["One".to_string(), "Two".to_string()]);
    }

    #[test]
    fn observe_counts_keywords_and_classifies_headlines() {
        let obs = HttpFetcher::observe_html(&src(), PAGE);
        // "news" twice in visible text (heading + paragraph), "recruiting" once.
        assert_eq!(obs.keyword_matches, 3);
        assert_eq!(obs.changes.news_articles, 1);
        assert_eq!(obs.changes.job_postings, 1);
        assert!(obs.changes.website_updates >= 2);
        assert!(obs.new_content.len() <= MAX_NEW_CONTENT);
        assert!(obs.new_content[0].starts_with("Acme: "));
    }
}

//! Web search via the Brave Search API

use crate::{Error, Result};

const SEARCH_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(serde::Deserialize)]
struct SearchResponse {
    web: Option<WebResults>,
}

#[derive(serde::Deserialize)]
struct WebResults {
    results: Vec<WebResult>,
}

#[derive(serde::Deserialize)]
struct WebResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

/// Answers search requests with the top web result
pub struct SearchSkill {
    client: reqwest::Client,
    api_key: String,
}

impl SearchSkill {
    /// Create a search skill
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Brave API key required for search".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }

    /// Spoken summary of the top result for `query`
    ///
    /// # Errors
    ///
    /// Returns error if the search request fails
    pub async fn search(&self, query: &str) -> Result<String> {
        tracing::debug!(query = %query, "running web search");

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query), ("count", "3")])
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Skill(format!("search error {status}: {body}")));
        }

        let parsed: SearchResponse = response.json().await?;
        let top = parsed
            .web
            .and_then(|w| w.results.into_iter().next())
            .ok_or_else(|| Error::Skill("search returned no results".to_string()))?;

        let snippet = strip_tags(&top.description);
        if snippet.is_empty() {
            Ok(format!("Top result: {} ({})", top.title, top.url))
        } else {
            Ok(format!("Top result: {}. {} ({})", top.title, snippet, top.url))
        }
    }
}

/// Brave descriptions carry `<strong>` highlighting; strip it for speech
fn strip_tags(text: &str) -> String {
    static TAG_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| regex::Regex::new(r"<[^>]*>").expect("valid regex"));
    tag_re.replace_all(text, "").trim().to_string()
}

/// Pull the query out of a search request
#[must_use]
pub fn extract_query(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for prefix in [
        "search for ",
        "search ",
        "look up ",
        "find info about ",
        "google ",
    ] {
        if let Some(idx) = lower.find(prefix) {
            let query = text[idx + prefix.len()..].trim();
            if !query.is_empty() {
                return Some(query.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_query() {
        assert_eq!(
            extract_query("search for rust iterators"),
            Some("rust iterators".to_string())
        );
        assert_eq!(
            extract_query("can you look up the tallest mountain"),
            Some("the tallest mountain".to_string())
        );
        assert_eq!(extract_query("search "), None);
        assert_eq!(extract_query("tell me a story"), None);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<strong>Rust</strong> is a language"),
            "Rust is a language"
        );
    }
}

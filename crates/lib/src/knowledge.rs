//! Knowledge-search collaborator client and result formatting.
//!
//! When no built-in intent matches, the dispatcher queries this service and
//! formats up to three results into a reply. Transport or API failures never
//! reach the user as errors: they degrade to a fixed apology message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How many results to request from the collaborator.
const SEARCH_LIMIT: usize = 5;

/// How many results make it into the reply.
const REPLY_RESULT_LIMIT: usize = 3;

/// Content snippet length in the reply, in characters.
const SNIPPET_CHARS: usize = 100;

pub const SEARCH_UNAVAILABLE: &str = "抱歉，搜尋服務暫時不可用。請聯繫客服。";
pub const NO_RESULTS: &str = "沒有找到相關資訊。請嘗試其他問題，或聯繫客服。";

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("knowledge api error: {0}")]
    Api(String),
    #[error("knowledge api url not configured")]
    Unconfigured,
}

/// One search hit, in the order returned by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Search capability the dispatcher depends on (kept narrow for test doubles).
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, KnowledgeError>;
}

/// HTTP client for the knowledge-search service.
#[derive(Clone)]
pub struct KnowledgeClient {
    base_url: Option<String>,
    client: reqwest::Client,
}

impl KnowledgeClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { base_url, client }
    }

    fn base_url(&self) -> Result<&str, KnowledgeError> {
        self.base_url.as_deref().ok_or(KnowledgeError::Unconfigured)
    }

    /// GET `<base>/stats` — collaborator statistics, passed through as JSON.
    pub async fn stats(&self) -> Result<serde_json::Value, KnowledgeError> {
        let url = format!("{}/stats", self.base_url()?);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(KnowledgeError::Api(format!("{} {}", status, body)));
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl KnowledgeSearch for KnowledgeClient {
    /// POST `{query, limit}` to the base URL; requires HTTP success and
    /// `status == "success"` in the body.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, KnowledgeError> {
        let url = self.base_url()?.to_string();
        let body = SearchRequest {
            query,
            limit: SEARCH_LIMIT,
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(KnowledgeError::Api(format!("{} {}", status, body)));
        }
        let data: SearchResponse = res.json().await?;
        if data.status != "success" {
            return Err(KnowledgeError::Api(format!("status {}", data.status)));
        }
        log::debug!("knowledge search '{}' returned {} results", query, data.results.len());
        Ok(data.results)
    }
}

/// Truncate to at most `max` characters, appending "..." when cut.
fn snippet(content: &str, max: usize) -> String {
    let mut chars = content.char_indices();
    match chars.nth(max) {
        None => content.to_string(),
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
    }
}

/// Format search results into a reply: header, up to three titled snippets,
/// footer. Deterministic given the result sequence.
pub fn format_results(results: &[SearchResult]) -> String {
    let mut formatted = String::from("🔍 相關資訊：\n\n");
    for result in results.iter().take(REPLY_RESULT_LIMIT) {
        formatted.push_str(&format!("📄 {}\n", result.title));
        formatted.push_str(&snippet(&result.content, SNIPPET_CHARS));
        formatted.push_str("\n\n");
    }
    formatted.push_str("💡 如需更多資訊，請聯繫客服。");
    formatted
}

/// Query the collaborator and format the outcome. Errors degrade to the
/// fixed unavailable message, zero hits to the no-results message.
pub async fn search_and_format(search: &dyn KnowledgeSearch, query: &str) -> String {
    match search.search(query).await {
        Err(e) => {
            log::warn!("knowledge search failed: {}", e);
            SEARCH_UNAVAILABLE.to_string()
        }
        Ok(results) if results.is_empty() => NO_RESULTS.to_string(),
        Ok(results) => format_results(&results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, content: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            content: content.to_string(),
            score: 0.9,
            source: "kb".to_string(),
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl KnowledgeSearch for FailingSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, KnowledgeError> {
            Err(KnowledgeError::Api("boom".to_string()))
        }
    }

    struct FixedSearch(Vec<SearchResult>);

    #[async_trait]
    impl KnowledgeSearch for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, KnowledgeError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn long_content_truncates_to_100_chars() {
        let long = "字".repeat(150);
        let formatted = format_results(&[result("安全須知", &long)]);
        let expected = format!("📄 安全須知\n{}...", "字".repeat(100));
        assert!(formatted.contains(&expected));
        assert!(!formatted.contains(&"字".repeat(101)));
    }

    #[test]
    fn short_content_is_not_truncated() {
        let formatted = format_results(&[result("t", "short")]);
        assert!(formatted.contains("short\n\n"));
        assert!(!formatted.contains("short..."));
    }

    #[test]
    fn exactly_100_chars_is_not_truncated() {
        let exact = "a".repeat(100);
        let formatted = format_results(&[result("t", &exact)]);
        assert!(!formatted.contains("..."));
    }

    #[test]
    fn at_most_three_results_are_formatted() {
        let results: Vec<_> = (0..5).map(|i| result(&format!("r{i}"), "c")).collect();
        let formatted = format_results(&results);
        assert!(formatted.contains("📄 r0"));
        assert!(formatted.contains("📄 r2"));
        assert!(!formatted.contains("📄 r3"));
        assert!(formatted.starts_with("🔍 相關資訊：\n\n"));
        assert!(formatted.ends_with("💡 如需更多資訊，請聯繫客服。"));
    }

    #[tokio::test]
    async fn failure_degrades_to_unavailable_message() {
        let reply = search_and_format(&FailingSearch, "anything").await;
        assert_eq!(reply, SEARCH_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_results_degrade_to_no_results_message() {
        let reply = search_and_format(&FixedSearch(Vec::new()), "anything").await;
        assert_eq!(reply, NO_RESULTS);
    }

    #[tokio::test]
    async fn unconfigured_client_reports_unavailable() {
        let client = KnowledgeClient::new(None);
        let reply = search_and_format(&client, "anything").await;
        assert_eq!(reply, SEARCH_UNAVAILABLE);
    }
}

//! Category and subcategory vocabulary
//!
//! The set of valid category and subcategory names lives on the remote API and
//! changes independently of this tool. A [`VocabularySnapshot`] is fetched once
//! per run, before any row is parsed, and shared read-only by every file task.

use crate::constants::CATEGORIES_ENDPOINT;
use crate::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Immutable category/subcategory name sets for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularySnapshot {
    categories: HashSet<String>,
    subcategories: HashSet<String>,
}

impl VocabularySnapshot {
    pub fn new<C, S>(categories: C, subcategories: S) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            subcategories: subcategories.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive category membership
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains(name)
    }

    /// Exact, case-sensitive subcategory membership
    pub fn has_subcategory(&self, name: &str) -> bool {
        self.subcategories.contains(name)
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn subcategory_count(&self) -> usize {
        self.subcategories.len()
    }
}

/// Anything that can supply the vocabulary at session start
pub trait VocabularySource {
    fn fetch_all_categories(&self) -> impl Future<Output = Result<VocabularySnapshot>> + Send;
}

/// A fixed vocabulary, for offline runs and tests
impl VocabularySource for VocabularySnapshot {
    async fn fetch_all_categories(&self) -> Result<VocabularySnapshot> {
        Ok(self.clone())
    }
}

/// Response envelope of the categories endpoint
#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    data: CategoriesPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesPayload {
    categories: Vec<String>,
    sub_categories: Vec<String>,
}

/// Fetches the vocabulary from the resource directory API
#[derive(Debug, Clone)]
pub struct HttpVocabularySource {
    client: Client,
    api_url: String,
}

impl HttpVocabularySource {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), CATEGORIES_ENDPOINT)
    }
}

impl VocabularySource for HttpVocabularySource {
    async fn fetch_all_categories(&self) -> Result<VocabularySnapshot> {
        let url = self.endpoint();
        info!("Fetching category vocabulary from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Failed to fetch categories from {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::vocabulary(format!(
                "Category endpoint {url} returned status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read categories from {url}"), e))?;

        let snapshot = parse_categories_response(&body)?;
        debug!(
            "Loaded {} categories and {} subcategories",
            snapshot.category_count(),
            snapshot.subcategory_count()
        );
        Ok(snapshot)
    }
}

/// Decode the categories endpoint body into a snapshot
pub fn parse_categories_response(body: &str) -> Result<VocabularySnapshot> {
    let response: CategoriesResponse = serde_json::from_str(body)
        .map_err(|e| Error::vocabulary(format!("Malformed categories response: {e}")))?;

    Ok(VocabularySnapshot::new(
        response.data.categories,
        response.data.sub_categories,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_exact() {
        let snapshot = VocabularySnapshot::new(["Tutoring"], ["Math"]);
        assert!(snapshot.has_category("Tutoring"));
        assert!(!snapshot.has_category("tutoring"));
        assert!(!snapshot.has_category("Math"));
        assert!(snapshot.has_subcategory("Math"));
    }

    #[test]
    fn test_parse_categories_response() {
        let body = r#"{"data": {"categories": ["Tutoring", "Camps"], "subCategories": ["Math"]}}"#;
        let snapshot = parse_categories_response(body).unwrap();
        assert_eq!(snapshot.category_count(), 2);
        assert_eq!(snapshot.subcategory_count(), 1);
        assert!(snapshot.has_category("Camps"));
    }

    #[test]
    fn test_parse_categories_response_rejects_garbage() {
        let err = parse_categories_response(r#"{"data": []}"#).unwrap_err();
        assert!(matches!(err, Error::Vocabulary { .. }));
    }

    #[tokio::test]
    async fn test_static_snapshot_source() {
        let snapshot = VocabularySnapshot::new(["A"], ["B"]);
        let fetched = snapshot.fetch_all_categories().await.unwrap();
        assert_eq!(fetched, snapshot);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let source =
            HttpVocabularySource::new("http://localhost:8080/api/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(source.endpoint(), "http://localhost:8080/api/category/all");
    }
}

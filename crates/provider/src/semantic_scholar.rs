//! Semantic Scholar graph API client
//!
//! Calls `GET {base}/paper/search`. An API key raises the outbound request
//! quota; without one the client self-limits to the public rate. The API
//! returns papers in relevance order without scores, so the relevance signal
//! is the reciprocal of the result position.

use crate::{ProviderResponse, ProviderStatus, SearchProvider};
use async_trait::async_trait;
use citescout_common::config::ProviderConfig;
use citescout_common::errors::ProviderError;
use citescout_common::metrics::PROVIDER_REQUESTS_TOTAL;
use citescout_common::model::{PaperCandidate, Query};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

/// Fields requested from the paper search endpoint.
const SEARCH_FIELDS: &str =
    "title,authors,year,venue,externalIds,abstract,url,openAccessPdf,citationCount";

pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    limiter: DefaultDirectRateLimiter,
    fetch_limit: usize,
    timeout_ms: u64,
}

impl SemanticScholarClient {
    pub fn new(config: &ProviderConfig, fetch_limit: usize) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let rps = if config.api_key.is_some() {
            config.requests_per_second_with_key
        } else {
            config.requests_per_second_without_key
        };
        let quota = Quota::per_second(NonZeroU32::new(rps.max(1)).expect("non-zero rate"));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            limiter: RateLimiter::direct(quota),
            fetch_limit,
            timeout_ms: config.timeout_secs * 1000,
        })
    }

    fn request_params(&self, query: &Query) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.text()),
            ("limit", self.fetch_limit.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];
        if let Some((min, max)) = query.filters.year_range {
            params.push(("year", format!("{}-{}", min, max)));
        }
        if !query.filters.fields_of_study.is_empty() {
            let fields: Vec<&str> = query
                .filters
                .fields_of_study
                .iter()
                .map(String::as_str)
                .collect();
            params.push(("fieldsOfStudy", fields.join(",")));
        }
        params
    }
}

#[async_trait]
impl SearchProvider for SemanticScholarClient {
    async fn search(&self, query: &Query) -> Result<ProviderResponse, ProviderError> {
        self.limiter.until_ready().await;
        counter!(PROVIDER_REQUESTS_TOTAL).increment(1);

        let url = format!("{}/paper/search", self.base_url);
        let mut request = self.client.get(&url).query(&self.request_params(query));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                ProviderError::Http(err)
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable {
                message: format!("HTTP {}", status),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|err| {
            ProviderError::Malformed {
                message: err.to_string(),
            }
        })?;

        let papers: Vec<PaperCandidate> = body
            .data
            .into_iter()
            .enumerate()
            .filter_map(|(rank, paper)| paper.into_candidate(rank))
            .collect();

        debug!(
            query = %query.text(),
            sentence_index = query.sentence_index,
            papers = papers.len(),
            "provider search complete"
        );

        Ok(ProviderResponse {
            papers,
            status: ProviderStatus::Ok,
        })
    }

    fn name(&self) -> &str {
        "semantic_scholar"
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<ApiPaper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPaper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<ApiAuthor>,
    year: Option<i32>,
    venue: Option<String>,
    url: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    citation_count: Option<u32>,
    #[serde(default)]
    external_ids: Option<HashMap<String, serde_json::Value>>,
    open_access_pdf: Option<ApiOpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOpenAccessPdf {
    url: Option<String>,
}

impl ApiPaper {
    /// Convert one API record at result position `rank` (0-based). Records
    /// without an id are dropped.
    fn into_candidate(self, rank: usize) -> Option<PaperCandidate> {
        let id = self.paper_id?;
        let doi = self
            .external_ids
            .as_ref()
            .and_then(|ids| ids.get("DOI"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let open_access = self.open_access_pdf.is_some();
        let url = self
            .url
            .or_else(|| self.open_access_pdf.and_then(|pdf| pdf.url));

        Some(PaperCandidate {
            id,
            title: self.title,
            authors: self.authors.into_iter().filter_map(|a| a.name).collect(),
            year: self.year,
            venue: self.venue.filter(|v| !v.is_empty()),
            doi,
            url,
            abstract_text: self.abstract_text,
            citation_count: self.citation_count.unwrap_or(0),
            open_access,
            provider_relevance_score: 1.0 / (1.0 + rank as f32),
        })
    }
}

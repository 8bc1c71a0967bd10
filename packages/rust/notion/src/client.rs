//! HTTP client for the Notion REST API.
//!
//! Only two endpoints are used: page retrieval and block-children listing.
//! Block trees are hydrated depth-first and sequentially, one page of
//! children per request, stopping at child pages and child databases.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use spoketome_shared::{Block, NotionConfig, PageId, RawProperty, Result, SpoketomeError};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("spoketome/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The parts of a Notion page object used downstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub last_edited_time: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Property name → typed value. A property whose value does not match
    /// its declared type is kept as [`RawProperty::Unknown`].
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: BTreeMap<String, RawProperty>,
}

/// One page of a block-children listing.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockList {
    pub results: Vec<Block>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A page object together with its fully hydrated block tree.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub page: NotionPage,
    pub blocks: Vec<Block>,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn lenient_properties<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, RawProperty>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let prop = serde_json::from_value(value).unwrap_or(RawProperty::Unknown);
            (name, prop)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// NotionClient
// ---------------------------------------------------------------------------

/// Authenticated Notion API client. Build once per run and share by reference.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl NotionClient {
    /// Create a client for `token` using the endpoint settings in `config`.
    pub fn new(token: &str, config: &NotionConfig) -> Result<Self> {
        let base_url: Url = config.base_url()?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SpoketomeError::config("Notion token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            HeaderName::from_static("notion-version"),
            HeaderValue::from_str(&config.notion_version).map_err(|_| {
                SpoketomeError::config(format!(
                    "invalid notion_version '{}'",
                    config.notion_version
                ))
            })?,
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpoketomeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            page_size: config.page_size.clamp(1, 100),
        })
    }

    /// `GET /pages/{id}`.
    #[instrument(skip_all, fields(page_id = %page_id))]
    pub async fn retrieve_page(&self, page_id: &PageId) -> Result<NotionPage> {
        let url = format!("{}/pages/{page_id}", self.base_url);
        debug!(%url, "retrieving page");
        self.get_json(&url, &[]).await
    }

    /// `GET /blocks/{id}/children`, one page of results.
    pub async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockList> {
        let url = format!("{}/blocks/{block_id}/children", self.base_url);
        let page_size = self.page_size.to_string();
        let mut query = vec![("page_size", page_size.as_str())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor));
        }
        self.get_json(&url, &query).await
    }

    /// All children of `block_id`, with every non-boundary descendant hydrated.
    pub async fn fetch_blocks(&self, block_id: &str) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let list = self.list_children(block_id, cursor.as_deref()).await?;

            for mut block in list.results {
                if block.needs_children() {
                    block.children = Box::pin(self.fetch_blocks(&block.id)).await?;
                }
                blocks.push(block);
            }

            cursor = match (list.has_more, list.next_cursor) {
                (true, Some(next)) => Some(next),
                _ => break,
            };
        }

        Ok(blocks)
    }

    /// Retrieve the page object and its full block tree.
    #[instrument(skip_all, fields(page_id = %page_id))]
    pub async fn fetch_page(&self, page_id: &PageId) -> Result<FetchedPage> {
        let page = self.retrieve_page(page_id).await?;
        let blocks = self.fetch_blocks(&page_id.to_string()).await?;
        debug!(top_level_blocks = blocks.len(), "page hydrated");
        Ok(FetchedPage { page, blocks })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SpoketomeError::Network(format!("{url}: {e}")))?;

        let response = check_status(url, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| SpoketomeError::Network(format!("{url}: failed to read body: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| SpoketomeError::parse(format!("{url}: unexpected response shape: {e}")))
    }
}

/// Turn a non-2xx response into a `Network` error carrying the API message.
async fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ApiError>(&body) {
        Ok(ApiError {
            message: Some(message),
            code,
        }) => match code {
            Some(code) => format!("{message} ({code})"),
            None => message,
        },
        _ => status.canonical_reason().unwrap_or("request failed").to_string(),
    };

    warn!(%url, status = status.as_u16(), %detail, "Notion API request failed");
    Err(SpoketomeError::Network(format!(
        "HTTP {}: {detail}",
        status.as_u16()
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

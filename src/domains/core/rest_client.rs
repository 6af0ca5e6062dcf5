use crate::config::ApiSettings;
use crate::domains::core::repository::{stamp_created, stamp_updated, RepositoryClient};
use crate::errors::{ApiError, ApiResult};
use crate::types::{Collection, ListQuery, Record};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use uuid::Uuid;

/// `RepositoryClient` over a PostgREST-style HTTP API
pub struct RestRepositoryClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRepositoryClient {
    pub fn new(settings: &ApiSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Turn a non-success status into `ApiError::Status`, otherwise decode rows
    async fn read_rows(response: Response) -> ApiResult<Vec<Record>> {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(serde_json::from_str::<Vec<Record>>(&text)?)
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to get error details".to_string());
            warn!("Server returned error {}: {}", status, body);
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Query string for a listing: `select=*`, then equality filters, the OR'd
/// case-insensitive search, ordering and limit.
pub fn build_query_string(query: &ListQuery) -> String {
    let mut params = vec!["select=*".to_string()];

    for filter in &query.equals {
        params.push(format!(
            "{}=eq.{}",
            urlencoding::encode(&filter.field),
            urlencoding::encode(&filter.value)
        ));
    }

    if let Some(search) = &query.search {
        if !search.fields.is_empty() {
            let escaped = search.term.replace('\\', "\\\\").replace('"', "\\\"");
            let clauses: Vec<String> = search
                .fields
                .iter()
                .map(|field| format!("{}.ilike.\"*{}*\"", field, escaped))
                .collect();
            params.push(format!(
                "or={}",
                urlencoding::encode(&format!("({})", clauses.join(",")))
            ));
        }
    }

    if let Some(order) = &query.order {
        params.push(format!(
            "order={}.{}",
            urlencoding::encode(&order.field),
            order.direction.as_str()
        ));
    }

    if let Some(limit) = query.limit {
        params.push(format!("limit={}", limit));
    }

    params.join("&")
}

#[async_trait]
impl RepositoryClient for RestRepositoryClient {
    async fn list(&self, collection: Collection, query: &ListQuery) -> ApiResult<Vec<Record>> {
        let url = format!("{}?{}", self.collection_url(collection), build_query_string(query));
        debug!("GET {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        Self::read_rows(response).await
    }

    async fn create(&self, collection: Collection, mut record: Record) -> ApiResult<Record> {
        stamp_created(&mut record);
        let url = self.collection_url(collection);
        debug!("POST {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;

        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode(format!("Insert into {} returned no row", collection)))
    }

    async fn update(&self, collection: Collection, id: Uuid, mut patch: Record) -> ApiResult<Record> {
        stamp_updated(&mut patch);
        let url = format!("{}?id=eq.{}", self.collection_url(collection), id);
        debug!("PATCH {}", url);

        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(collection.entity_name().to_string(), id.to_string()))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> ApiResult<bool> {
        let url = format!("{}?id=eq.{}", self.collection_url(collection), id);
        debug!("DELETE {}", url);

        let response = self
            .authorized(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        // An empty representation means no row matched the id
        let deleted = Self::read_rows(response).await?;
        Ok(!deleted.is_empty())
    }
}

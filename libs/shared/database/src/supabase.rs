use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::StoreError;
use crate::filter::{Filter, FindOptions, GroupCount};
use crate::store::{DocumentStore, ObjectStore};

/// PostgREST + Storage client for a Supabase project.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    storage_bucket: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        // Header values are validated once here so requests never fail on them
        HeaderValue::from_str(&config.supabase_anon_key)
            .map_err(|_| StoreError::Configuration("anon key is not a valid header value".into()))?;

        Ok(Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            storage_bucket: config.storage_bucket.clone(),
        })
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.anon_key)
            .map_err(|_| StoreError::Configuration("anon key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.anon_key))
            .map_err(|_| StoreError::Configuration("anon key is not a valid header value".into()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers).query(query);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        Self::check_status(response).await
    }

    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }
        Ok(response)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, query, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, query, body, headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    fn table_path(collection: &str) -> String {
        format!("/rest/v1/{}", collection)
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
const COUNTERS_TABLE: &str = "counters";

fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next().and_then(|total| total.trim().parse().ok())
}

#[async_trait]
impl DocumentStore for SupabaseClient {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter.to_query_pairs());
        query.extend(options.to_query_pairs());

        self.request(Method::GET, &Self::table_path(collection), &query, None).await
    }

    async fn find_one_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let found = self
            .find(collection, &Filter::by_id(id), FindOptions::new().limit(1))
            .await?;
        Ok(found.into_iter().next())
    }

    async fn insert_one(&self, collection: &str, mut document: Value) -> Result<Value, StoreError> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".into()))?;
        object
            .entry("id")
            .or_insert_with(|| json!(Uuid::new_v4().to_string()));

        let path = Self::table_path(collection);
        let result: Vec<Value> = self
            .request_with_headers(
                Method::POST,
                &path,
                &[],
                Some(document),
                Some(Self::return_representation()),
            )
            .await?;

        result
            .into_iter()
            .next()
            .ok_or(StoreError::EmptyResponse(path))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::InvalidDocument(
                "refusing to update without a filter".into(),
            ));
        }

        let result: Vec<Value> = self
            .request_with_headers(
                Method::PATCH,
                &Self::table_path(collection),
                &filter.to_query_pairs(),
                Some(Value::Object(fields)),
                Some(Self::return_representation()),
            )
            .await?;

        Ok(result.into_iter().next())
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result: Vec<Value> = self
            .request_with_headers(
                Method::DELETE,
                &Self::table_path(collection),
                &Filter::by_id(id).to_query_pairs(),
                None,
                Some(Self::return_representation()),
            )
            .await?;

        Ok(!result.is_empty())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut query = vec![
            ("select".to_string(), "id".to_string()),
            ("limit".to_string(), "0".to_string()),
        ];
        query.extend(filter.to_query_pairs());

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let path = Self::table_path(collection);
        let response = self
            .send(Method::GET, &path, &query, None, Some(headers))
            .await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or(StoreError::EmptyResponse(path))
    }

    async fn aggregate_group_count(
        &self,
        collection: &str,
        filter: &Filter,
        group_by: &str,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let mut query = vec![("select".to_string(), format!("{},count()", group_by))];
        query.extend(filter.to_query_pairs());

        let rows: Vec<Value> = self
            .request(Method::GET, &Self::table_path(collection), &query, None)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| GroupCount {
                key: row.get(group_by).cloned().unwrap_or(Value::Null),
                count: row.get("count").and_then(Value::as_u64).unwrap_or(0),
            })
            .collect())
    }

    async fn increment_counter(&self, key: &str) -> Result<i64, StoreError> {
        // Server-side upsert; see supabase/migrations
        self.request(
            Method::POST,
            "/rest/v1/rpc/increment_counter",
            &[],
            Some(json!({ "counter_key": key })),
        )
        .await
    }

    async fn current_counter(&self, key: &str) -> Result<i64, StoreError> {
        let mut query = vec![("select".to_string(), "value".to_string())];
        query.extend(Filter::new().eq("key", key).to_query_pairs());

        let rows: Vec<Value> = self
            .request(Method::GET, &Self::table_path(COUNTERS_TABLE), &query, None)
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get("value"))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl ObjectStore for SupabaseClient {
    async fn put_object(
        &self,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StoreError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.storage_bucket, path
        );
        debug!("Uploading {} bytes to {}", data.len(), url);

        let mut headers = self.get_headers()?;
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        headers.insert(CONTENT_TYPE, content_type);

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(data)
            .send()
            .await?;
        Self::check_status(response).await?;

        Ok(format!("{}/{}", self.storage_bucket, path))
    }

    async fn delete_object(&self, reference: &str) -> Result<(), StoreError> {
        // References are "{bucket}/{path}"
        let path = format!("/storage/v1/object/{}", reference);
        self.send(Method::DELETE, &path, &[], None, None).await?;
        Ok(())
    }
}

//! Client for the reference manager's local HTTP API.

use super::LibrarySource;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// Records requested per page.
const PAGE_SIZE: usize = 100;

/// Header carrying the total number of records for a paged request.
const TOTAL_RESULTS: &str = "Total-Results";

/// Reads a library through the local API (`http://localhost:23119/api`).
#[derive(Debug)]
pub struct LocalApiSource {
    client: Client,
    /// `<base>/users/<id>` or `<base>/groups/<id>`
    prefix: String,
}

impl LocalApiSource {
    /// Creates a client for the configured library. Does not touch the network.
    pub fn new(config: &ExportConfig) -> Result<Self> {
        let scope = match config.library_type.as_str() {
            "group" => "groups",
            _ => "users",
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs.max(30)))
            .build()?;
        Ok(Self {
            client,
            prefix: format!(
                "{}/{}/{}",
                config.api_base_url.trim_end_matches('/'),
                scope,
                config.library_id
            ),
        })
    }

    /// Creates a client and checks that the API answers.
    pub fn connect(config: &ExportConfig) -> Result<Self> {
        let source = Self::new(config)?;
        source
            .get_page("items/top", &[], 0, 1)
            .map_err(|e| Error::Source(format!("cannot reach local API: {}", e)))?;
        log::info!("connected to local API at {}", source.prefix);
        Ok(source)
    }

    /// Fetches every page of a listing.
    fn get_all(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        loop {
            let (page, total) = self.get_page(path, query, records.len(), PAGE_SIZE)?;
            let fetched = page.len();
            records.extend(page);
            let done = match total {
                Some(total) => records.len() >= total,
                None => fetched < PAGE_SIZE,
            };
            if done || fetched == 0 {
                break;
            }
        }
        log::debug!("GET {}: {} records", path, records.len());
        Ok(records)
    }

    fn get_page(
        &self,
        path: &str,
        query: &[(&str, &str)],
        start: usize,
        limit: usize,
    ) -> Result<(Vec<Value>, Option<usize>)> {
        let url = format!("{}/{}", self.prefix, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("start", start), ("limit", limit)])
            .send()?
            .error_for_status()?;

        let total = response
            .headers()
            .get(TOTAL_RESULTS)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        match response.json::<Value>()? {
            Value::Array(records) => Ok((records, total)),
            other => Err(Error::Source(format!(
                "expected a JSON array from {}, got {}",
                url,
                kind(&other)
            ))),
        }
    }
}

impl LibrarySource for LocalApiSource {
    fn list_items(&self) -> Result<Vec<Value>> {
        self.get_all("items", &[("itemType", "-attachment")])
    }

    fn list_collections(&self) -> Result<Vec<Value>> {
        self.get_all("collections", &[])
    }

    fn list_children(&self, item_id: &str) -> Result<Vec<Value>> {
        self.get_all(&format!("items/{}/children", item_id), &[])
    }

    fn collection_items(&self, collection_id: &str) -> Result<Vec<Value>> {
        self.get_all(
            &format!("collections/{}/items/top", collection_id),
            &[("itemType", "-attachment")],
        )
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

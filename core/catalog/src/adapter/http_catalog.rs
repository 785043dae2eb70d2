//! HTTP カタログクライアント（KiCad HTTP ライブラリ API 互換のエンドポイント）
//!
//! - GET  /v1/categories.json
//! - GET  /v1/parts/category/{id}.json
//! - GET  /v1/parts/{id}.json
//! - PUT  /v1/parts/{id}.json        body: {description, sources}
//! - POST /v1/parts/{id}/revision
//! - POST /v1/parts.json             body: {id, name, category}
//! - GET  /health

use crate::domain::{Category, CategoryId, NewPart, Part, PartId, PartSummary, PartUpdate};
use crate::ports::outbound::CatalogService;
use common::error::Error;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const ERROR_BODY_MAX: usize = 200;

/// リビジョン作成の応答（id 以外は読み捨てる）
#[derive(Debug, Deserialize)]
struct RevisionCreated {
    id: PartId,
}

/// reqwest（blocking）で話す CatalogService 実装
pub struct HttpCatalog {
    base: Url,
    client: Client,
    log: Arc<dyn Log>,
}

impl HttpCatalog {
    /// ベース URL とタイムアウトからクライアントを作る
    pub fn new(base_url: &str, timeout: Duration, log: Arc<dyn Log>) -> Result<Self, Error> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::env(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::env(format!("Invalid base URL '{}'", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { base, client, log })
    }

    /// ベース URL にパスセグメントを足す（各セグメントはパーセントエンコードされる）
    pub fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::env(format!("Invalid base URL '{}'", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn part_url(&self, part: &PartId) -> Result<Url, Error> {
        self.url(&["v1", "parts", &format!("{}.json", part)])
    }

    /// 送信して本文を返す。非 2xx は Error::http。
    fn send(&self, method: &str, url: &Url, builder: RequestBuilder) -> Result<String, Error> {
        let response = builder
            .send()
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, "http exchange")
                .layer("adapter")
                .kind("http")
                .field("method", method)
                .field("url", url.as_str())
                .field("status", status.as_u16()),
        );

        if !status.is_success() {
            let snippet: String = body.trim().chars().take(ERROR_BODY_MAX).collect();
            return Err(Error::http(format!("HTTP {}: {}", status, snippet)));
        }
        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let body = self.send("GET", &url, self.client.get(url.clone()))?;
        parse_json(&body)
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body)
        .map_err(|e| Error::json(format!("Failed to parse response JSON: {}", e)))
}

impl CatalogService for HttpCatalog {
    fn list_categories(&self) -> Result<Vec<Category>, Error> {
        self.get_json(self.url(&["v1", "categories.json"])?)
    }

    fn list_parts(&self, category: &CategoryId) -> Result<Value, Error> {
        let leaf = format!("{}.json", category);
        self.get_json(self.url(&["v1", "parts", "category", &leaf])?)
    }

    fn get_part(&self, part: &PartId) -> Result<Part, Error> {
        self.get_json(self.part_url(part)?)
    }

    fn create_part(&self, new_part: &NewPart) -> Result<Option<PartSummary>, Error> {
        let url = self.url(&["v1", "parts.json"])?;
        let body = self.send("POST", &url, self.client.post(url.clone()).json(new_part))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        // 受領だけを返すサーバーもあるため、要約として読めなければ None とする
        Ok(serde_json::from_str(&body).ok())
    }

    fn update_part(&self, part: &PartId, update: &PartUpdate) -> Result<Part, Error> {
        let url = self.part_url(part)?;
        let body = self.send("PUT", &url, self.client.put(url.clone()).json(update))?;
        parse_json(&body)
    }

    fn start_revision(&self, part: &PartId) -> Result<PartId, Error> {
        let url = self.url(&["v1", "parts", part.as_str(), "revision"])?;
        let body = self.send("POST", &url, self.client.post(url.clone()))?;
        let created: Option<RevisionCreated> = parse_json(&body)?;
        created
            .map(|c| c.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::json("Revision response has no part id"))
    }

    fn health(&self) -> Result<(), Error> {
        let url = self.url(&["health"])?;
        self.send("GET", &url, self.client.get(url.clone()))?;
        Ok(())
    }
}

use crate::error::FetchError;
use crate::printers::PrinterState;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// The network seam. Pollers and the command handler only talk to this.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// GET `url`, bypassing caches, and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;

    /// POST `{"status": ..}` to `url`. The response body is ignored.
    async fn post_status(&self, url: &str, status: PrinterState) -> Result<(), FetchError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        let client = reqwest::Client::builder()
            .user_agent("statusboard")
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self { client })
    }
}

#[derive(Serialize)]
struct StatusCommand {
    status: PrinterState,
}

#[async_trait]
impl StatusTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::http_status(status.as_u16()));
        }
        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| FetchError::Shape(format!("response is not JSON: {err}")))
    }

    async fn post_status(&self, url: &str, status: PrinterState) -> Result<(), FetchError> {
        let resp = self
            .client
            .post(url)
            .json(&StatusCommand { status })
            .send()
            .await?;
        let code = resp.status();
        if !code.is_success() {
            return Err(FetchError::http_status(code.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_json_without_caching() {
        let router = Router::new().route(
            "/status",
            get(|headers: axum::http::HeaderMap| async move {
                let cache = headers
                    .get("cache-control")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"status": "in-use", "progress": 40, "cache": cache}))
            }),
        );
        let base = spawn(router).await;
        let body = transport().get_json(&format!("{base}/status")).await.unwrap();
        assert_eq!(body["status"], "in-use");
        assert_eq!(body["cache"], "no-cache, no-store");
    }

    #[tokio::test]
    async fn non_success_is_a_transport_error() {
        let router = Router::new().route("/status", get(|| async { StatusCode::BAD_GATEWAY }));
        let base = spawn(router).await;
        let err = transport()
            .get_json(&format!("{base}/status"))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Transport("HTTP 502".into()));
    }

    #[tokio::test]
    async fn non_json_body_is_a_shape_error() {
        let router = Router::new().route("/status", get(|| async { "<html>login</html>" }));
        let base = spawn(router).await;
        let err = transport()
            .get_json(&format!("{base}/status"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));
    }

    #[tokio::test]
    async fn posts_status_and_tolerates_empty_body() {
        let seen = Arc::new(Mutex::new(None::<Value>));
        let sink = Arc::clone(&seen);
        let router = Router::new().route(
            "/status",
            axum::routing::post(move |Json(body): Json<Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().await = Some(body);
                    StatusCode::NO_CONTENT
                }
            }),
        );
        let base = spawn(router).await;
        transport()
            .post_status(&format!("{base}/status"), PrinterState::InUse)
            .await
            .unwrap();
        assert_eq!(seen.lock().await.clone(), Some(json!({"status": "in-use"})));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = transport()
            .get_json(&format!("http://{addr}/status"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}

use super::logging::{debug_payload_enabled, emit_debug_payload, emit_transport_failure};
use crate::config::Config;
use crate::error::ChatError;
use crate::types::ChatRequest;
use crate::util::is_local_endpoint_url;
use anyhow::Result;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// Opens the response body stream for one chat request.
///
/// The returned stream yields raw body buffers in arrival order and ends at
/// end-of-body. An `Err` item is a transport failure mid-stream.
pub trait ChatTransport: Send + Sync + 'static {
    fn open_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<ByteStream, ChatError>>;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    stream_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let stream_url = config.stream_url();
        let mut builder = reqwest::Client::builder();
        if is_local_endpoint_url(&stream_url) {
            builder = builder.no_proxy();
        }

        Ok(Self {
            http: builder.build()?,
            stream_url,
        })
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    async fn send(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
        let request_url = self.stream_url.clone();

        if debug_payload_enabled() {
            if let Ok(payload) = serde_json::to_value(request) {
                emit_debug_payload(&request_url, &payload);
            }
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|error| map_transport_error(error, &request_url))?;

        let status = response.status();
        if !status.is_success() {
            let error = ChatError::Transport(format!("HTTP error! status: {}", status.as_u16()));
            emit_transport_failure(&request_url, &error);
            return Err(error);
        }

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_transport_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }
}

impl ChatTransport for HttpTransport {
    fn open_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<ByteStream, ChatError>> {
        self.send(request).boxed()
    }
}

fn map_transport_error(error: reqwest::Error, request_url: &str) -> ChatError {
    let mapped = if error.is_connect() && is_local_endpoint_url(request_url) {
        ChatError::Transport(format!(
            "cannot reach local chat service '{request_url}': {error}. Start the backend or update THINKCHAT_API_URL."
        ))
    } else if error.is_connect() {
        ChatError::Transport(format!("cannot reach chat service '{request_url}': {error}"))
    } else if error.is_timeout() {
        ChatError::Transport(format!("chat request to '{request_url}' timed out: {error}"))
    } else if let Some(status) = error.status() {
        ChatError::Transport(format!("HTTP error! status: {}", status.as_u16()))
    } else if error.is_body() || error.is_decode() {
        ChatError::Transport(format!("chat stream from '{request_url}' broke off: {error}"))
    } else {
        ChatError::Transport(format!("chat request to '{request_url}' failed: {error}"))
    };
    emit_transport_failure(request_url, &mapped);
    mapped
}

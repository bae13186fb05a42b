use crate::api::client::{ByteStream, ChatTransport};
use crate::error::ChatError;
use crate::types::ChatRequest;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One scripted reply of [`MockTransport`].
pub enum MockResponse {
    /// Body buffers delivered exactly as given, then end-of-stream.
    Chunks(Vec<Bytes>),
    /// The request itself fails; no body is ever streamed.
    Reject(ChatError),
    /// Body buffers followed by a transport failure.
    ChunksThenFail(Vec<Bytes>, ChatError),
    /// Body buffers held back until `release` fires or is dropped.
    Gated {
        chunks: Vec<Bytes>,
        release: oneshot::Receiver<()>,
    },
}

impl MockResponse {
    /// One buffer per record, each terminated by a newline.
    pub fn lines(lines: &[&str]) -> Self {
        Self::Chunks(
            lines
                .iter()
                .map(|line| Bytes::from(format!("{line}\n")))
                .collect(),
        )
    }

    /// Raw buffers with no framing added.
    pub fn raw<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::Chunks(chunks.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockTransport {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    fn next_stream(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
        self.requests.lock().push(request.clone());
        let Some(response) = self.responses.lock().pop_front() else {
            return Err(ChatError::Transport(
                "MockTransport: no more responses configured".to_string(),
            ));
        };

        let stream: ByteStream = match response {
            MockResponse::Chunks(chunks) => Box::pin(stream::iter(chunks.into_iter().map(Ok))),
            MockResponse::Reject(error) => return Err(error),
            MockResponse::ChunksThenFail(chunks, error) => {
                let failure = stream::once(async move { Err(error) });
                Box::pin(stream::iter(chunks.into_iter().map(Ok)).chain(failure))
            }
            MockResponse::Gated { chunks, release } => {
                let gate = stream::once(async move {
                    let _ = release.await;
                })
                .filter_map(|_| async { None::<Result<Bytes, ChatError>> });
                Box::pin(gate.chain(stream::iter(chunks.into_iter().map(Ok))))
            }
        };
        Ok(stream)
    }
}

impl ChatTransport for MockTransport {
    fn open_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<ByteStream, ChatError>> {
        let result = self.next_stream(request);
        async move { result }.boxed()
    }
}

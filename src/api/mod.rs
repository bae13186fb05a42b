pub mod client;
pub mod decoder;
pub mod logging;
pub mod mock_client;
pub mod stream;

pub use client::{ByteStream, ChatTransport, HttpTransport};
pub use decoder::StreamDecoder;
pub use stream::{LineBatch, LineEventParser};

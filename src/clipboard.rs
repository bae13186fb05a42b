use anyhow::{anyhow, Result};

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard through `arboard`.
///
/// The handle is opened on first use and kept for the rest of the session;
/// on X11 the copied text only stays available while its owner is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            tracing::debug!("opening system clipboard");
            let handle = arboard::Clipboard::new()
                .map_err(|error| anyhow!("clipboard unavailable: {error}"))?;
            self.inner = Some(handle);
        }
        let Some(handle) = self.inner.as_mut() else {
            return Err(anyhow!("clipboard unavailable"));
        };
        handle
            .set_text(text.to_string())
            .map_err(|error| anyhow!("clipboard write failed: {error}"))
    }
}

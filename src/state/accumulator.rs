/// Running concatenation of the `message` fragments of one in-flight turn.
///
/// Owned by the submission that streams the turn and dropped with it, so no
/// text can leak from one submission into the next.
#[derive(Debug, Default)]
pub struct ContentAccumulator {
    text: String,
    fragments: usize,
}

impl ContentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.fragments = 0;
    }
}

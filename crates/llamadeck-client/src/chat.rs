//! Chat completion aggregation
//!
//! Generate streams deliver the answer as text fragments. The aggregator
//! forwards each fragment as soon as it arrives and keeps the concatenation so
//! the whole exchange can be recorded once the stream closes.

use crate::{
    error::ClientError,
    models::{ChatTranscriptEntry, StreamEvent},
    Result,
};

/// Receives chat output as it streams in
pub trait ChatObserver {
    /// Called once per non-empty fragment, in arrival order
    fn on_fragment(&mut self, fragment: &str);

    /// Called once with the finished exchange
    fn on_complete(&mut self, _entry: &ChatTranscriptEntry) {}
}

impl<F> ChatObserver for F
where
    F: FnMut(&str),
{
    fn on_fragment(&mut self, fragment: &str) {
        self(fragment)
    }
}

/// Accumulates one generate response
#[derive(Debug, Clone, Default)]
pub struct ChatAggregator {
    response: String,
    fragments: usize,
    done: bool,
}

impl ChatAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event. Returns the fragment to display, if the event had one.
    pub fn apply<'e>(&mut self, event: &'e StreamEvent) -> Result<Option<&'e str>> {
        if let Some(message) = &event.error {
            return Err(ClientError::RemoteOperationFailed(message.clone()));
        }
        if event.done == Some(true) {
            self.done = true;
        }
        match event.response.as_deref() {
            Some(fragment) if !fragment.is_empty() => {
                self.response.push_str(fragment);
                self.fragments += 1;
                Ok(Some(fragment))
            }
            _ => Ok(None),
        }
    }

    /// Text received so far
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Number of non-empty fragments received
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Whether the server marked the response as finished
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Close out the exchange. Zero fragments yields an empty answer.
    pub fn finish(self, prompt: impl Into<String>) -> ChatTranscriptEntry {
        ChatTranscriptEntry {
            user_text: prompt.into(),
            ai_text: self.response,
        }
    }
}

/// Append-only record of completed exchanges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    entries: Vec<ChatTranscriptEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChatTranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ChatTranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatTranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Recording encoder for pipeline tests
//!
//! Each feed returns the chunk's PCM as little-endian bytes, so the output
//! file is the raw quantized stream. Every call is appended to a shared log.

use requencer_render::render::{AudioEncoder, EncoderSession, EncoderSettings};
use requencer_render::{RenderError, Result};
use std::sync::{Arc, Mutex};

/// Observable encoder activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    Opened(EncoderSettings),
    /// Samples in one feed call
    Fed(usize),
    Flushed,
    Closed,
    Dropped,
}

#[derive(Debug, Clone, Default)]
pub struct FakeEncoder {
    log: Arc<Mutex<Vec<EncoderEvent>>>,
    /// Fail the Nth feed call (0-based)
    fail_on_feed: Option<usize>,
    fail_on_flush: bool,
    /// Bytes appended by flush
    trailer: Vec<u8>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_feed(call: usize) -> Self {
        Self {
            fail_on_feed: Some(call),
            ..Self::default()
        }
    }

    pub fn failing_on_flush() -> Self {
        Self {
            fail_on_flush: true,
            ..Self::default()
        }
    }

    pub fn with_trailer(trailer: &[u8]) -> Self {
        Self {
            trailer: trailer.to_vec(),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<EncoderEvent> {
        self.log.lock().unwrap().clone()
    }

    /// Sizes of every feed call in order
    pub fn fed_sizes(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EncoderEvent::Fed(n) => Some(n),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeSession {
    log: Arc<Mutex<Vec<EncoderEvent>>>,
    feeds: usize,
    fail_on_feed: Option<usize>,
    fail_on_flush: bool,
    trailer: Vec<u8>,
}

impl FakeSession {
    fn record(&self, event: EncoderEvent) {
        self.log.lock().unwrap().push(event);
    }
}

impl AudioEncoder for FakeEncoder {
    type Session = FakeSession;

    fn open(&self, settings: &EncoderSettings) -> Result<FakeSession> {
        self.log
            .lock()
            .unwrap()
            .push(EncoderEvent::Opened(settings.clone()));
        Ok(FakeSession {
            log: Arc::clone(&self.log),
            feeds: 0,
            fail_on_feed: self.fail_on_feed,
            fail_on_flush: self.fail_on_flush,
            trailer: self.trailer.clone(),
        })
    }

    fn extension(&self) -> &'static str {
        "pcm"
    }
}

impl EncoderSession for FakeSession {
    fn feed(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        let call = self.feeds;
        self.feeds += 1;
        if self.fail_on_feed == Some(call) {
            return Err(RenderError::Encode(format!("injected failure on feed {}", call)));
        }
        self.record(EncoderEvent::Fed(pcm.len()));
        Ok(pcm.iter().flat_map(|s| s.to_le_bytes()).collect())
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        if self.fail_on_flush {
            return Err(RenderError::Encode("injected failure on flush".to_string()));
        }
        self.record(EncoderEvent::Flushed);
        Ok(self.trailer.clone())
    }

    fn close(self) -> Result<()> {
        self.record(EncoderEvent::Closed);
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.record(EncoderEvent::Dropped);
    }
}

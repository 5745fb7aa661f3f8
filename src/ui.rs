//! UI-facing signals
//!
//! The visual interface itself lives outside this crate; these are the
//! signals it exchanges with the pipeline: a line sink for transcript
//! display and a shared "currently speaking" flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sink for display lines produced by any part of the pipeline
pub trait DisplaySink: Send + Sync {
    /// Show one attributed line of conversation
    fn line(&self, speaker: &str, text: &str);
}

/// Display sink that prints to stdout
pub struct ConsoleDisplay;

impl DisplaySink for ConsoleDisplay {
    fn line(&self, speaker: &str, text: &str) {
        println!("{speaker}: {text}");
    }
}

/// Shared flag indicating speech playback is in progress
///
/// The speech consumer sets it around playback; producers and the consumer
/// itself poll it to avoid overlapping output.
#[derive(Clone, Default)]
pub struct SpeakingFlag(Arc<AtomicBool>);

impl SpeakingFlag {
    /// Create a new, cleared flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark speech playback as started or finished
    pub fn set(&self, speaking: bool) {
        self.0.store(speaking, Ordering::SeqCst);
    }

    /// Check whether playback is currently in progress
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaking_flag_roundtrip() {
        let flag = SpeakingFlag::new();
        assert!(!flag.is_speaking());

        flag.set(true);
        assert!(flag.is_speaking());

        let clone = flag.clone();
        clone.set(false);
        assert!(!flag.is_speaking());
    }
}

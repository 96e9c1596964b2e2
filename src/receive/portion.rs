//! Silence-based portion segmentation.
//!
//! A serial line has no frame markers, so a portion ends when the line has
//! been quiet for more than `threshold` consecutive read timeouts. Any sender
//! that pauses mid-message for longer than that gets split in two.

use super::sink::ReceiveEvent;
use crate::state::ReceiveMode;

/// Byte-at-a-time state machine behind the receive loop.
#[derive(Debug, Clone)]
pub struct PortionTracker {
    mode: ReceiveMode,
    threshold: u32,
    buffer: Vec<u8>,
    empty_reads: u32,
}

impl PortionTracker {
    pub fn new(mode: ReceiveMode, threshold: u32) -> Self {
        Self {
            mode,
            threshold,
            buffer: Vec::new(),
            empty_reads: 0,
        }
    }

    /// Record a received byte and build the event to deliver for it.
    pub fn on_byte(&mut self, byte: u8) -> ReceiveEvent {
        self.buffer.push(byte);
        self.empty_reads = 0;

        let count = self.buffer.len();
        let chunk = match self.mode {
            ReceiveMode::Portion => vec![byte],
            ReceiveMode::Cumulative => self.buffer.clone(),
        };
        ReceiveEvent::Data { chunk, count }
    }

    /// Record a read that timed out with no data.
    ///
    /// Returns `PortionEnd` when this silence closes a non-empty portion.
    /// Cumulative mode never closes portions.
    pub fn on_silence(&mut self) -> Option<ReceiveEvent> {
        self.empty_reads += 1;
        if self.empty_reads <= self.threshold {
            return None;
        }
        self.empty_reads = 0;

        if self.mode == ReceiveMode::Cumulative || self.buffer.is_empty() {
            return None;
        }
        Some(ReceiveEvent::PortionEnd {
            portion: std::mem::take(&mut self.buffer),
        })
    }

    #[cfg(test)]
    fn portion_len(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    fn empty_reads(&self) -> u32 {
        self.empty_reads
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkQueueError};
use crate::packet::WORD_SIZE;

/// Half-open address range `[start, start + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddrRange {
    pub start: u64,
    pub size: u64,
}

impl AddrRange {
    pub const fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }

    /// Returns `None` if the range would wrap past `u64::MAX`.
    pub fn end_exclusive(&self) -> Option<u64> {
        self.start.checked_add(self.size)
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr - self.start < self.size
    }

    pub fn contains_range(&self, other: &AddrRange) -> bool {
        match (self.end_exclusive(), other.end_exclusive()) {
            (Some(end), Some(other_end)) => other.start >= self.start && other_end <= end,
            _ => false,
        }
    }

    pub fn overlaps(&self, other: &AddrRange) -> bool {
        self.contains(other.start) || other.contains(self.start)
    }
}

fn default_name() -> String {
    "work_queue".to_string()
}

const fn default_push_offset() -> u64 {
    WORD_SIZE
}

/// Parameters of a work queue instance.
///
/// `pop_offset`/`push_offset` place the two dedicated words inside `range`; by default the pop
/// word is the first word of the range and the push word the second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkQueueConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Capacity of the queue, in work tokens.
    pub size: usize,
    /// Latency from accepting a request until its response is ready to be sent.
    #[serde(default)]
    pub latency_ns: u64,
    pub range: AddrRange,
    #[serde(default)]
    pub pop_offset: u64,
    #[serde(default = "default_push_offset")]
    pub push_offset: u64,
}

impl WorkQueueConfig {
    pub fn new(size: usize, latency_ns: u64, range: AddrRange) -> Self {
        Self {
            name: default_name(),
            size,
            latency_ns,
            range,
            pop_offset: 0,
            push_offset: default_push_offset(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn pop_addr(&self) -> u64 {
        self.range.start.wrapping_add(self.pop_offset)
    }

    pub fn push_addr(&self) -> u64 {
        self.range.start.wrapping_add(self.push_offset)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(WorkQueueError::InvalidConfig("size must be non-zero"));
        }
        if self.range.end_exclusive().is_none() {
            return Err(WorkQueueError::InvalidConfig(
                "address range wraps past the end of the address space",
            ));
        }
        if self.pop_offset % WORD_SIZE != 0 || self.push_offset % WORD_SIZE != 0 {
            return Err(WorkQueueError::InvalidConfig(
                "push/pop offsets must be word aligned",
            ));
        }

        let (Some(pop_addr), Some(push_addr)) = (
            self.range.start.checked_add(self.pop_offset),
            self.range.start.checked_add(self.push_offset),
        ) else {
            return Err(WorkQueueError::InvalidConfig(
                "push/pop offsets overflow the address space",
            ));
        };
        let pop_word = AddrRange::new(pop_addr, WORD_SIZE);
        let push_word = AddrRange::new(push_addr, WORD_SIZE);
        if !self.range.contains_range(&pop_word) || !self.range.contains_range(&push_word) {
            return Err(WorkQueueError::InvalidConfig(
                "push/pop words must lie inside the address range",
            ));
        }
        if pop_word.overlaps(&push_word) {
            return Err(WorkQueueError::InvalidConfig(
                "push and pop words must not overlap",
            ));
        }
        Ok(())
    }
}

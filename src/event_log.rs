//! Append-only log of auction events
//!
//! Readers track their own position as an `Offset` and can block
//! waiting for more events to arrive.
mod in_memory;

pub use self::in_memory::*;

use crate::event::Event;
use anyhow::Result;
use serde::Serialize;
use std::{sync::Arc, time::Duration};

pub type Offset = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub offset: Offset,
    pub details: Event,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WithOffset<T> {
    pub offset: Offset,
    pub data: T,
}

pub trait Reader {
    /// Read up to `limit` events starting at `offset`
    ///
    /// If nothing is available yet, waits up to `timeout` (forever on `None`).
    /// The returned offset is where the next read should start.
    fn read(
        &self,
        offset: Offset,
        limit: usize,
        timeout: Option<Duration>,
    ) -> Result<WithOffset<Vec<LogEvent>>>;

    fn get_start_offset(&self) -> Result<Offset>;
}

pub trait Writer {
    /// Append `events`, returning the offset just past the last one
    fn write(&self, events: &[Event]) -> Result<Offset>;
}

pub type SharedReader = Arc<dyn Reader + Sync + Send + 'static>;
pub type SharedWriter = Arc<dyn Writer + Sync + Send + 'static>;

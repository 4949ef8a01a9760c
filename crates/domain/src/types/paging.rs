//! Time windows and page cursors

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::{QdmSyncError, Result};

/// Half-open creation-time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Local>,
    end: DateTime<Local>,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Result<Self> {
        if start >= end {
            return Err(QdmSyncError::InvalidInput(format!(
                "window start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.end
    }
}

/// Position of a page walk inside a window.
///
/// `page_number` is 1-based and only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub window: TimeWindow,
    pub page_size: u32,
    pub page_number: u32,
}

impl PageCursor {
    pub fn first(window: TimeWindow, page_size: u32) -> Self {
        Self { window, page_size: page_size.max(1), page_number: 1 }
    }

    pub fn advance(&mut self) {
        self.page_number += 1;
    }
}

/// One decoded page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub page_number: u32,
    pub page_count: u32,
}

impl<T> Page<T> {
    /// Whether no page follows this one.
    pub fn is_last(&self) -> bool {
        self.records.is_empty() || self.page_number >= self.page_count
    }
}

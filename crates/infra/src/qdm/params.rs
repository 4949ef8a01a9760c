//! Query parameters of the listing and count endpoints

use qdmsync_domain::types::time::format_api_time;
use qdmsync_domain::{PageCursor, TimeWindow};

/// Filters of a record query, rendered into the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordQuery {
    pub window: TimeWindow,
    /// Restrict orders to a single customer
    pub customer_id: Option<i64>,
    /// `(page_size, page_number)`; absent for count requests
    pub page: Option<(u32, u32)>,
}

impl RecordQuery {
    /// Query counting every record of a window.
    pub fn count(window: TimeWindow) -> Self {
        Self { window, customer_id: None, page: None }
    }

    /// Query for the page a cursor points at.
    pub fn page(cursor: &PageCursor) -> Self {
        Self {
            window: cursor.window,
            customer_id: None,
            page: Some((cursor.page_size, cursor.page_number)),
        }
    }

    pub fn with_customer(mut self, customer_id: Option<i64>) -> Self {
        self.customer_id = customer_id.filter(|id| *id > 0);
        self
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("created_at_min", format_api_time(&self.window.start())),
            ("created_at_max", format_api_time(&self.window.end())),
        ];
        if let Some(customer_id) = self.customer_id {
            pairs.push(("customer_id", customer_id.to_string()));
        }
        if let Some((size, number)) = self.page {
            pairs.push(("page_size", size.to_string()));
            pairs.push(("page_number", number.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;

    fn window() -> TimeWindow {
        TimeWindow::new(
            Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn count_query_carries_only_the_window() {
        let pairs = RecordQuery::count(window()).to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("created_at_min", "2024-01-01T00:00:00".to_string()),
                ("created_at_max", "2024-01-31T23:59:59".to_string()),
            ]
        );
    }

    #[test]
    fn page_query_adds_size_number_and_customer() {
        let mut cursor = PageCursor::first(window(), 300);
        cursor.advance();

        let pairs = RecordQuery::page(&cursor).with_customer(Some(12)).to_pairs();
        assert!(pairs.contains(&("customer_id", "12".to_string())));
        assert!(pairs.contains(&("page_size", "300".to_string())));
        assert!(pairs.contains(&("page_number", "2".to_string())));
    }

    #[test]
    fn non_positive_customer_is_ignored() {
        let query = RecordQuery::count(window()).with_customer(Some(0));
        assert_eq!(query.customer_id, None);
    }
}

//! Page sources over the order and customer listings

use std::sync::Arc;

use async_trait::async_trait;
use qdmsync_core::PageSource;
use qdmsync_domain::{Customer, Order, Page, PageCursor, Result, TimeWindow};

use super::client::QdmClient;

/// Orders, optionally restricted to one customer.
pub struct OrderPages {
    client: Arc<QdmClient>,
    customer_id: Option<i64>,
}

impl OrderPages {
    pub fn new(client: Arc<QdmClient>, customer_id: Option<i64>) -> Self {
        Self { client, customer_id }
    }
}

#[async_trait]
impl PageSource<Order> for OrderPages {
    async fn count(&self, window: &TimeWindow) -> Result<i64> {
        self.client.order_count(*window, self.customer_id).await
    }

    async fn fetch_page(&self, cursor: &PageCursor) -> Result<Page<Order>> {
        self.client.orders_page(cursor, self.customer_id).await
    }
}

pub struct CustomerPages {
    client: Arc<QdmClient>,
}

impl CustomerPages {
    pub fn new(client: Arc<QdmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource<Customer> for CustomerPages {
    async fn count(&self, window: &TimeWindow) -> Result<i64> {
        self.client.customer_count(*window).await
    }

    async fn fetch_page(&self, cursor: &PageCursor) -> Result<Page<Customer>> {
        self.client.customers_page(cursor).await
    }
}

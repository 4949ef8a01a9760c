//! Port interfaces for sync operations

use async_trait::async_trait;
use qdmsync_domain::{Customer, CustomerGroup, Order, Result, TimeWindow};

use crate::stream::RecordStream;

/// Remote side of a sync: opens record streams over time windows.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Stream every order created inside the window
    async fn find_orders(&self, window: TimeWindow) -> Result<RecordStream<Order>>;

    /// Stream every customer created inside the window
    async fn find_customers(&self, window: TimeWindow) -> Result<RecordStream<Customer>>;

    /// All customer groups (not paged)
    async fn find_customer_groups(&self) -> Result<Vec<CustomerGroup>>;
}

/// Document store the synced records are written to.
///
/// Inserts are append-only; re-running a sync stores duplicates.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert a batch of orders
    async fn store(&self, orders: &[Order]) -> Result<()>;

    /// Insert a batch of customers
    async fn store_customers(&self, customers: &[Customer]) -> Result<()>;

    /// Insert customer groups
    async fn store_customer_groups(&self, groups: &[CustomerGroup]) -> Result<()>;

    /// Release the underlying connection; later stores fail
    async fn disconnect(&self) -> Result<()>;
}

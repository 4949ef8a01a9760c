//! Authenticated client for the QDM data endpoints

use std::sync::Arc;

use qdmsync_core::AccessTokenProvider;
use qdmsync_domain::{
    Customer, CustomerGroup, Order, Page, PageCursor, QdmSyncError, Result, TimeWindow,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::envelope::{read_data, CountData, GroupData, PageData};
use super::params::RecordQuery;
use crate::http::HttpClient;

/// Reads counts, pages and customer groups.
///
/// The bearer token is read from the provider on every request, so a renewal
/// takes effect on the next call without coordination.
pub struct QdmClient {
    http: HttpClient,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl QdmClient {
    pub fn new(http: HttpClient, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self { http, tokens }
    }

    /// Number of orders created inside `window`
    #[instrument(skip(self), err)]
    pub async fn order_count(&self, window: TimeWindow, customer_id: Option<i64>) -> Result<i64> {
        let query = RecordQuery::count(window).with_customer(customer_id);
        let data: CountData = self.get("/orders/count", &query).await?;
        Ok(data.count)
    }

    #[instrument(skip(self), fields(page = cursor.page_number), err)]
    pub async fn orders_page(
        &self,
        cursor: &PageCursor,
        customer_id: Option<i64>,
    ) -> Result<Page<Order>> {
        let query = RecordQuery::page(cursor).with_customer(customer_id);
        let data: PageData<Order> = self.get("/orders", &query).await?;
        Ok(data.into_page(cursor))
    }

    /// Number of customers created inside `window`
    #[instrument(skip(self), err)]
    pub async fn customer_count(&self, window: TimeWindow) -> Result<i64> {
        let data: CountData = self.get("/customers/count", &RecordQuery::count(window)).await?;
        Ok(data.count)
    }

    #[instrument(skip(self), fields(page = cursor.page_number), err)]
    pub async fn customers_page(&self, cursor: &PageCursor) -> Result<Page<Customer>> {
        let data: PageData<Customer> =
            self.get("/customers", &RecordQuery::page(cursor)).await?;
        Ok(data.into_page(cursor))
    }

    #[instrument(skip(self), err)]
    pub async fn customer_groups(&self) -> Result<Vec<CustomerGroup>> {
        let request = self.http.get("/customers/group").bearer_auth(self.tokens.current_token());
        let response = self.http.send(request).await?;
        let data: GroupData<CustomerGroup> = read_data(response, QdmSyncError::RemoteApi).await?;
        debug!(groups = data.result.len(), "customer groups received");
        Ok(data.result)
    }

    async fn get<D>(&self, path: &str, query: &RecordQuery) -> Result<D>
    where
        D: DeserializeOwned,
    {
        let request = self
            .http
            .get(path)
            .bearer_auth(self.tokens.current_token())
            .query(&query.to_pairs());

        let response = self.http.send(request).await?;
        read_data(response, QdmSyncError::RemoteApi).await
    }
}

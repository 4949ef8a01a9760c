//! Domain types and models

pub mod credential;
pub mod lenient;
pub mod paging;
pub mod progress;
pub mod records;
pub mod time;

pub use credential::Credential;
pub use paging::{Page, PageCursor, TimeWindow};
pub use progress::{Progress, SyncReport};
pub use records::{
    AddressInfo, Customer, CustomerGroup, Order, OrderItem, OrderProductOption, OrderSubtotal,
};

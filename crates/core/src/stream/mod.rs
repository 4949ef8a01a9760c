//! Record streams and the paged fetcher that feeds them

pub mod fetcher;
pub mod ports;
mod record_stream;

pub use record_stream::RecordStream;

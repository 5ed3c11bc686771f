//! HTTP transport

pub mod fetcher;

pub use fetcher::{HttpResourceFetcher, HttpResourceFetcherBuilder};

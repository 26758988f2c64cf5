//! Identification service adapters

mod http;

pub use http::HttpIdentifier;

//! Google API clients
//!
//! An authenticated HTTP client plus thin wrappers for the Drive v3
//! listing/search endpoints and the Docs/Sheets/Slides structured-content
//! endpoints. All payloads are handled as `serde_json::Value`; typed
//! extraction happens at the edges.

pub mod client;
pub mod content;
pub mod drive;

pub use client::{GoogleClient, Timeouts};
pub use content::{DocsApi, SheetsApi, SlidesApi};
pub use drive::DriveApi;

/// Implements the standard wrapper constructor: each API struct wraps a
/// `GoogleClient` and provides `new(client)`.
macro_rules! google_api_wrapper {
    ($name:ident) => {
        impl $name {
            pub fn new(client: crate::google::client::GoogleClient) -> Self {
                Self { client }
            }
        }
    };
}

pub(crate) use google_api_wrapper;

//! Core library for the gdocs MCP server.
//!
//! Layers, bottom up: OAuth credential storage and refresh (`auth`),
//! an authenticated Google API client with Drive/Docs/Sheets/Slides
//! endpoints (`google`), native-JSON-to-text conversion (`convert`),
//! a short-lived content cache (`cache`), and the `DocumentService`
//! facade the tool dispatcher talks to (`service`).

pub mod auth;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod google;
pub mod service;

pub use config::Config;
pub use error::{Error, Result};
pub use google::drive::DocumentMetadata;
pub use service::{DocumentContent, DocumentService, GoogleWorkspaceService};

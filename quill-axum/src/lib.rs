//! quill-axum: Axum adapter for Quill.
//!
//! Mounts [`quill_core::QuillService`]s as REST resources, adds upload and
//! file-serving routes, and maps [`quill_core::QuillError`] to HTTP
//! responses with a JSON `{error}` body.

pub mod app;
pub mod files;
pub mod params;
pub mod rest;
pub mod state;
mod error;

pub use app::{axum, AxumApp};
pub use error::QuillAxumError;
pub use files::{FileSink, FileSource, IncomingFile, ServedFile};
pub use state::QuillAxumState;

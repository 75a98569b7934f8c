//! # quill-media: storage for uploaded images and video
//!
//! Uploads arrive as byte streams and are written straight to a
//! [`MediaStore`] without buffering the whole file. [`MediaAdapter`] sits in
//! front of the store and applies the upload rules:
//!
//! - only configured extensions are accepted (case-insensitive);
//! - the size ceiling is enforced while streaming, and a file that crosses
//!   it is discarded;
//! - empty files are rejected;
//! - every upload gets a fresh `<unix-millis>-<random>.<ext>` name.
//!
//! ```text
//! ┌─────────────────┐
//! │  HTTP / caller  │
//! ├─────────────────┤
//! │  MediaAdapter   │  ← upload rules, naming, content types
//! ├─────────────────┤
//! │   MediaStore    │  ← filesystem or memory
//! └─────────────────┘
//! ```

pub mod adapter;
mod config;
mod error;
mod receipt;
pub mod store;
mod types;

pub use adapter::MediaAdapter;
pub use config::{content_type_for, MediaConfig, DEFAULT_MAX_BYTES};
pub use error::{MediaError, MediaResult};
pub use receipt::{MediaReceipt, OpenedMedia};
pub use store::{FsMediaStore, GetResult, MediaStore, MemoryMediaStore, PutResult};
pub use types::{ByteStream, CheckedStream, MediaPut};

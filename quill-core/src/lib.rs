//! quill-core: transport-agnostic core for the Quill blog backend.
//!
//! Resources are exposed as services implementing [`QuillService`]. A
//! [`QuillApp`] owns the service registry, the configuration store and the
//! hook pipeline (around → before → service → after → error) that every call
//! goes through, whatever transport triggered it.

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod registry;
pub mod service;
pub mod validation;

pub use app::{QuillApp, ServiceHandle};
pub use config::{load_env_config, QuillConfig, QuillConfigSnapshot};
pub use errors::{ErrorKind, QuillError};
pub use hooks::{AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookResult, Next, ServiceHooks};
pub use registry::ServiceRegistry;
pub use service::{QuillService, ServiceCapabilities, ServiceMethodKind};

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::QuillError;

/// Standard service methods: find, get, create, update, remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Which methods a service exposes to the outside world.
///
/// Transports (like quill-axum) mount only the allowed routes.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

/// Core service trait.
///
/// - `find`   → list many
/// - `get`    → fetch one by id
/// - `create` → create one
/// - `update` → change an existing record; whether missing fields are kept
///   or cleared is up to the service
/// - `remove` → delete one, returning what was removed
///
/// Every method defaults to a `NotImplemented` error so a service only
/// overrides what it supports.
#[async_trait]
pub trait QuillService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _params: P) -> Result<Vec<R>> {
        Err(QuillError::not_implemented("Method not implemented: find").into_anyhow())
    }

    async fn get(&self, _id: &str, _params: P) -> Result<R> {
        Err(QuillError::not_implemented("Method not implemented: get").into_anyhow())
    }

    async fn create(&self, _data: R, _params: P) -> Result<R> {
        Err(QuillError::not_implemented("Method not implemented: create").into_anyhow())
    }

    async fn update(&self, _id: &str, _data: R, _params: P) -> Result<R> {
        Err(QuillError::not_implemented("Method not implemented: update").into_anyhow())
    }

    async fn remove(&self, _id: &str, _params: P) -> Result<R> {
        Err(QuillError::not_implemented("Method not implemented: remove").into_anyhow())
    }
}

//! Hooks wrap every service call:
//!
//! ```text
//! around(outermost) → … → before* → service → after* → … → around
//!                                      │
//!                                   error* (only when something failed)
//! ```
//!
//! App-wide hooks run before service hooks of the same stage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;

use crate::{QuillConfigSnapshot, QuillService, ServiceMethodKind};

/// What a service call produced.
#[derive(Debug, Clone)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// State shared by every hook of one service call.
pub struct HookContext<R, P> {
    pub service: String,
    pub method: ServiceMethodKind,
    pub id: Option<String>,
    pub params: P,
    /// Input payload for `create`/`update`.
    pub data: Option<R>,
    /// Output, available to after hooks.
    pub result: Option<HookResult<R>>,
    /// Failure, available to error hooks. Clearing it recovers the call.
    pub error: Option<anyhow::Error>,
    pub config: QuillConfigSnapshot,
    pub started_at: Instant,
}

impl<R, P> HookContext<R, P> {
    pub fn new(
        service: impl Into<String>,
        method: ServiceMethodKind,
        id: Option<String>,
        params: P,
        config: QuillConfigSnapshot,
    ) -> Self {
        Self {
            service: service.into(),
            method,
            id,
            params,
            data: None,
            result: None,
            error: None,
            config,
            started_at: Instant::now(),
        }
    }
}

#[async_trait]
pub trait BeforeHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait AfterHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait ErrorHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait AroundHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    /// Must call `next.run(ctx)` exactly once to continue the chain.
    async fn run(&self, ctx: &mut HookContext<R, P>, next: Next<R, P>) -> Result<()>;
}

type Around<R, P> = Arc<dyn AroundHook<R, P>>;
type Before<R, P> = Arc<dyn BeforeHook<R, P>>;
type After<R, P> = Arc<dyn AfterHook<R, P>>;
type OnError<R, P> = Arc<dyn ErrorHook<R, P>>;

/// Hooks registered either app-wide or for one service.
pub struct ServiceHooks<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub around_all: Vec<Around<R, P>>,
    pub before_all: Vec<Before<R, P>>,
    pub after_all: Vec<After<R, P>>,
    pub error_all: Vec<OnError<R, P>>,

    pub around_by_method: HashMap<ServiceMethodKind, Vec<Around<R, P>>>,
    pub before_by_method: HashMap<ServiceMethodKind, Vec<Before<R, P>>>,
    pub after_by_method: HashMap<ServiceMethodKind, Vec<After<R, P>>>,
    pub error_by_method: HashMap<ServiceMethodKind, Vec<OnError<R, P>>>,
}

impl<R, P> Default for ServiceHooks<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self {
            around_all: Vec::new(),
            before_all: Vec::new(),
            after_all: Vec::new(),
            error_all: Vec::new(),
            around_by_method: HashMap::new(),
            before_by_method: HashMap::new(),
            after_by_method: HashMap::new(),
            error_by_method: HashMap::new(),
        }
    }
}

impl<R, P> ServiceHooks<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn around_all(&mut self, hook: Around<R, P>) -> &mut Self {
        self.around_all.push(hook);
        self
    }

    pub fn before_all(&mut self, hook: Before<R, P>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn after_all(&mut self, hook: After<R, P>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn error_all(&mut self, hook: OnError<R, P>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn around(&mut self, method: ServiceMethodKind, hook: Around<R, P>) -> &mut Self {
        self.around_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Before<R, P>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: After<R, P>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: OnError<R, P>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_create(&mut self, hook: Before<R, P>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn before_update(&mut self, hook: Before<R, P>) -> &mut Self {
        self.before(ServiceMethodKind::Update, hook)
    }

    pub fn after_find(&mut self, hook: After<R, P>) -> &mut Self {
        self.after(ServiceMethodKind::Find, hook)
    }
}

/// `all` hooks first, then the ones registered for `method`.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: &ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out: Vec<Arc<H>> = all.to_vec();
    if let Some(v) = by_method.get(method) {
        out.extend(v.iter().cloned());
    }
    out
}

/// The part of the pipeline inside the around hooks.
pub(crate) struct Core<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub(crate) before: Vec<Before<R, P>>,
    pub(crate) after: Vec<After<R, P>>,
    pub(crate) service: Arc<dyn QuillService<R, P>>,
}

impl<R, P> Core<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        for h in &self.before {
            h.run(ctx).await?;
        }

        invoke(self.service.as_ref(), ctx).await?;

        for h in &self.after {
            h.run(ctx).await?;
        }

        Ok(())
    }
}

/// Dispatch `ctx.method` to the service and store what it returns.
async fn invoke<R, P>(svc: &dyn QuillService<R, P>, ctx: &mut HookContext<R, P>) -> Result<()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    let params = ctx.params.clone();
    let method = ctx.method;
    let result = match method {
        ServiceMethodKind::Find => HookResult::Many(svc.find(params).await?),
        ServiceMethodKind::Get => {
            let id = require_id(ctx)?;
            HookResult::One(svc.get(&id, params).await?)
        }
        ServiceMethodKind::Create => {
            let data = take_data(ctx)?;
            HookResult::One(svc.create(data, params).await?)
        }
        ServiceMethodKind::Update => {
            let id = require_id(ctx)?;
            let data = take_data(ctx)?;
            HookResult::One(svc.update(&id, data, params).await?)
        }
        ServiceMethodKind::Remove => {
            let id = require_id(ctx)?;
            HookResult::One(svc.remove(&id, params).await?)
        }
    };
    ctx.result = Some(result);
    Ok(())
}

fn require_id<R, P>(ctx: &HookContext<R, P>) -> Result<String> {
    ctx.id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{}() requires an id", ctx.method.as_str()))
}

fn take_data<R, P>(ctx: &mut HookContext<R, P>) -> Result<R> {
    let method = ctx.method;
    ctx.data
        .take()
        .ok_or_else(|| anyhow::anyhow!("{}() requires ctx.data", method.as_str()))
}

/// Continuation handed to around hooks.
pub struct Next<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub(crate) remaining: Vec<Around<R, P>>,
    pub(crate) core: Arc<Core<R, P>>,
}

impl<R, P> Next<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub async fn run(mut self, ctx: &mut HookContext<R, P>) -> Result<()> {
        if self.remaining.is_empty() {
            return self.core.run(ctx).await;
        }
        let hook = self.remaining.remove(0);
        hook.run(ctx, self).await
    }
}

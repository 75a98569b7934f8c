use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::errors::QuillError;
use crate::hooks::{collect_method_hooks, Core};
use crate::{
    AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookResult, Next, QuillConfig,
    QuillConfigSnapshot, QuillService, ServiceHooks, ServiceMethodKind, ServiceRegistry,
};

struct QuillAppInner<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    registry: RwLock<ServiceRegistry<R, P>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<QuillConfig>,
}

/// Central application container.
///
/// Holds the service registry, app-wide and per-service hooks, and the
/// configuration store. Cloning is cheap and shares the same state.
pub struct QuillApp<R, P = ()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    inner: Arc<QuillAppInner<R, P>>,
}

type HooksForMethod<R, P> = (
    Vec<Arc<dyn AroundHook<R, P>>>,
    Vec<Arc<dyn BeforeHook<R, P>>>,
    Vec<Arc<dyn AfterHook<R, P>>>,
    Vec<Arc<dyn ErrorHook<R, P>>>,
);

impl<R, P> Default for QuillApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for QuillApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> QuillApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QuillAppInner {
                registry: RwLock::new(ServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(QuillConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn QuillService<R, P>>)
    where
        S: Into<String>,
    {
        let name = name.into();
        tracing::debug!(service = %name, "registering service");
        self.inner.registry.write().register(name, service);
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .registry
            .read()
            .names()
            .map(|s| s.to_string())
            .collect();
        names.sort();
        names
    }

    /// Register app-wide hooks.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    pub(crate) fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = self.inner.service_hooks.write();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    /// Look up a registered service; calls made through the handle run the
    /// full hook pipeline.
    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let svc = self
            .inner
            .registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| QuillError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    pub fn config_snapshot(&self) -> QuillConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

pub struct ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    app: QuillApp<R, P>,
    name: String,
    service: Arc<dyn QuillService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    /// Register hooks for this service only.
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &Arc<dyn QuillService<R, P>> {
        &self.service
    }

    /// App-wide hooks first, then service hooks.
    fn collect_hooks_for_method(&self, method: &ServiceMethodKind) -> HooksForMethod<R, P> {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();
        let s = map.get(&self.name);

        let mut around = collect_method_hooks(&g.around_all, &g.around_by_method, method);
        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = s {
            around.extend(collect_method_hooks(&h.around_all, &h.around_by_method, method));
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        (around, before, after, error)
    }

    fn context(&self, method: ServiceMethodKind, id: Option<&str>, params: P) -> HookContext<R, P> {
        HookContext::new(
            self.name.clone(),
            method,
            id.map(|s| s.to_string()),
            params,
            self.app.config_snapshot(),
        )
    }

    /// around → before → service → after, then error hooks on failure.
    async fn run_pipeline(&self, mut ctx: HookContext<R, P>) -> Result<HookContext<R, P>> {
        if !self.service.capabilities().allows(ctx.method) {
            return Err(QuillError::method_not_allowed(format!(
                "Method '{}' is not allowed on service '{}'",
                ctx.method.as_str(),
                self.name
            ))
            .into_anyhow());
        }

        let (around, before, after, error) = self.collect_hooks_for_method(&ctx.method);

        let next = Next {
            remaining: around,
            core: Arc::new(Core {
                before,
                after,
                service: Arc::clone(&self.service),
            }),
        };

        if let Err(e) = next.run(&mut ctx).await {
            ctx.error = Some(e);

            for h in &error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    tracing::warn!(service = %self.name, error = %hook_err, "error hook failed");
                }
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    pub async fn find(&self, params: P) -> Result<Vec<R>> {
        let ctx = self.context(ServiceMethodKind::Find, None, params);
        let ctx = self.run_pipeline(ctx).await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(_)) => Err(anyhow::anyhow!("find() produced HookResult::One unexpectedly")),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, id: &str, params: P) -> Result<R> {
        let ctx = self.context(ServiceMethodKind::Get, Some(id), params);
        let ctx = self.run_pipeline(ctx).await?;
        one(ctx, "get")
    }

    pub async fn create(&self, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Create, None, params);
        ctx.data = Some(data);
        let ctx = self.run_pipeline(ctx).await?;
        one(ctx, "create")
    }

    pub async fn update(&self, id: &str, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Update, Some(id), params);
        ctx.data = Some(data);
        let ctx = self.run_pipeline(ctx).await?;
        one(ctx, "update")
    }

    pub async fn remove(&self, id: &str, params: P) -> Result<R> {
        let ctx = self.context(ServiceMethodKind::Remove, Some(id), params);
        let ctx = self.run_pipeline(ctx).await?;
        one(ctx, "remove")
    }
}

fn one<R, P>(ctx: HookContext<R, P>, method: &str) -> Result<R> {
    match ctx.result {
        Some(HookResult::One(v)) => Ok(v),
        Some(HookResult::Many(_)) => Err(anyhow::anyhow!("{method}() produced HookResult::Many unexpectedly")),
        None => Err(anyhow::anyhow!("{method}() produced no result")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::ServiceCapabilities;

    /// Remembers notes in a Vec and hands out their index as id.
    #[derive(Default)]
    struct Notes {
        items: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QuillService<String, ()> for Notes {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![
                ServiceMethodKind::Find,
                ServiceMethodKind::Get,
                ServiceMethodKind::Create,
            ])
        }

        async fn find(&self, _params: ()) -> Result<Vec<String>> {
            Ok(self.items.lock().clone())
        }

        async fn get(&self, id: &str, _params: ()) -> Result<String> {
            let idx: usize = id.parse().map_err(|_| QuillError::bad_request("bad id").into_anyhow())?;
            self.items
                .lock()
                .get(idx)
                .cloned()
                .ok_or_else(|| QuillError::not_found(format!("Note not found: {id}")).into_anyhow())
        }

        async fn create(&self, data: String, _params: ()) -> Result<String> {
            self.items.lock().push(data.clone());
            Ok(data)
        }
    }

    struct Trail(Arc<Mutex<Vec<String>>>, &'static str);

    #[async_trait]
    impl BeforeHook<String, ()> for Trail {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.0.lock().push(format!("before:{}", self.1));
            Ok(())
        }
    }

    #[async_trait]
    impl AfterHook<String, ()> for Trail {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.0.lock().push(format!("after:{}", self.1));
            Ok(())
        }
    }

    #[async_trait]
    impl AroundHook<String, ()> for Trail {
        async fn run(&self, ctx: &mut HookContext<String, ()>, next: Next<String, ()>) -> Result<()> {
            self.0.lock().push(format!("enter:{}", self.1));
            let res = next.run(ctx).await;
            self.0.lock().push(format!("leave:{}", self.1));
            res
        }
    }

    struct Upper;

    #[async_trait]
    impl BeforeHook<String, ()> for Upper {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            if let Some(d) = ctx.data.as_mut() {
                *d = d.to_uppercase();
            }
            Ok(())
        }
    }

    struct Recover(AtomicUsize);

    #[async_trait]
    impl ErrorHook<String, ()> for Recover {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            ctx.error = None;
            ctx.result = Some(HookResult::One("fallback".to_string()));
            Ok(())
        }
    }

    fn app() -> QuillApp<String, ()> {
        let app = QuillApp::new();
        app.register_service("notes", Arc::new(Notes::default()));
        app
    }

    #[tokio::test]
    async fn hooks_run_in_pipeline_order() {
        let app = app();
        let trail = Arc::new(Mutex::new(Vec::new()));

        app.hooks(|h| {
            h.around_all(Arc::new(Trail(Arc::clone(&trail), "app")));
            h.before_all(Arc::new(Trail(Arc::clone(&trail), "app")));
            h.after_all(Arc::new(Trail(Arc::clone(&trail), "app")));
        });
        let notes = app.service("notes").unwrap().hooks(|h| {
            h.around_all(Arc::new(Trail(Arc::clone(&trail), "svc")));
            h.before_create(Arc::new(Trail(Arc::clone(&trail), "svc")));
        });

        notes.create("hi".to_string(), ()).await.unwrap();

        assert_eq!(
            *trail.lock(),
            vec![
                "enter:app",
                "enter:svc",
                "before:app",
                "before:svc",
                "after:app",
                "leave:svc",
                "leave:app",
            ]
        );
    }

    #[tokio::test]
    async fn before_hook_can_rewrite_data() {
        let app = app();
        let notes = app.service("notes").unwrap().hooks(|h| {
            h.before_create(Arc::new(Upper));
        });

        let created = notes.create("quiet".to_string(), ()).await.unwrap();
        assert_eq!(created, "QUIET");
        assert_eq!(notes.find(()).await.unwrap(), vec!["QUIET".to_string()]);
    }

    #[tokio::test]
    async fn disallowed_method_is_rejected_before_hooks() {
        let app = app();
        let notes = app.service("notes").unwrap();

        let err = notes.remove("0", ()).await.unwrap_err();
        let quill = QuillError::from_anyhow(&err).unwrap();
        assert_eq!(quill.code(), 405);
    }

    #[tokio::test]
    async fn error_hook_may_recover() {
        let app = app();
        let recover = Arc::new(Recover(AtomicUsize::new(0)));
        let notes = app.service("notes").unwrap().hooks(|h| {
            h.error(ServiceMethodKind::Get, recover.clone());
        });

        let got = notes.get("9", ()).await.unwrap();
        assert_eq!(got, "fallback");
        assert_eq!(recover.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_keep_their_kind_without_error_hooks() {
        let app = app();
        let notes = app.service("notes").unwrap();

        let err = notes.get("3", ()).await.unwrap_err();
        assert_eq!(QuillError::from_anyhow(&err).unwrap().code(), 404);
    }

    #[test]
    fn unknown_service_is_not_found() {
        let app = app();
        let err = app.service("ghosts").err().unwrap();
        assert_eq!(QuillError::from_anyhow(&err).unwrap().code(), 404);
        assert_eq!(app.service_names(), vec!["notes".to_string()]);
    }
}

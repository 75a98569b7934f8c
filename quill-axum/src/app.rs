use std::path::Path;
use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use quill_core::{QuillApp, QuillService};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::files::{self, FileSink, FileSource};
use crate::params::FromRestParams;
use crate::rest;

pub struct AxumApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: Arc<QuillApp<R, P>>,
    routes: Router<()>,
    cors: bool,
}

impl<R, P> Clone for AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            routes: self.routes.clone(),
            cors: self.cors,
        }
    }
}

impl<R, P> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: QuillApp<R, P>) -> Self {
        Self {
            app: Arc::new(app),
            routes: Router::new(),
            cors: false,
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.routes = self.routes.nest(path, router);
        self
    }

    pub fn use_get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let router = Router::new().route("/", get(handler));
        self.use_router(path, router)
    }

    pub fn service<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.use_get(path, handler)
    }

    /// Register `service` under `path` (minus the leading slash) and expose
    /// it as a REST resource.
    pub fn use_service(mut self, path: &str, service: Arc<dyn QuillService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        let caps = service.capabilities();
        self.app.register_service(name, service);

        let service_name = Arc::new(name.to_string());
        let router = rest::service_router(service_name, &caps, Arc::clone(&self.app));

        self.routes = self.routes.nest(path, router);
        self
    }

    pub fn use_upload(self, path: &str, field_name: &str, sink: Arc<dyn FileSink>, body_limit: usize) -> Self {
        self.use_router(path, files::upload_router(field_name, sink, body_limit))
    }

    pub fn use_files(self, path: &str, source: Arc<dyn FileSource>) -> Self {
        self.use_router(path, files::files_router(source))
    }

    /// Serve `dir` for every path no route claims.
    pub fn fallback_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.routes = self.routes.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
        self
    }

    pub fn cors_permissive(mut self) -> Self {
        self.cors = true;
        self
    }

    /// The finished router with request ids and tracing around every route.
    pub fn router(&self) -> Router<()> {
        let mut router = self
            .routes
            .clone()
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if self.cors {
            router = router.layer(CorsLayer::permissive());
        }
        router
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

pub fn axum<R, P>(app: QuillApp<R, P>) -> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    AxumApp::new(app)
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use quill_core::{AroundHook, HookContext, Next, QuillApp};
use serde_json::Value;

use crate::services::BlogParams;

/// Saturates instead of wrapping for absurd durations.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Logs every service call with its outcome and duration.
pub struct LogAround;

#[async_trait]
impl AroundHook<Value, BlogParams> for LogAround {
    async fn run(&self, ctx: &mut HookContext<Value, BlogParams>, next: Next<Value, BlogParams>) -> Result<()> {
        let service = ctx.service.clone();
        let method = ctx.method.as_str();
        let path = ctx.params.path.clone();
        let request_id = ctx.params.request_id().unwrap_or("-").to_string();

        let res = next.run(ctx).await;
        let elapsed_ms = whole_millis(ctx.started_at.elapsed());

        match &res {
            Ok(()) => tracing::info!(%service, method, %path, %request_id, elapsed_ms, "ok"),
            Err(err) => tracing::warn!(%service, method, %path, %request_id, elapsed_ms, error = %err, "failed"),
        }
        res
    }
}

pub fn global_hooks(app: &QuillApp<Value, BlogParams>) {
    app.hooks(|h| {
        h.around_all(Arc::new(LogAround));
    });
}

use anyhow::Result;
use quill_axum::{axum, AxumApp};
use quill_core::QuillApp;
use serde_json::Value;

use crate::services::BlogParams;

pub fn blog_app() -> Result<AxumApp<Value, BlogParams>> {
    let quill_app: QuillApp<Value, BlogParams> = QuillApp::new();
    crate::config::config(&quill_app)?;
    crate::hooks::global_hooks(&quill_app);

    let blog_app: AxumApp<Value, BlogParams> = axum(quill_app);
    Ok(blog_app)
}

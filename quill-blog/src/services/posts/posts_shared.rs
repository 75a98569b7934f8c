use std::sync::Arc;

use quill_core::{QuillApp, ServiceCapabilities, ServiceMethodKind};
use serde_json::Value;

use crate::services::BlogParams;

use super::posts_hooks::{SummarizeForList, ValidateCreatePost, ValidateUpdatePost};
use super::preview::Previewer;

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Create,
        ServiceMethodKind::Update,
        ServiceMethodKind::Remove,
    ])
}

pub fn register_hooks(app: &QuillApp<Value, BlogParams>, service: &str) -> anyhow::Result<()> {
    let previewer = Previewer::new()?;

    app.service(service)?.hooks(|h| {
        h.before_create(Arc::new(ValidateCreatePost));
        h.before_update(Arc::new(ValidateUpdatePost));

        h.after_find(Arc::new(SummarizeForList::new(previewer)));
    });
    Ok(())
}

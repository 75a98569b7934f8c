use quill_core::validation::not_blank;
use serde::Deserialize;
use validator::Validate;

pub const INVALID_POST: &str = "Post payload is invalid";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePost {
    #[validate(required, custom(function = "not_blank"))]
    pub title: Option<String>,

    #[validate(required, custom(function = "not_blank"))]
    pub content: Option<String>,
}

/// Absent fields are left unchanged; present ones must not be blank.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePost {
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub content: Option<String>,
}

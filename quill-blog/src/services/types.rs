pub type BlogParams = quill_axum::params::RestParams;

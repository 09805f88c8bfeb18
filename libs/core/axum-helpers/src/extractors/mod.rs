//! Custom extractors for Axum handlers.
//!
//! Rejections are turned into [`AppError`](crate::errors::AppError) so every
//! extractor failure renders as `{"error": "..."}`.

pub mod json_body;

pub use json_body::JsonBody;

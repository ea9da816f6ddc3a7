//! Request extractors whose rejections use the `{ "error": ... }` body

use axum::extract::{FromRequest, FromRequestParts};

use crate::http::routes::AppError;

/// `axum::Json` that rejects malformed bodies with a 400 `AppError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

//! Extractors whose rejections render like every other API error.

use crate::server::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json`, rejecting with a 400 `{"detail"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query`, rejecting with a 400 `{"detail"}` body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

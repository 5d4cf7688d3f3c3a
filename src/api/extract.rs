//! Request extractors rejecting with the gateway error body

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body whose rejection renders as an `AppError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

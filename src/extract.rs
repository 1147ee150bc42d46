//! Wrappers around axum's extractors whose rejections are
//! [`FailureResponse`]s, so that malformed requests get the same pages as
//! every other error.

use axum::extract::{
    FromRequest, FromRequestParts,
    rejection::{FormRejection, PathRejection, QueryRejection},
};

use crate::util_resp::FailureResponse;

/// A path segment which does not parse (e.g. `/team/abc`) names nothing,
/// so it is a 404.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(FailureResponse))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(FailureResponse))]
pub struct Query<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(FailureResponse))]
pub struct Form<T>(pub T);

impl From<PathRejection> for FailureResponse {
    fn from(e: PathRejection) -> Self {
        tracing::debug!(error = %e, "unparseable path");
        FailureResponse::NotFound
    }
}

impl From<QueryRejection> for FailureResponse {
    fn from(e: QueryRejection) -> Self {
        tracing::debug!(error = %e, "unparseable query string");
        FailureResponse::malformed_request()
    }
}

impl From<FormRejection> for FailureResponse {
    fn from(e: FormRejection) -> Self {
        tracing::debug!(error = %e, "unparseable form");
        FailureResponse::malformed_request()
    }
}

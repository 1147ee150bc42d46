//! Response types shared by every handler.
//!
//! Handlers return a [`StandardResponse`]. Every failure is a
//! [`FailureResponse`], which is the single place where errors are mapped
//! onto status codes and pages. Database and pool errors convert into it
//! with `?`, so handlers do not log or translate errors themselves.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use hypertext::prelude::*;

use crate::{state::AppState, template::Page, widgets::alert::ErrorAlert};

pub fn see_other_ok(r: Redirect) -> StandardResponse {
    Ok(SuccessResponse::SeeOther(r))
}

pub fn err_not_found() -> StandardResponse {
    Err(FailureResponse::NotFound)
}

pub fn bad_request(page: Rendered<String>) -> StandardResponse {
    Err(FailureResponse::BadRequest(page))
}

pub fn success(page: Rendered<String>) -> StandardResponse {
    Ok(SuccessResponse::Success(page))
}

/// hypertext only implements `IntoResponse` for axum 0.8.
pub fn html(page: Rendered<String>) -> Html<String> {
    Html(page.into_inner())
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

pub enum SuccessResponse {
    Success(Rendered<String>),
    SeeOther(Redirect),
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Success(page) => html(page).into_response(),
            SuccessResponse::SeeOther(redirect) => redirect.into_response(),
        }
    }
}

#[derive(Debug)]
pub enum FailureResponse {
    /// A form was rejected. The page explains why.
    BadRequest(Rendered<String>),
    NotFound,
    /// The database could not be reached (or is not configured). The
    /// message is shown to the user.
    ServiceUnavailable(&'static str),
    /// The detail is logged, and only shown to users in development.
    ServerError(String),
}

pub const DATABASE_UNAVAILABLE: &str =
    "The database is currently unavailable. Please try again in a moment.";

pub const DATABASE_NOT_CONFIGURED: &str =
    "The database connection is not configured. Set the DATABASE_URL \
     environment variable to the location of the SQLite database and \
     restart the server.";

/// Attached to the extensions of 500 responses so that
/// [`expose_error_detail`] can show it in development.
#[derive(Clone, Debug)]
pub struct ErrorDetail(pub String);

impl FailureResponse {
    /// A request whose query string or form body could not be read at all.
    pub fn malformed_request() -> Self {
        FailureResponse::BadRequest(
            Page::new()
                .body(maud! {
                    div class="container py-5" {
                        ErrorAlert msg="The request could not be understood.";
                    }
                })
                .render(),
        )
    }

    pub fn server_error(detail: impl ToString) -> Self {
        let detail = detail.to_string();
        tracing::error!(error = %detail, "request failed");
        FailureResponse::ServerError(detail)
    }
}

impl From<DieselError> for FailureResponse {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => FailureResponse::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection
                | DatabaseErrorKind::UnableToSendCommand,
                info,
            ) => {
                tracing::warn!(error = %info.message(), "lost database connection");
                FailureResponse::ServiceUnavailable(DATABASE_UNAVAILABLE)
            }
            e => FailureResponse::server_error(e),
        }
    }
}

impl From<diesel::r2d2::PoolError> for FailureResponse {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        tracing::warn!(error = %e, "could not check out a database connection");
        FailureResponse::ServiceUnavailable(DATABASE_UNAVAILABLE)
    }
}

impl From<tokio::task::JoinError> for FailureResponse {
    fn from(e: tokio::task::JoinError) -> Self {
        FailureResponse::server_error(e)
    }
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        match self {
            FailureResponse::BadRequest(page) => {
                (StatusCode::BAD_REQUEST, html(page)).into_response()
            }
            FailureResponse::NotFound => (
                StatusCode::NOT_FOUND,
                html(Page::new()
                    .body(maud! {
                        div class="container py-5" {
                            h1 { "Not found" }
                            p { "The page you were looking for does not exist." }
                        }
                    })
                    .render()),
            )
                .into_response(),
            FailureResponse::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                html(Page::new()
                    .body(maud! {
                        div class="container py-5" {
                            ErrorAlert msg=(msg);
                        }
                    })
                    .render()),
            )
                .into_response(),
            FailureResponse::ServerError(detail) => {
                let mut res = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    html(Page::new()
                        .body(maud! {
                            div class="container py-5" {
                                ErrorAlert msg="Internal server error.";
                            }
                        })
                        .render()),
                )
                    .into_response();
                res.extensions_mut().insert(ErrorDetail(detail));
                res
            }
        }
    }
}

/// Response middleware: in development, replaces the body of failed
/// requests with the underlying error.
pub async fn expose_error_detail(
    State(state): State<AppState>,
    res: Response,
) -> Response {
    if !state.config.environment.exposes_errors() {
        return res;
    }

    match res.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => (res.status(), detail).into_response(),
        None => res,
    }
}

pub async fn not_found() -> FailureResponse {
    FailureResponse::NotFound
}

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::{NaiveDateTime, TimeDelta, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    schema::admins,
    state::{AppState, ThreadSafeConn},
    util_resp::FailureResponse,
};

pub mod bootstrap;
pub mod login;

pub const LOGIN_COOKIE: &str = "matchday_session";

/// How long a login lasts.
pub const SESSION_HOURS: i64 = 12;

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug)]
pub enum AuthError {
    /// No valid session. Carries the path to come back to after logging in.
    LoginRequired(String),
    Failure(FailureResponse),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::LoginRequired(next) => Redirect::to(&format!(
                "/admin/login?next={}",
                url::form_urlencoded::byte_serialize(next.as_bytes())
                    .collect::<String>()
            ))
            .into_response(),
            AuthError::Failure(failure) => failure.into_response(),
        }
    }
}

/// The contents of the (encrypted) session cookie.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginSession {
    admin_id: i32,
    expiry: NaiveDateTime,
}

/// Extracting an [`Admin`] is the capability check for every admin page:
/// requests without a valid session never reach the handler.
#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // nested routers only see the part of the path below `/admin`
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.clone())
            .unwrap_or_else(|| parts.uri.clone());
        let next = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/admin/dashboard".to_string());

        let jar: PrivateCookieJar =
            PrivateCookieJar::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::LoginRequired(next.clone()))?;

        let login: LoginSession = match jar
            .get(LOGIN_COOKIE)
            .and_then(|c| serde_json::from_str::<LoginSession>(c.value()).ok())
        {
            Some(t) if Utc::now().naive_utc() < t.expiry => t,
            _ => return Err(AuthError::LoginRequired(next)),
        };

        let conn_wrapper = ThreadSafeConn::from_request_parts(parts, state)
            .await
            .map_err(AuthError::Failure)?;

        let mut conn = conn_wrapper.inner.try_lock().map_err(|_| {
            AuthError::Failure(FailureResponse::server_error(
                "the request's database connection is already in use",
            ))
        })?;

        let admin = admins::table
            .filter(admins::id.eq(login.admin_id))
            .first::<Admin>(&mut *conn)
            .optional()
            .map_err(|e| AuthError::Failure(e.into()))?;

        match admin {
            Some(admin) => Ok(admin),
            None => {
                tracing::info!(
                    admin_id = login.admin_id,
                    "session refers to an admin which no longer exists"
                );
                Err(AuthError::LoginRequired(next))
            }
        }
    }
}

pub fn set_login_cookie(
    admin_id: i32,
    secure: bool,
    jar: PrivateCookieJar,
) -> PrivateCookieJar {
    let session = LoginSession {
        admin_id,
        expiry: Utc::now().naive_utc() + TimeDelta::hours(SESSION_HOURS),
    };

    // serialising two plain fields cannot fail
    let value = serde_json::to_string(&session).unwrap_or_default();

    jar.add(
        Cookie::build((LOGIN_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure),
    )
}

pub fn clear_login_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(LOGIN_COOKIE).path("/"))
}

pub fn hash_password(
    password: &str,
) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks `password` against a PHC-format argon2 hash. The comparison is
/// done by argon2 in constant time. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("StrongPassword!123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("StrongPassword!123", &hash));
        assert!(!verify_password("strongpassword!123", &hash));
        assert!(!verify_password("StrongPassword!123", "not a hash"));
    }
}

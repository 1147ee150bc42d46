use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use diesel::prelude::*;
use hypertext::prelude::*;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tokio::task::spawn_blocking;
use url::Url;

use crate::{
    auth::{
        Admin, clear_login_cookie, hash_password, set_login_cookie,
        verify_password,
    },
    config::Environment,
    extract::{Form, Query},
    schema::admins,
    state::{AppState, Conn},
    template::Page,
    util_resp::{FailureResponse, html},
    widgets::alert::MaybeError,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Checked when the username does not exist, so that an unknown username
/// costs as much as a wrong password.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    hash_password("matchday-dummy-password").unwrap_or_default()
});

#[derive(Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

struct LoginForm<'a> {
    next: Option<&'a str>,
    error: Option<&'a str>,
}

impl Renderable for LoginForm<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let action = match self.next {
            Some(next) => format!(
                "/admin/login?next={}",
                url::form_urlencoded::byte_serialize(next.as_bytes())
                    .collect::<String>()
            ),
            None => "/admin/login".to_string(),
        };

        maud! {
            div class="container py-5" style="max-width: 28rem;" {
                h1 { "Admin login" }
                MaybeError error=(self.error);
                form method="post" action=(action) {
                    div class="mb-3" {
                        label for="username" class="form-label" { "Username" }
                        input type="text" class="form-control" id="username" name="username" required;
                    }
                    div class="mb-3" {
                        label for="password" class="form-label" { "Password" }
                        input type="password" class="form-control" id="password" name="password" required;
                    }
                    button type="submit" class="btn btn-primary" { "Log in" }
                }
            }
        }
        .render_to(buffer);
    }
}

pub async fn login_page(
    admin: Option<Admin>,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to(&redirect_target(query.next.as_deref()))
            .into_response();
    }

    html(
        Page::new()
            .body(LoginForm {
                next: query.next.as_deref(),
                error: None,
            })
            .render(),
    )
    .into_response()
}

#[derive(Deserialize)]
pub struct LoginCredentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn do_login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: PrivateCookieJar,
    mut conn: Conn,
    Form(form): Form<LoginCredentials>,
) -> Result<Response, FailureResponse> {
    let admin = admins::table
        .filter(admins::username.eq(form.username.trim()))
        .first::<Admin>(&mut *conn)
        .optional()?;
    drop(conn);

    let hash = match &admin {
        Some(admin) => admin.password_hash.clone(),
        None => DUMMY_HASH.clone(),
    };
    let password = form.password;
    let password_ok =
        spawn_blocking(move || verify_password(&password, &hash)).await?;

    let admin = match admin {
        Some(admin) if password_ok => admin,
        _ => {
            tracing::info!(username = %form.username.trim(), "failed admin login");
            return Err(FailureResponse::BadRequest(
                Page::new()
                    .body(LoginForm {
                        next: query.next.as_deref(),
                        error: Some(INVALID_CREDENTIALS),
                    })
                    .render(),
            ));
        }
    };

    tracing::info!(admin_id = admin.id, "admin logged in");

    let secure = state.config.environment == Environment::Production;
    let jar = set_login_cookie(admin.id, secure, jar);

    Ok((jar, Redirect::to(&redirect_target(query.next.as_deref())))
        .into_response())
}

pub async fn do_logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (clear_login_cookie(jar), Redirect::to("/"))
}

/// Only paths below `/admin` on this site are followed after logging in;
/// anything else goes to the dashboard.
fn redirect_target(next: Option<&str>) -> String {
    const FALLBACK: &str = "/admin/dashboard";

    let base = match Url::parse("http://localhost/") {
        Ok(base) => base,
        Err(_) => return FALLBACK.to_string(),
    };

    next.and_then(|next| base.join(next).ok())
        .filter(|url| {
            url.origin() == base.origin() && url.path().starts_with("/admin")
        })
        .map(|url| match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
        .unwrap_or_else(|| FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::redirect_target;

    #[test]
    fn only_local_admin_paths_are_followed() {
        assert_eq!(redirect_target(None), "/admin/dashboard");
        assert_eq!(redirect_target(Some("/admin/teams")), "/admin/teams");
        assert_eq!(
            redirect_target(Some("/admin/teams?tournament=2")),
            "/admin/teams?tournament=2"
        );
        assert_eq!(redirect_target(Some("/table")), "/admin/dashboard");
        assert_eq!(
            redirect_target(Some("//evil.example.com/admin")),
            "/admin/dashboard"
        );
        assert_eq!(
            redirect_target(Some("https://evil.example.com/admin")),
            "/admin/dashboard"
        );
    }
}

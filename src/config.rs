use std::{
    any::Any,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::map_response_with_state,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    auth::login::{do_login, do_logout, login_page},
    health::health,
    state::{AppState, DbPool},
    tournaments::{
        manage::{
            dashboard::dashboard_page,
            matches::{
                do_record_result, do_schedule_match, do_undo_result,
                manage_matches_page, match_page,
            },
            teams::{do_create_team, do_delete_team, manage_teams_page},
            tournaments::{
                do_create_tournament, do_delete_tournament, do_edit_rules,
                do_toggle_visibility, edit_rules_page,
                manage_tournaments_page,
            },
        },
        public::{
            fixtures_page, home, results_page, rules_page, team_profile_page,
            tournament_teams_page,
        },
        standings::public::standings_page,
    },
    util_resp::{ErrorDetail, FailureResponse, expose_error_detail, not_found},
};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "DATABASE_URL must point at a SQLite database (a file path, \
         `sqlite://<path>`, `file:<path>` or `:memory:`), but it uses the \
         `{0}` scheme"
    )]
    UnsupportedDatabase(String),
    #[error("DATABASE_URL is empty")]
    EmptyDatabaseUrl,
    #[error(
        "SESSION_SECRET must be at least 64 bytes long (it is {0} bytes); \
         generate one with `openssl rand -base64 64`"
    )]
    SessionSecretTooShort(usize),
    #[error("APP_ENV must be `production` or `development`, not `{0}`")]
    UnknownEnvironment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub fn exposes_errors(self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Normalised with [`normalize_database_url`].
    pub database_url: Option<String>,
    pub session_secret: Option<String>,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub environment: Environment,
    pub bind_address: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let var = |name: &str| {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        };

        let database_url = match var("DATABASE_URL") {
            Some(url) => Some(normalize_database_url(&url)?),
            None => None,
        };

        let session_secret = var("SESSION_SECRET");
        if let Some(secret) = &session_secret
            && secret.len() < 64
        {
            return Err(ConfigError::SessionSecretTooShort(secret.len()));
        }

        let environment = match var("APP_ENV") {
            Some(env) => env.parse()?,
            None => Environment::Production,
        };

        Ok(Config {
            database_url,
            session_secret,
            admin_username: var("ADMIN_USER")
                .unwrap_or_else(|| "admin".to_string()),
            admin_password: var("ADMIN_PASS"),
            environment,
            bind_address: var("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        })
    }

    /// The key used to encrypt session cookies.
    pub fn session_key(&self) -> Result<Key, ConfigError> {
        match &self.session_secret {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
                ConfigError::SessionSecretTooShort(secret.len())
            }),
            None => {
                tracing::warn!(
                    "SESSION_SECRET is not set, so a random key will be \
                     used. Admins will be logged out whenever the server \
                     restarts."
                );
                Ok(Key::generate())
            }
        }
    }
}

/// Turns the accepted spellings of a SQLite location into the form
/// understood by diesel's `SqliteConnection`, and rejects URLs which name
/// another database system.
pub fn normalize_database_url(url: &str) -> Result<String, ConfigError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ConfigError::EmptyDatabaseUrl);
    }

    if url == ":memory:" || url.starts_with("file:") {
        return Ok(url.to_string());
    }

    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    {
        if path.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        return Ok(path.to_string());
    }

    if let Some((scheme, _)) = url.split_once("://") {
        return Err(ConfigError::UnsupportedDatabase(scheme.to_string()));
    }

    Ok(url.to_string())
}

pub fn app_state(
    pool: Option<DbPool>,
    key: Key,
    config: Config,
) -> AppState {
    AppState {
        pool,
        key,
        config: Arc::new(config),
        prepared: Arc::new(Mutex::new(false)),
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    let mut res = FailureResponse::server_error(detail).into_response();
    // the panic layer sits outside `expose_error_detail`
    res.extensions_mut().remove::<ErrorDetail>();
    res
}

pub fn create_app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/login", get(login_page).post(do_login))
        .route("/logout", post(do_logout))
        .route("/dashboard", get(dashboard_page))
        .route(
            "/tournaments",
            get(manage_tournaments_page).post(do_create_tournament),
        )
        .route("/tournaments/:id/toggle", post(do_toggle_visibility))
        .route("/tournaments/:id/delete", post(do_delete_tournament))
        .route(
            "/tournaments/:id/rules",
            get(edit_rules_page).post(do_edit_rules),
        )
        .route("/teams", get(manage_teams_page).post(do_create_team))
        .route("/teams/:id/delete", post(do_delete_team))
        .route("/matches", get(manage_matches_page).post(do_schedule_match))
        .route("/matches/:id", get(match_page))
        .route("/matches/:id/result", post(do_record_result))
        .route("/matches/:id/undo", post(do_undo_result));

    Router::new()
        .route("/", get(home))
        .route("/inicio", get(home))
        .route("/table", get(standings_page))
        .route("/results", get(results_page))
        .route("/fixtures", get(fixtures_page))
        .route("/rules", get(rules_page))
        .route("/team/:id", get(team_profile_page))
        .route("/tournament-teams", get(tournament_teams_page))
        .route("/health", get(health))
        .nest("/admin", admin)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(
                    |req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            id = %Uuid::now_v7(),
                        )
                    },
                ))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(map_response_with_state(
                    state.clone(),
                    expose_error_detail,
                )),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_locations_are_normalised() {
        assert_eq!(normalize_database_url(":memory:").unwrap(), ":memory:");
        assert_eq!(
            normalize_database_url("sqlite://data/matchday.db").unwrap(),
            "data/matchday.db"
        );
        assert_eq!(
            normalize_database_url("sqlite:matchday.db").unwrap(),
            "matchday.db"
        );
        assert_eq!(
            normalize_database_url("  /var/lib/matchday.db ").unwrap(),
            "/var/lib/matchday.db"
        );
        assert_eq!(
            normalize_database_url("file:matchday.db?mode=rwc").unwrap(),
            "file:matchday.db?mode=rwc"
        );
    }

    #[test]
    fn other_database_systems_are_rejected() {
        assert!(matches!(
            normalize_database_url("postgresql://user:pw@db.example.com/app"),
            Err(ConfigError::UnsupportedDatabase(scheme)) if scheme == "postgresql"
        ));
        assert!(matches!(
            normalize_database_url("mysql://localhost/app"),
            Err(ConfigError::UnsupportedDatabase(_))
        ));
        assert!(matches!(
            normalize_database_url("   "),
            Err(ConfigError::EmptyDatabaseUrl)
        ));
        assert!(matches!(
            normalize_database_url("sqlite://"),
            Err(ConfigError::EmptyDatabaseUrl)
        ));
    }

    #[test]
    fn environment_parses() {
        assert_eq!(
            "Development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
        assert!(Environment::Development.exposes_errors());
        assert!(!Environment::Production.exposes_errors());
    }

    #[test]
    fn short_session_secrets_are_rejected() {
        let config = Config {
            database_url: None,
            session_secret: Some("too short".to_string()),
            admin_username: "admin".to_string(),
            admin_password: None,
            environment: Environment::Production,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        };
        assert!(matches!(
            config.session_key(),
            Err(ConfigError::SessionSecretTooShort(9))
        ));

        let config = Config {
            session_secret: Some("k".repeat(64)),
            ..config
        };
        assert!(config.session_key().is_ok());
    }

    #[test]
    fn panics_answer_a_generic_server_error() {
        let res = panic_response(Box::new("index out of bounds"));
        assert_eq!(res.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.extensions().get::<ErrorDetail>().is_none());
    }
}

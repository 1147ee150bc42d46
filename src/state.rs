use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection},
};
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{
    MIGRATIONS,
    auth::bootstrap::{BootstrapError, bootstrap_admin},
    config::Config,
    util_resp::{DATABASE_NOT_CONFIGURED, FailureResponse},
};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no database has been configured, in which case every
    /// page that needs the database answers with a 503.
    pub pool: Option<DbPool>,
    pub key: Key,
    pub config: Arc<Config>,
    /// Set once migrations have run and the bootstrap admin exists.
    pub prepared: Arc<Mutex<bool>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("could not run migrations: {0}")]
    Migrations(String),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

impl AppState {
    pub fn pool(&self) -> Result<DbPool, FailureResponse> {
        self.pool
            .clone()
            .ok_or(FailureResponse::ServiceUnavailable(DATABASE_NOT_CONFIGURED))
    }

    /// Runs pending migrations and creates the bootstrap admin. Blocking.
    ///
    /// Attempted at startup and then on every checkout until it has
    /// succeeded once, so a database that was unreachable at startup is
    /// set up as soon as it comes back.
    pub fn ensure_prepared(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), PrepareError> {
        let mut prepared =
            self.prepared.lock().unwrap_or_else(PoisonError::into_inner);
        if *prepared {
            return Ok(());
        }

        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| PrepareError::Migrations(e.to_string()))?;
        bootstrap_admin(
            &self.config.admin_username,
            self.config.admin_password.as_deref(),
            conn,
        )?;

        tracing::info!("database is ready");
        *prepared = true;
        Ok(())
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Applied to every connection the pool opens.
#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the pool without opening any connection. Connections are opened
/// on first use, and r2d2 replaces connections which fail its health check
/// on checkout, so a database restart only fails the requests that were in
/// flight.
pub fn build_pool(database_url: &str) -> DbPool {
    let in_memory = database_url == ":memory:";

    let builder = Pool::builder()
        .max_size(if in_memory { 1 } else { 10 })
        .connection_timeout(Duration::from_secs(10))
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: Duration::from_secs(5),
        }));

    // an in-memory database lives and dies with its connection
    let builder = if in_memory {
        builder.idle_timeout(None).max_lifetime(None)
    } else {
        builder
            .idle_timeout(Some(Duration::from_secs(10 * 60)))
            .max_lifetime(Some(Duration::from_secs(30 * 60)))
    };

    builder.build_unchecked(ConnectionManager::new(database_url))
}

/// The database connection of the current request.
///
/// The connection is checked out of the pool the first time an extractor
/// asks for it and cached in the request extensions, so that the
/// [`crate::auth::Admin`] extractor and the handler share one connection.
/// It goes back to the pool when the request is dropped.
#[derive(Clone)]
pub struct ThreadSafeConn {
    pub inner: Arc<tokio::sync::Mutex<PooledConn>>,
}

#[async_trait]
impl FromRequestParts<AppState> for ThreadSafeConn {
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(conn) = parts.extensions.get::<ThreadSafeConn>() {
            return Ok(conn.clone());
        }

        let pool = state.pool()?;
        let setup = state.clone();
        let conn = spawn_blocking(move || -> Result<_, FailureResponse> {
            let mut conn = pool.get()?;
            setup
                .ensure_prepared(&mut conn)
                .map_err(FailureResponse::server_error)?;
            Ok(conn)
        })
        .await??;

        let conn = ThreadSafeConn {
            inner: Arc::new(tokio::sync::Mutex::new(conn)),
        };
        parts.extensions.insert(conn.clone());

        Ok(conn)
    }
}

/// Exclusive access to the request's connection. Must come after any
/// [`crate::auth::Admin`] argument in a handler's argument list.
pub struct Conn {
    inner: tokio::sync::OwnedMutexGuard<PooledConn>,
}

impl Deref for Conn {
    type Target = PooledConn;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl DerefMut for Conn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Conn {
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let conn = ThreadSafeConn::from_request_parts(parts, state).await?;

        let inner = conn.inner.try_lock_owned().map_err(|_| {
            FailureResponse::server_error(
                "the request's database connection is already in use",
            )
        })?;

        Ok(Conn { inner })
    }
}

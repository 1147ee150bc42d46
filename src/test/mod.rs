//! HTTP-level tests. These drive the real router (with every middleware
//! layer) against an in-memory database.

use axum::http::StatusCode;
use axum_extra::extract::cookie::Key;
use axum_test::{TestResponse, TestServer, TestServerConfig};
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;

use crate::{
    MIGRATIONS,
    auth::bootstrap::ensure_admin,
    config::{Config, DEFAULT_BIND_ADDRESS, Environment, app_state, create_app},
    schema::{matches, teams, tournaments},
    state::{DbPool, build_pool},
};

mod admin;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

// A macro (rather than a function) so that the panic points at the caller.
macro_rules! assert_see_other {
    ($response:expr, $location:expr) => {{
        let response = &$response;
        assert_eq!(
            response.status_code(),
            axum::http::StatusCode::SEE_OTHER,
            "body = {}",
            response.text()
        );
        assert_eq!(response.header("location"), $location);
    }};
}
pub(crate) use assert_see_other;

fn test_config(database_url: Option<&str>) -> Config {
    Config {
        database_url: database_url.map(str::to_string),
        session_secret: None,
        admin_username: ADMIN_USERNAME.to_string(),
        admin_password: None,
        environment: Environment::Development,
        bind_address: DEFAULT_BIND_ADDRESS.to_string(),
    }
}

fn server(app: axum::Router) -> TestServer {
    TestServer::new_with_config(
        app,
        TestServerConfig {
            save_cookies: true,
            ..Default::default()
        },
    )
    .unwrap()
}

pub struct TestApp {
    pub server: TestServer,
    pub pool: DbPool,
}

impl TestApp {
    /// A fresh database with migrations applied and one admin account.
    pub async fn new() -> Self {
        let pool = build_pool(":memory:");
        {
            let mut conn = pool.get().unwrap();
            conn.run_pending_migrations(MIGRATIONS).unwrap();
            ensure_admin(ADMIN_USERNAME, ADMIN_PASSWORD, &mut conn).unwrap();
        }

        let app = create_app(app_state(
            Some(pool.clone()),
            Key::generate(),
            test_config(Some(":memory:")),
        ));

        TestApp {
            server: server(app),
            pool,
        }
    }

    /// A database nobody has migrated yet, as when it was unreachable at
    /// startup. The app has to run the migrations and create the admin
    /// itself.
    pub async fn unprepared() -> Self {
        let pool = build_pool(":memory:");
        let config = Config {
            admin_password: Some(ADMIN_PASSWORD.to_string()),
            ..test_config(Some(":memory:"))
        };
        let app = create_app(app_state(Some(pool.clone()), Key::generate(), config));

        TestApp {
            server: server(app),
            pool,
        }
    }

        /// An app started without `DATABASE_URL`.
    pub fn without_database() -> TestServer {
        server(create_app(app_state(None, Key::generate(), test_config(None))))
    }

    pub async fn login(&self) {
        let res = self
            .server
            .post("/admin/login")
            .form(&[("username", ADMIN_USERNAME), ("password", ADMIN_PASSWORD)])
            .await;
        assert_see_other!(res, "/admin/dashboard");
    }

    pub async fn create_tournament(&self, name: &str) -> i32 {
        let res = self
            .server
            .post("/admin/tournaments")
            .form(&[("name", name)])
            .await;
        assert_see_other!(res, "/admin/tournaments");

        let mut conn = self.pool.get().unwrap();
        tournaments::table
            .filter(tournaments::name.eq(name))
            .select(tournaments::id)
            .first(&mut conn)
            .unwrap()
    }

    pub async fn toggle_visibility(&self, tournament_id: i32) {
        let res = self
            .server
            .post(&format!("/admin/tournaments/{tournament_id}/toggle"))
            .await;
        assert_see_other!(res, "/admin/tournaments");
    }

    pub async fn try_create_team(
        &self,
        tournament_id: i32,
        name: &str,
    ) -> TestResponse {
        self.server
            .post("/admin/teams")
            .form(&[
                ("tournament_id", tournament_id.to_string().as_str()),
                ("name", name),
                ("owner_name", ""),
                ("age", ""),
                ("location", "Rosario"),
                ("contact", ""),
            ])
            .await
    }

    pub async fn create_team(&self, tournament_id: i32, name: &str) -> i32 {
        let res = self.try_create_team(tournament_id, name).await;
        assert_see_other!(
            res,
            format!("/admin/teams?tournament={tournament_id}").as_str()
        );

        let mut conn = self.pool.get().unwrap();
        teams::table
            .filter(teams::tournament_id.eq(tournament_id))
            .filter(teams::name.eq(name))
            .select(teams::id)
            .first(&mut conn)
            .unwrap()
    }

    pub async fn try_schedule(
        &self,
        tournament_id: i32,
        home: i32,
        away: i32,
        date: &str,
    ) -> TestResponse {
        self.server
            .post("/admin/matches")
            .form(&[
                ("tournament_id", tournament_id.to_string()),
                ("home_team_id", home.to_string()),
                ("away_team_id", away.to_string()),
                ("match_date", date.to_string()),
            ])
            .await
    }

    /// Schedules a match and returns its id.
    pub async fn schedule(
        &self,
        tournament_id: i32,
        home: i32,
        away: i32,
        date: &str,
    ) -> i32 {
        let res = self.try_schedule(tournament_id, home, away, date).await;
        assert_see_other!(
            res,
            format!("/admin/matches?tournament={tournament_id}").as_str()
        );

        let mut conn = self.pool.get().unwrap();
        matches::table
            .filter(matches::home_team_id.eq(home))
            .filter(matches::away_team_id.eq(away))
            .select(matches::id)
            .order_by(matches::id.desc())
            .first(&mut conn)
            .unwrap()
    }

    pub async fn record_result(&self, match_id: i32, home: &str, away: &str) -> TestResponse {
        self.server
            .post(&format!("/admin/matches/{match_id}/result"))
            .form(&[("home_goals", home), ("away_goals", away)])
            .await
    }

    pub fn count_teams(&self) -> i64 {
        let mut conn = self.pool.get().unwrap();
        teams::table.count().get_result(&mut conn).unwrap()
    }

    pub fn count_matches(&self) -> i64 {
        let mut conn = self.pool.get().unwrap();
        matches::table.count().get_result(&mut conn).unwrap()
    }
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = TestApp::new().await;

    let res = app.server.get("/no/such/page").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(res.text().contains("Not found"));
}

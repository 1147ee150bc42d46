use axum::http::StatusCode;
use diesel::prelude::*;

use super::{ADMIN_PASSWORD, TestApp, assert_see_other};
use crate::{
    schema::{matches, teams, tournaments},
    tournaments::standings::TournamentStandings,
};

#[tokio::test]
async fn admin_pages_redirect_to_login() {
    let app = TestApp::new().await;

    let res = app.server.get("/admin/dashboard").await;
    assert_see_other!(res, "/admin/login?next=%2Fadmin%2Fdashboard");

    let res = app.server.get("/admin/teams?tournament=1").await;
    assert_see_other!(res, "/admin/login?next=%2Fadmin%2Fteams%3Ftournament%3D1");

    // writes are refused too, and nothing is written
    let res = app
        .server
        .post("/admin/tournaments")
        .form(&[("name", "Liga A")])
        .await;
    assert_eq!(res.status_code(), StatusCode::SEE_OTHER);
    let mut conn = app.pool.get().unwrap();
    let count: i64 = tournaments::table.count().get_result(&mut conn).unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn failed_logins_share_one_message() {
    let app = TestApp::new().await;

    for (username, password) in [("admin", "wrong password"), ("nobody", ADMIN_PASSWORD)] {
        let res = app
            .server
            .post("/admin/login")
            .form(&[("username", username), ("password", password)])
            .await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(res.text().contains("Invalid username or password."));
    }

    let res = app.server.get("/admin/dashboard").await;
    assert_eq!(res.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_returns_to_the_requested_page() {
    let app = TestApp::new().await;

    let res = app
        .server
        .post("/admin/login?next=%2Fadmin%2Fmatches")
        .form(&[("username", "admin"), ("password", ADMIN_PASSWORD)])
        .await;
    assert_see_other!(res, "/admin/matches");

    let res = app.server.get("/admin/dashboard").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(res.text().contains("There are no tournaments yet."));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    app.login().await;

    let res = app.server.post("/admin/logout").await;
    assert_see_other!(res, "/");

    let res = app.server.get("/admin/dashboard").await;
    assert_eq!(res.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn tournament_names_are_unique() {
    let app = TestApp::new().await;
    app.login().await;
    app.create_tournament("Liga A").await;

    let res = app
        .server
        .post("/admin/tournaments")
        .form(&[("name", "  Liga A ")])
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("already exists."));

    let res = app
        .server
        .post("/admin/tournaments")
        .form(&[("name", "   ")])
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Tournament name is required."));

    let mut conn = app.pool.get().unwrap();
    let count: i64 = tournaments::table.count().get_result(&mut conn).unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn new_tournaments_are_hidden_until_published() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;

    let visible = |app: &TestApp| {
        let mut conn = app.pool.get().unwrap();
        tournaments::table
            .find(tid)
            .select(tournaments::visible)
            .first::<bool>(&mut conn)
            .unwrap()
    };

    assert!(!visible(&app));
    app.toggle_visibility(tid).await;
    assert!(visible(&app));
    app.toggle_visibility(tid).await;
    assert!(!visible(&app));

    let res = app.server.post("/admin/tournaments/999/toggle").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn team_names_are_unique_within_a_tournament() {
    let app = TestApp::new().await;
    app.login().await;
    let first = app.create_tournament("Liga A").await;
    let second = app.create_tournament("Liga B").await;

    app.create_team(first, "Lions").await;

    let res = app.try_create_team(first, "Lions").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("already exists in this tournament."));
    assert_eq!(app.count_teams(), 1);

    // the same name is fine elsewhere
    app.create_team(second, "Lions").await;
    assert_eq!(app.count_teams(), 2);
}

#[tokio::test]
async fn invalid_teams_are_rejected() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;

    let res = app.try_create_team(tid, "").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Team name is required."));

    let res = app.try_create_team(tid, &"x".repeat(101)).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = app
        .server
        .post("/admin/teams")
        .form(&[
            ("tournament_id", tid.to_string().as_str()),
            ("name", "Lions"),
            ("age", "-4"),
        ])
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Age must be a whole number"));

    let res = app.try_create_team(999, "Lions").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    assert_eq!(app.count_teams(), 0);
}

#[tokio::test]
async fn a_team_cannot_play_itself() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let lions = app.create_team(tid, "Lions").await;
    app.create_team(tid, "Tigers").await;

    let res = app.try_schedule(tid, lions, lions, "2024-06-01").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("The home and away teams must be different."));
    assert_eq!(app.count_matches(), 0);
}

#[tokio::test]
async fn matches_stay_within_their_tournament() {
    let app = TestApp::new().await;
    app.login().await;
    let first = app.create_tournament("Liga A").await;
    let second = app.create_tournament("Liga B").await;
    let lions = app.create_team(first, "Lions").await;
    let tigers = app.create_team(second, "Tigers").await;

    let res = app.try_schedule(first, lions, tigers, "2024-06-01").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Both teams must belong to the selected tournament."));

    let bears = app.create_team(first, "Bears").await;
    let res = app.try_schedule(first, lions, bears, "01/06/2024").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("YYYY-MM-DD"));

    assert_eq!(app.count_matches(), 0);
}

#[tokio::test]
async fn recorded_results_feed_the_table() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    let match_id = app.schedule(tid, x, y, "2024-06-01").await;

    let res = app.server.get(&format!("/admin/matches/{match_id}")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(res.text().contains("Save result"));
    assert!(!res.text().contains("Undo result"));

    let res = app.record_result(match_id, "2", "1").await;
    assert_see_other!(res, format!("/admin/matches?tournament={tid}").as_str());

    let standings = {
        let mut conn = app.pool.get().unwrap();
        TournamentStandings::fetch(tid, &mut conn).unwrap()
    };
    let row = |name: &str| {
        standings
            .rows
            .iter()
            .find(|r| r.team.name == name)
            .unwrap()
            .clone()
    };
    let (x_row, y_row) = (row("X"), row("Y"));
    assert_eq!((x_row.played, x_row.wins, x_row.points), (1, 1, 3));
    assert_eq!(x_row.goal_difference(), 1);
    assert_eq!((y_row.played, y_row.losses, y_row.points), (1, 1, 0));
    assert_eq!(y_row.goal_difference(), -1);
    assert_eq!(standings.rows[0].team.id, x);
}

#[tokio::test]
async fn results_can_be_undone() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    let match_id = app.schedule(tid, x, y, "2024-06-01").await;
    app.record_result(match_id, "0", "3").await;

    let res = app
        .server
        .post(&format!("/admin/matches/{match_id}/undo"))
        .await;
    assert_see_other!(res, format!("/admin/matches?tournament={tid}").as_str());

    let mut conn = app.pool.get().unwrap();
    let (status, home, away) = matches::table
        .find(match_id)
        .select((matches::status, matches::home_goals, matches::away_goals))
        .first::<(String, Option<i32>, Option<i32>)>(&mut conn)
        .unwrap();
    assert_eq!((status.as_str(), home, away), ("scheduled", None, None));
}

#[tokio::test]
async fn invalid_scores_are_rejected() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    let match_id = app.schedule(tid, x, y, "2024-06-01").await;

    for (home, away) in [("-1", "0"), ("", "2"), ("two", "1"), ("1000", "0")] {
        let res = app.record_result(match_id, home, away).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST, "{home} - {away}");
    }

    let mut conn = app.pool.get().unwrap();
    let status = matches::table
        .find(match_id)
        .select(matches::status)
        .first::<String>(&mut conn)
        .unwrap();
    assert_eq!(status, "scheduled");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = TestApp::new().await;
    app.login().await;

    for res in [
        app.server.get("/admin/matches/999").await,
        app.server.post("/admin/matches/999/undo").await,
        app.record_result(999, "1", "0").await,
        app.server.post("/admin/teams/999/delete").await,
        app.server.post("/admin/tournaments/999/delete").await,
        app.server.get("/admin/tournaments/999/rules").await,
        app.server.get("/admin/matches/abc").await,
        app.server.get("/admin/matches/99999999999").await,
        app.server.post("/admin/teams/x/delete").await,
    ] {
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.text().contains("Not found"));
    }
}

#[tokio::test]
async fn unreadable_forms_get_an_error_page() {
    let app = TestApp::new().await;
    app.login().await;
    let before = app.count_teams();

    let res = app.server.post("/admin/teams").text("name=Lions").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(res.text().contains("The request could not be understood."));
    assert_eq!(app.count_teams(), before);
}

#[tokio::test]
async fn admin_match_list_shows_the_latest_matches_first() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    app.schedule(tid, x, y, "2024-06-01").await;
    app.schedule(tid, y, x, "2024-06-15").await;

    let text = app
        .server
        .get(&format!("/admin/matches?tournament={tid}"))
        .await
        .text();
    let (newer, older) = (
        text.find("2024-06-15").unwrap(),
        text.find("2024-06-01").unwrap(),
    );
    assert!(newer < older);
}

#[tokio::test]
async fn an_unprepared_database_is_set_up_on_first_use() {
    let app = TestApp::unprepared().await;

    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    app.create_team(tid, "Lions").await;
    assert_eq!(app.count_teams(), 1);
}

#[tokio::test]
async fn deleting_a_tournament_removes_its_teams_and_matches() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let other = app.create_tournament("Liga B").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    app.create_team(other, "Z").await;
    app.schedule(tid, x, y, "2024-06-01").await;

    let res = app
        .server
        .post(&format!("/admin/tournaments/{tid}/delete"))
        .await;
    assert_see_other!(res, "/admin/tournaments");

    assert_eq!(app.count_teams(), 1);
    assert_eq!(app.count_matches(), 0);
}

#[tokio::test]
async fn deleting_a_team_removes_its_matches() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    app.schedule(tid, x, y, "2024-06-01").await;

    let res = app.server.post(&format!("/admin/teams/{x}/delete")).await;
    assert_see_other!(res, format!("/admin/teams?tournament={tid}").as_str());

    let mut conn = app.pool.get().unwrap();
    let remaining = teams::table
        .select(teams::id)
        .load::<i32>(&mut conn)
        .unwrap();
    assert_eq!(remaining, [y]);
    drop(conn);
    assert_eq!(app.count_matches(), 0);
}

#[tokio::test]
async fn empty_rules_are_cleared() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;

    let rules = |app: &TestApp| {
        let mut conn = app.pool.get().unwrap();
        tournaments::table
            .find(tid)
            .select(tournaments::rules)
            .first::<Option<String>>(&mut conn)
            .unwrap()
    };

    let res = app
        .server
        .post(&format!("/admin/tournaments/{tid}/rules"))
        .form(&[("rules", "Matches last 90 minutes.")])
        .await;
    assert_see_other!(res, format!("/admin/tournaments/{tid}/rules").as_str());
    assert_eq!(rules(&app).as_deref(), Some("Matches last 90 minutes."));

    app.server
        .post(&format!("/admin/tournaments/{tid}/rules"))
        .form(&[("rules", "  \n ")])
        .await;
    assert_eq!(rules(&app), None);
}

#[tokio::test]
async fn dashboard_counts_matches() {
    let app = TestApp::new().await;
    app.login().await;
    let tid = app.create_tournament("Liga A").await;
    let x = app.create_team(tid, "X").await;
    let y = app.create_team(tid, "Y").await;
    let z = app.create_team(tid, "Z").await;
    let played = app.schedule(tid, x, y, "2024-06-01").await;
    app.schedule(tid, y, z, "2024-06-08").await;
    app.record_result(played, "1", "1").await;

    let res = app
        .server
        .get(&format!("/admin/dashboard?tournament={tid}"))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let text = res.text();
    assert!(text.contains("Liga A"));
    for label in ["Teams", "Matches", "Played", "Scheduled"] {
        assert!(text.contains(label), "missing {label}");
    }
}

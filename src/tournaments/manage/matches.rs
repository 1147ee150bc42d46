use axum::response::Redirect;
use chrono::NaiveDate;
use diesel::{connection::LoadConnection, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    auth::Admin,
    extract::{Form, Path},
    state::Conn,
    template::Page,
    tournaments::{
        Tournament, TournamentQuery, WriteError,
        matches::{DateOrder, Match, MatchListing, MatchStatus},
        select_tournament_or_first,
        teams::Team,
    },
    util_resp::{
        FailureResponse, StandardResponse, bad_request, err_not_found,
        see_other_ok, success,
    },
    validation::{MAX_GOALS, goals, match_date, query_id, required_id},
    widgets::{
        actions::{Actions, PostButton},
        alert::MaybeError,
        tournament_selector::TournamentSelector,
    },
};

/// A `<select>` of the teams of a tournament.
struct TeamSelect<'r> {
    id: &'r str,
    label: &'r str,
    teams: &'r [Team],
}

impl Renderable for TeamSelect<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            label for=(self.id) class="form-label" { (self.label) }
            select class="form-select" id=(self.id) name=(self.id) required {
                option value="" { "Select a team" }
                @for team in self.teams {
                    option value=(team.id) { (team.name) }
                }
            }
        }
        .render_to(buffer);
    }
}

fn matches_page(
    admin: Admin,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    requested: Option<i32>,
    error: Option<&str>,
) -> Result<Rendered<String>, FailureResponse> {
    let tournaments = Tournament::all(conn)?;
    let selected = select_tournament_or_first(&tournaments, requested);
    let (teams, matches) = match selected {
        Some(tournament) => (
            Team::of_tournament(tournament.id, conn)?,
            MatchListing::load(
                &[tournament.id],
                None,
                DateOrder::NewestFirst,
                conn,
            )?,
        ),
        None => (Vec::new(), Vec::new()),
    };

    let tournaments: &[Tournament] = &tournaments;

    Ok(Page::new()
        .admin(admin)
        .active_nav("admin_matches")
        .body(maud! {
            div class="container py-4" {
                h1 { "Matches" }
                MaybeError error=(error);
                @if let Some(tournament) = selected {
                    TournamentSelector
                        action="/admin/matches"
                        tournaments=(tournaments)
                        selected=(Some(tournament.id))
                        include_all=(false);

                    h2 class="h4" { "Schedule a match in " (tournament.name) }
                    @if teams.len() < 2 {
                        p class="text-muted" {
                            "A tournament needs at least two teams before "
                            "matches can be scheduled. "
                            a href=(format!("/admin/teams?tournament={}", tournament.id)) {
                                "Add teams"
                            }
                        }
                    } @else {
                        form method="post" action="/admin/matches" class="row g-3 mb-4" {
                            input type="hidden" name="tournament_id" value=(tournament.id);
                            div class="col-md-4" {
                                TeamSelect id="home_team_id" label="Home" teams=(&teams);
                            }
                            div class="col-md-4" {
                                TeamSelect id="away_team_id" label="Away" teams=(&teams);
                            }
                            div class="col-md-4" {
                                label for="match_date" class="form-label" { "Date" }
                                input type="date" class="form-control" id="match_date" name="match_date" required;
                            }
                            div class="col-12" {
                                button type="submit" class="btn btn-primary" { "Schedule match" }
                            }
                        }
                    }

                    @if matches.is_empty() {
                        p class="text-muted" { "No matches in this tournament yet." }
                    } @else {
                        table class="table align-middle" {
                            thead {
                                tr {
                                    th scope="col" { "Date" }
                                    th scope="col" { "Home" }
                                    th scope="col" { "Away" }
                                    th scope="col" { "Result" }
                                    th scope="col" {}
                                }
                            }
                            tbody {
                                @for listing in &matches {
                                    tr {
                                        td { (listing.inner.match_date.format("%Y-%m-%d").to_string()) }
                                        td { (listing.home_name) }
                                        td { (listing.away_name) }
                                        td {
                                            @match listing.inner.score() {
                                                Some((home, away)) => { (home) " - " (away) }
                                                None => {
                                                    span class="badge text-bg-secondary" { "Scheduled" }
                                                }
                                            }
                                        }
                                        td class="text-end" {
                                            a class="btn btn-sm btn-outline-primary"
                                                href=(format!("/admin/matches/{}", listing.inner.id)) {
                                                @if listing.inner.status() == MatchStatus::Played {
                                                    "Edit result"
                                                } @else {
                                                    "Record result"
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                } @else {
                    p {
                        "Matches belong to a tournament. "
                        a href="/admin/tournaments" { "Create a tournament" }
                        " first."
                    }
                }
            }
        })
        .render())
}

pub async fn manage_matches_page(
    admin: Admin,
    mut conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    success(matches_page(admin, &mut *conn, query.id(), None)?)
}

#[derive(Deserialize)]
pub struct ScheduleMatchForm {
    #[serde(default)]
    tournament_id: String,
    #[serde(default)]
    home_team_id: String,
    #[serde(default)]
    away_team_id: String,
    #[serde(default)]
    match_date: String,
}

impl ScheduleMatchForm {
    fn validate(&self) -> Result<(i32, i32, i32, NaiveDate), String> {
        Ok((
            required_id(&self.tournament_id, "tournament")?,
            required_id(&self.home_team_id, "home team")?,
            required_id(&self.away_team_id, "away team")?,
            match_date(&self.match_date)?,
        ))
    }
}

pub async fn do_schedule_match(
    admin: Admin,
    mut conn: Conn,
    Form(form): Form<ScheduleMatchForm>,
) -> StandardResponse {
    let requested = query_id(Some(&form.tournament_id));

    let scheduled = form.validate().map_err(WriteError::Rejected).and_then(
        |(tournament_id, home, away, date)| {
            Match::schedule(tournament_id, home, away, date, &mut *conn)
                .map(|_| tournament_id)
        },
    );

    match scheduled {
        Ok(tournament_id) => {
            tracing::info!(admin = %admin.username, tournament_id, "scheduled match");
            see_other_ok(Redirect::to(&format!(
                "/admin/matches?tournament={tournament_id}"
            )))
        }
        Err(WriteError::Rejected(msg)) => {
            bad_request(matches_page(admin, &mut *conn, requested, Some(&msg))?)
        }
        Err(WriteError::Db(e)) => Err(e.into()),
    }
}

fn match_result_page(
    admin: Admin,
    listing: &MatchListing,
    error: Option<&str>,
) -> Rendered<String> {
    let m = &listing.inner;
    let (home_goals, away_goals) = match m.score() {
        Some((home, away)) => (home.to_string(), away.to_string()),
        None => (String::new(), String::new()),
    };

    Page::new()
        .admin(admin)
        .active_nav("admin_matches")
        .body(maud! {
            div class="container py-4" {
                h1 { (listing.home_name) " vs " (listing.away_name) }
                p class="text-muted" {
                    (listing.tournament_name) ", "
                    (m.match_date.format("%Y-%m-%d").to_string())
                }
                MaybeError error=(error);
                form method="post" action=(format!("/admin/matches/{}/result", m.id)) class="row g-3 mb-3" {
                    div class="col-md-3" {
                        label for="home_goals" class="form-label" { (listing.home_name) " goals" }
                        input type="number" class="form-control" id="home_goals" name="home_goals"
                            min="0" max=(MAX_GOALS) value=(home_goals) required;
                    }
                    div class="col-md-3" {
                        label for="away_goals" class="form-label" { (listing.away_name) " goals" }
                        input type="number" class="form-control" id="away_goals" name="away_goals"
                            min="0" max=(MAX_GOALS) value=(away_goals) required;
                    }
                    div class="col-12" {
                        button type="submit" class="btn btn-primary" { "Save result" }
                    }
                }
                @if m.status() == MatchStatus::Played {
                    PostButton
                        action=(format!("/admin/matches/{}/undo", m.id))
                        text="Undo result"
                        class="btn-outline-danger";
                }
                Actions options=(&[
                    (format!("/admin/matches?tournament={}", m.tournament_id).as_str(), "Back to matches")
                ]);
            }
        })
        .render()
}

pub async fn match_page(
    admin: Admin,
    mut conn: Conn,
    Path(match_id): Path<i32>,
) -> StandardResponse {
    let listing = MatchListing::fetch(match_id, &mut *conn)?;

    success(match_result_page(admin, &listing, None))
}

#[derive(Deserialize)]
pub struct ResultForm {
    #[serde(default)]
    home_goals: String,
    #[serde(default)]
    away_goals: String,
}

pub async fn do_record_result(
    admin: Admin,
    mut conn: Conn,
    Path(match_id): Path<i32>,
    Form(form): Form<ResultForm>,
) -> StandardResponse {
    let listing = MatchListing::fetch(match_id, &mut *conn)?;

    let score = goals(&form.home_goals, "Home")
        .and_then(|home| goals(&form.away_goals, "Away").map(|away| (home, away)));
    let (home_goals, away_goals) = match score {
        Ok(score) => score,
        Err(msg) => {
            return bad_request(match_result_page(admin, &listing, Some(&msg)));
        }
    };

    if !Match::record_result(match_id, home_goals, away_goals, &mut *conn)? {
        return err_not_found();
    }

    tracing::info!(
        admin = %admin.username,
        match_id,
        home_goals,
        away_goals,
        "recorded match result"
    );
    see_other_ok(Redirect::to(&format!(
        "/admin/matches?tournament={}",
        listing.inner.tournament_id
    )))
}

pub async fn do_undo_result(
    admin: Admin,
    mut conn: Conn,
    Path(match_id): Path<i32>,
) -> StandardResponse {
    let found = Match::fetch(match_id, &mut *conn)?;

    if !Match::undo_result(match_id, &mut *conn)? {
        return err_not_found();
    }

    tracing::info!(admin = %admin.username, match_id, "undid match result");
    see_other_ok(Redirect::to(&format!(
        "/admin/matches?tournament={}",
        found.tournament_id
    )))
}

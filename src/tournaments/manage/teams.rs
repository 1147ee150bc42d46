use axum::response::Redirect;
use diesel::{connection::LoadConnection, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    auth::Admin,
    extract::{Form, Path},
    state::Conn,
    template::Page,
    tournaments::{
        Tournament, TournamentQuery, WriteError, select_tournament_or_first,
        teams::{NewTeam, Team},
    },
    util_resp::{
        FailureResponse, StandardResponse, bad_request, err_not_found,
        see_other_ok, success,
    },
    validation::{
        CONTACT_MAX_LEN, NAME_MAX_LEN, optional_age, optional_text,
        required_id, required_text,
    },
    widgets::{
        actions::PostButton, alert::MaybeError,
        tournament_selector::TournamentSelector,
    },
};

fn teams_page(
    admin: Admin,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    requested: Option<i32>,
    error: Option<&str>,
) -> Result<Rendered<String>, FailureResponse> {
    let tournaments = Tournament::all(conn)?;
    let selected = select_tournament_or_first(&tournaments, requested);
    let teams = match selected {
        Some(tournament) => Team::of_tournament(tournament.id, conn)?,
        None => Vec::new(),
    };

    let tournaments: &[Tournament] = &tournaments;

    Ok(Page::new()
        .admin(admin)
        .active_nav("admin_teams")
        .body(maud! {
            div class="container py-4" {
                h1 { "Teams" }
                MaybeError error=(error);
                @if let Some(tournament) = selected {
                    TournamentSelector
                        action="/admin/teams"
                        tournaments=(tournaments)
                        selected=(Some(tournament.id))
                        include_all=(false);

                    h2 class="h4" { "Register a team in " (tournament.name) }
                    form method="post" action="/admin/teams" class="row g-3 mb-4" {
                        input type="hidden" name="tournament_id" value=(tournament.id);
                        div class="col-md-4" {
                            label for="name" class="form-label" { "Team name" }
                            input type="text" class="form-control" id="name" name="name"
                                maxlength=(NAME_MAX_LEN) required;
                        }
                        div class="col-md-4" {
                            label for="owner_name" class="form-label" { "Owner" }
                            input type="text" class="form-control" id="owner_name" name="owner_name"
                                maxlength=(NAME_MAX_LEN);
                        }
                        div class="col-md-4" {
                            label for="age" class="form-label" { "Age" }
                            input type="number" class="form-control" id="age" name="age" min="0" max="150";
                        }
                        div class="col-md-6" {
                            label for="location" class="form-label" { "Location" }
                            input type="text" class="form-control" id="location" name="location"
                                maxlength=(NAME_MAX_LEN);
                        }
                        div class="col-md-6" {
                            label for="contact" class="form-label" { "Contact" }
                            input type="text" class="form-control" id="contact" name="contact"
                                maxlength=(CONTACT_MAX_LEN);
                        }
                        div class="col-12" {
                            button type="submit" class="btn btn-primary" { "Add team" }
                        }
                    }

                    @if teams.is_empty() {
                        p class="text-muted" { "No teams in this tournament yet." }
                    } @else {
                        table class="table align-middle" {
                            thead {
                                tr {
                                    th scope="col" { "Name" }
                                    th scope="col" { "Owner" }
                                    th scope="col" { "Age" }
                                    th scope="col" { "Location" }
                                    th scope="col" { "Contact" }
                                    th scope="col" {}
                                }
                            }
                            tbody {
                                @for team in &teams {
                                    tr {
                                        td { (team.name) }
                                        td { (team.owner_name.as_deref().unwrap_or("")) }
                                        td { (team.age.map(|age| age.to_string()).unwrap_or_default()) }
                                        td { (team.location.as_deref().unwrap_or("")) }
                                        td { (team.contact.as_deref().unwrap_or("")) }
                                        td class="text-end" {
                                            PostButton
                                                action=(format!("/admin/teams/{}/delete", team.id))
                                                text="Delete"
                                                class="btn-outline-danger";
                                        }
                                    }
                                }
                            }
                        }
                    }
                } @else {
                    p {
                        "Teams belong to a tournament. "
                        a href="/admin/tournaments" { "Create a tournament" }
                        " first."
                    }
                }
            }
        })
        .render())
}

pub async fn manage_teams_page(
    admin: Admin,
    mut conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    success(teams_page(admin, &mut *conn, query.id(), None)?)
}

#[derive(Deserialize)]
pub struct CreateTeamForm {
    #[serde(default)]
    tournament_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner_name: String,
    #[serde(default)]
    age: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    contact: String,
}

impl CreateTeamForm {
    fn validate(&self) -> Result<NewTeam, String> {
        Ok(NewTeam {
            tournament_id: required_id(&self.tournament_id, "tournament")?,
            name: required_text(&self.name, "Team name", NAME_MAX_LEN)?,
            owner_name: optional_text(&self.owner_name, "Owner", NAME_MAX_LEN)?,
            age: optional_age(&self.age)?,
            location: optional_text(&self.location, "Location", NAME_MAX_LEN)?,
            contact: optional_text(&self.contact, "Contact", CONTACT_MAX_LEN)?,
        })
    }
}

pub async fn do_create_team(
    admin: Admin,
    mut conn: Conn,
    Form(form): Form<CreateTeamForm>,
) -> StandardResponse {
    let requested = crate::validation::query_id(Some(&form.tournament_id));

    let created = form
        .validate()
        .map_err(WriteError::Rejected)
        .and_then(|team| Team::create(&team, &mut *conn).map(|_| team));

    match created {
        Ok(team) => {
            tracing::info!(
                admin = %admin.username,
                tournament_id = team.tournament_id,
                name = %team.name,
                "created team"
            );
            see_other_ok(Redirect::to(&format!(
                "/admin/teams?tournament={}",
                team.tournament_id
            )))
        }
        Err(WriteError::Rejected(msg)) => {
            bad_request(teams_page(admin, &mut *conn, requested, Some(&msg))?)
        }
        Err(WriteError::Db(e)) => Err(e.into()),
    }
}

pub async fn do_delete_team(
    admin: Admin,
    mut conn: Conn,
    Path(team_id): Path<i32>,
) -> StandardResponse {
    match Team::delete(team_id, &mut *conn)? {
        Some(tournament_id) => {
            tracing::info!(admin = %admin.username, team_id, "deleted team");
            see_other_ok(Redirect::to(&format!(
                "/admin/teams?tournament={tournament_id}"
            )))
        }
        None => err_not_found(),
    }
}

use axum::response::Redirect;
use diesel::{connection::LoadConnection, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    auth::Admin,
    extract::{Form, Path},
    state::Conn,
    template::Page,
    tournaments::{Tournament, WriteError},
    util_resp::{
        FailureResponse, StandardResponse, bad_request, err_not_found,
        see_other_ok, success,
    },
    validation::{NAME_MAX_LEN, required_text},
    widgets::{
        actions::{Actions, PostButton},
        alert::MaybeError,
    },
};

fn tournaments_page(
    admin: Admin,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    error: Option<&str>,
) -> Result<Rendered<String>, FailureResponse> {
    let tournaments = Tournament::newest_first(conn)?;

    Ok(Page::new()
        .admin(admin)
        .active_nav("admin_tournaments")
        .body(maud! {
            div class="container py-4" {
                h1 { "Tournaments" }
                MaybeError error=(error);
                form method="post" action="/admin/tournaments" class="row g-2 mb-4" {
                    div class="col-auto" {
                        label for="name" class="visually-hidden" { "Name" }
                        input type="text" class="form-control" id="name" name="name"
                            placeholder="Tournament name" maxlength=(NAME_MAX_LEN) required;
                    }
                    div class="col-auto" {
                        button type="submit" class="btn btn-primary" { "Create tournament" }
                    }
                }
                @if tournaments.is_empty() {
                    p class="text-muted" { "No tournaments yet." }
                } @else {
                    table class="table align-middle" {
                        thead {
                            tr {
                                th scope="col" { "Name" }
                                th scope="col" { "Created" }
                                th scope="col" { "Public" }
                                th scope="col" {}
                            }
                        }
                        tbody {
                            @for tournament in &tournaments {
                                tr {
                                    td {
                                        a href=(format!("/admin/dashboard?tournament={}", tournament.id)) {
                                            (tournament.name)
                                        }
                                    }
                                    td { (tournament.created_at.format("%Y-%m-%d").to_string()) }
                                    td {
                                        @if tournament.visible {
                                            span class="badge text-bg-success" { "Visible" }
                                        } @else {
                                            span class="badge text-bg-secondary" { "Hidden" }
                                        }
                                    }
                                    td class="text-end" {
                                        a class="btn btn-sm btn-outline-primary me-1"
                                            href=(format!("/admin/tournaments/{}/rules", tournament.id)) {
                                            "Rules"
                                        }
                                        PostButton
                                            action=(format!("/admin/tournaments/{}/toggle", tournament.id))
                                            text=(if tournament.visible { "Hide" } else { "Publish" })
                                            class="btn-outline-secondary me-1";
                                        PostButton
                                            action=(format!("/admin/tournaments/{}/delete", tournament.id))
                                            text="Delete"
                                            class="btn-outline-danger";
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
        .render())
}

pub async fn manage_tournaments_page(
    admin: Admin,
    mut conn: Conn,
) -> StandardResponse {
    success(tournaments_page(admin, &mut *conn, None)?)
}

#[derive(Deserialize)]
pub struct CreateTournamentForm {
    #[serde(default)]
    name: String,
}

pub async fn do_create_tournament(
    admin: Admin,
    mut conn: Conn,
    Form(form): Form<CreateTournamentForm>,
) -> StandardResponse {
    let created = required_text(&form.name, "Tournament name", NAME_MAX_LEN)
        .map_err(WriteError::Rejected)
        .and_then(|name| Tournament::create(&name, &mut *conn).map(|_| name));

    match created {
        Ok(name) => {
            tracing::info!(admin = %admin.username, name = %name, "created tournament");
            see_other_ok(Redirect::to("/admin/tournaments"))
        }
        Err(WriteError::Rejected(msg)) => {
            bad_request(tournaments_page(admin, &mut *conn, Some(&msg))?)
        }
        Err(WriteError::Db(e)) => Err(e.into()),
    }
}

pub async fn do_toggle_visibility(
    admin: Admin,
    mut conn: Conn,
    Path(tournament_id): Path<i32>,
) -> StandardResponse {
    if !Tournament::toggle_visibility(tournament_id, &mut *conn)? {
        return err_not_found();
    }

    tracing::info!(admin = %admin.username, tournament_id, "toggled tournament visibility");
    see_other_ok(Redirect::to("/admin/tournaments"))
}

pub async fn do_delete_tournament(
    admin: Admin,
    mut conn: Conn,
    Path(tournament_id): Path<i32>,
) -> StandardResponse {
    if !Tournament::delete(tournament_id, &mut *conn)? {
        return err_not_found();
    }

    tracing::info!(admin = %admin.username, tournament_id, "deleted tournament");
    see_other_ok(Redirect::to("/admin/tournaments"))
}

pub async fn edit_rules_page(
    admin: Admin,
    mut conn: Conn,
    Path(tournament_id): Path<i32>,
) -> StandardResponse {
    let tournament = Tournament::fetch(tournament_id, &mut *conn)?;

    success(
        Page::new()
            .admin(admin)
            .active_nav("admin_tournaments")
            .body(maud! {
                div class="container py-4" {
                    h1 { "Rules of " (tournament.name) }
                    p class="text-muted" {
                        "Line breaks are kept. Basic HTML formatting is allowed; \
                         anything else is removed when the rules are shown."
                    }
                    form method="post" action=(format!("/admin/tournaments/{}/rules", tournament.id)) {
                        div class="mb-3" {
                            label for="rules" class="form-label" { "Rules" }
                            textarea class="form-control" id="rules" name="rules" rows="16" {
                                (tournament.rules.as_deref().unwrap_or(""))
                            }
                        }
                        button type="submit" class="btn btn-primary" { "Save rules" }
                    }
                    Actions options=(&[("/admin/tournaments", "Back to tournaments")]);
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct RulesForm {
    #[serde(default)]
    rules: String,
}

pub async fn do_edit_rules(
    admin: Admin,
    mut conn: Conn,
    Path(tournament_id): Path<i32>,
    Form(form): Form<RulesForm>,
) -> StandardResponse {
    let rules = match form.rules.trim() {
        "" => None,
        rules => Some(rules),
    };

    if !Tournament::set_rules(tournament_id, rules, &mut *conn)? {
        return err_not_found();
    }

    tracing::info!(admin = %admin.username, tournament_id, "updated tournament rules");
    see_other_ok(Redirect::to(&format!(
        "/admin/tournaments/{tournament_id}/rules"
    )))
}

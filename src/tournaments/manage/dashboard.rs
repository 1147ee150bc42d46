use hypertext::prelude::*;

use crate::{
    auth::Admin,
    state::Conn,
    tournaments::{
        Tournament, TournamentQuery,
        matches::{Match, MatchStatus},
        select_tournament_or_first,
        teams::Team,
    },
    template::Page,
    util_resp::{StandardResponse, success},
    widgets::{actions::Actions, tournament_selector::TournamentSelector},
};

struct Counts {
    teams: i64,
    matches: i64,
    played: i64,
    scheduled: i64,
}

pub async fn dashboard_page(
    admin: Admin,
    mut conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    let tournaments = Tournament::all(&mut *conn)?;
    let selected = select_tournament_or_first(&tournaments, query.id());

    let counts = match selected {
        Some(tournament) => Some(Counts {
            teams: Team::count_of_tournament(tournament.id, &mut *conn)?,
            matches: Match::count_of_tournament(tournament.id, None, &mut *conn)?,
            played: Match::count_of_tournament(
                tournament.id,
                Some(MatchStatus::Played),
                &mut *conn,
            )?,
            scheduled: Match::count_of_tournament(
                tournament.id,
                Some(MatchStatus::Scheduled),
                &mut *conn,
            )?,
        }),
        None => None,
    };

    let tournaments: &[Tournament] = &tournaments;

    success(
        Page::new()
            .admin(admin)
            .active_nav("dashboard")
            .body(maud! {
                div class="container py-4" {
                    h1 { "Dashboard" }
                    @match (selected, &counts) {
                        (Some(tournament), Some(counts)) => {
                            TournamentSelector
                                action="/admin/dashboard"
                                tournaments=(tournaments)
                                selected=(Some(tournament.id))
                                include_all=(false);
                            h2 class="h4" {
                                (tournament.name)
                                @if !tournament.visible {
                                    span class="badge text-bg-secondary ms-2" { "Hidden" }
                                }
                            }
                            div class="row row-cols-2 row-cols-md-4 g-3 my-2" {
                                @for (label, value) in [
                                    ("Teams", counts.teams),
                                    ("Matches", counts.matches),
                                    ("Played", counts.played),
                                    ("Scheduled", counts.scheduled),
                                ] {
                                    div class="col" {
                                        div class="card text-center" {
                                            div class="card-body" {
                                                div class="display-6" { (value) }
                                                div class="text-muted" { (label) }
                                            }
                                        }
                                    }
                                }
                            }
                            Actions options=(&[
                                (format!("/admin/teams?tournament={}", tournament.id).as_str(), "Manage teams"),
                                (format!("/admin/matches?tournament={}", tournament.id).as_str(), "Manage matches"),
                                (format!("/admin/tournaments/{}/rules", tournament.id).as_str(), "Edit rules"),
                            ]);
                        }
                        _ => {
                            p { "There are no tournaments yet." }
                            Actions options=(&[("/admin/tournaments", "Create a tournament")]);
                        }
                    }
                }
            })
            .render(),
    )
}

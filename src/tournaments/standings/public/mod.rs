use hypertext::prelude::*;

use crate::{
    auth::Admin,
    state::Conn,
    template::Page,
    tournaments::{
        Tournament, TournamentQuery, select_tournament,
        standings::TournamentStandings,
    },
    util_resp::{StandardResponse, success},
    widgets::tournament_selector::TournamentSelector,
};

pub struct StandingsTable<'r> {
    pub standings: &'r TournamentStandings,
}

impl Renderable for StandingsTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            @if self.standings.rows.is_empty() {
                p class="text-muted" { "This tournament has no teams yet." }
            } @else {
                table class="table table-striped" {
                    thead {
                        tr {
                            th scope="col" { "#" }
                            th scope="col" { "Team" }
                            th scope="col" title="Played" { "P" }
                            th scope="col" title="Won" { "W" }
                            th scope="col" title="Drawn" { "D" }
                            th scope="col" title="Lost" { "L" }
                            th scope="col" title="Goals for" { "GF" }
                            th scope="col" title="Goals against" { "GA" }
                            th scope="col" title="Goal difference" { "GD" }
                            th scope="col" { "Pts" }
                        }
                    }
                    tbody {
                        @for (i, row) in self.standings.rows.iter().enumerate() {
                            tr {
                                th scope="row" { (i + 1) }
                                td {
                                    a href=(format!("/team/{}", row.team.id)) {
                                        (row.team.name)
                                    }
                                }
                                td { (row.played) }
                                td { (row.wins) }
                                td { (row.draws) }
                                td { (row.losses) }
                                td { (row.goals_for) }
                                td { (row.goals_against) }
                                td { (format!("{:+}", row.goal_difference())) }
                                td { strong { (row.points) } }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

pub async fn standings_page(
    admin: Option<Admin>,
    mut conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    let tournaments = Tournament::visible(&mut *conn)?;
    let selected = select_tournament(&tournaments, query.id()).cloned();

    let standings = match &selected {
        Some(tournament) => {
            Some(TournamentStandings::fetch(tournament.id, &mut *conn)?)
        }
        None => None,
    };

    success(
        Page::new()
            .admin_opt(admin)
            .active_nav("table")
            .body(maud! {
                div class="container py-4" {
                    h1 { "Standings" }
                    TournamentSelector
                        action="/table"
                        tournaments=(&tournaments)
                        selected=(selected.as_ref().map(|t| t.id))
                        include_all=(false);
                    @match (&selected, &standings) {
                        (Some(tournament), Some(standings)) => {
                            h2 class="h4" { (tournament.name) }
                            StandingsTable standings=(standings);
                        }
                        _ => {
                            p class="text-muted" {
                                "Select a tournament to see its table."
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

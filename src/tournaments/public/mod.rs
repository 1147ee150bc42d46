//! Pages anyone can see. Only visible tournaments (and their teams and
//! matches) ever appear here.

use hypertext::{Raw, prelude::*};

use crate::{
    auth::Admin,
    extract::Path,
    state::Conn,
    template::Page,
    tournaments::{
        Tournament, TournamentQuery,
        matches::{DateOrder, MatchListing, MatchStatus},
        select_tournament,
        teams::Team,
    },
    util_resp::{StandardResponse, success},
    widgets::tournament_selector::TournamentSelector,
};

pub async fn home(admin: Option<Admin>, mut conn: Conn) -> StandardResponse {
    let tournaments = Tournament::visible(&mut *conn)?;

    success(
        Page::new()
            .admin_opt(admin)
            .body(maud! {
                div class="container py-4" {
                    h1 { "Tournaments" }
                    @if tournaments.is_empty() {
                        p class="text-muted" {
                            "There are no tournaments to show yet."
                        }
                    } @else {
                        div class="list-group" {
                            @for tournament in &tournaments {
                                div class="list-group-item" {
                                    h2 class="h5" { (tournament.name) }
                                    a class="me-3" href=(format!("/table?tournament={}", tournament.id)) { "Standings" }
                                    a class="me-3" href=(format!("/fixtures?tournament={}", tournament.id)) { "Fixtures" }
                                    a class="me-3" href=(format!("/results?tournament={}", tournament.id)) { "Results" }
                                    a class="me-3" href=(format!("/tournament-teams?tournament={}", tournament.id)) { "Teams" }
                                    a href=(format!("/rules?tournament={}", tournament.id)) { "Rules" }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

/// Lists matches, with their score once played.
pub struct MatchTable<'r> {
    pub matches: &'r [MatchListing],
    pub show_tournament: bool,
}

impl Renderable for MatchTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            table class="table" {
                thead {
                    tr {
                        th scope="col" { "Date" }
                        @if self.show_tournament {
                            th scope="col" { "Tournament" }
                        }
                        th scope="col" class="text-end" { "Home" }
                        th scope="col" class="text-center" { "" }
                        th scope="col" { "Away" }
                    }
                }
                tbody {
                    @for listing in self.matches {
                        tr {
                            td { (listing.inner.match_date.format("%Y-%m-%d").to_string()) }
                            @if self.show_tournament {
                                td { (listing.tournament_name) }
                            }
                            td class="text-end" {
                                a href=(format!("/team/{}", listing.inner.home_team_id)) {
                                    (listing.home_name)
                                }
                            }
                            td class="text-center" {
                                @match listing.inner.score() {
                                    Some((home, away)) => {
                                        strong { (home) " - " (away) }
                                    }
                                    None => { "vs" }
                                }
                            }
                            td {
                                a href=(format!("/team/{}", listing.inner.away_team_id)) {
                                    (listing.away_name)
                                }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

/// Shared by the results and fixtures pages: the matches of one status, of
/// the selected tournament or of every visible tournament.
async fn match_list_page(
    admin: Option<Admin>,
    mut conn: Conn,
    query: TournamentQuery,
    status: MatchStatus,
) -> StandardResponse {
    let (title, action, nav, order, empty) = match status {
        MatchStatus::Played => (
            "Results",
            "/results",
            "results",
            DateOrder::NewestFirst,
            "No results yet.",
        ),
        MatchStatus::Scheduled => (
            "Fixtures",
            "/fixtures",
            "fixtures",
            DateOrder::OldestFirst,
            "No upcoming matches.",
        ),
    };

    let tournaments = Tournament::visible(&mut *conn)?;
    let selected = select_tournament(&tournaments, query.id());

    let ids: Vec<i32> = match selected {
        Some(tournament) => vec![tournament.id],
        None => tournaments.iter().map(|t| t.id).collect(),
    };
    let matches = MatchListing::load(&ids, Some(status), order, &mut *conn)?;

    let tournaments: &[Tournament] = &tournaments;

    success(
        Page::new()
            .admin_opt(admin)
            .active_nav(nav)
            .body(maud! {
                div class="container py-4" {
                    h1 { (title) }
                    TournamentSelector
                        action=(action)
                        tournaments=(tournaments)
                        selected=(selected.map(|t| t.id))
                        include_all=(true);
                    @if matches.is_empty() {
                        p class="text-muted" { (empty) }
                    } @else {
                        MatchTable
                            matches=(&matches)
                            show_tournament=(selected.is_none());
                    }
                }
            })
            .render(),
    )
}

pub async fn results_page(
    admin: Option<Admin>,
    conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    match_list_page(admin, conn, query, MatchStatus::Played).await
}

pub async fn fixtures_page(
    admin: Option<Admin>,
    conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    match_list_page(admin, conn, query, MatchStatus::Scheduled).await
}

pub async fn rules_page(
    admin: Option<Admin>,
    mut conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    let tournaments = Tournament::visible(&mut *conn)?;
    let selected = select_tournament(&tournaments, query.id());

    // rules are written by admins, but are still cleaned before being
    // embedded in the page
    let rules = selected
        .and_then(|t| t.rules.as_deref())
        .map(ammonia::clean);

    let tournaments: &[Tournament] = &tournaments;

    success(
        Page::new()
            .admin_opt(admin)
            .active_nav("rules")
            .body(maud! {
                div class="container py-4" {
                    h1 { "Rules" }
                    TournamentSelector
                        action="/rules"
                        tournaments=(tournaments)
                        selected=(selected.map(|t| t.id))
                        include_all=(false);
                    @match (selected, &rules) {
                        (Some(tournament), Some(rules)) => {
                            h2 class="h4" { (tournament.name) }
                            div style="white-space: pre-line;" {
                                (Raw::dangerously_create(rules))
                            }
                        }
                        (Some(tournament), None) => {
                            h2 class="h4" { (tournament.name) }
                            p class="text-muted" {
                                "No rules have been published for this tournament."
                            }
                        }
                        (None, _) => {
                            p class="text-muted" {
                                "Select a tournament to read its rules."
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

pub async fn team_profile_page(
    admin: Option<Admin>,
    mut conn: Conn,
    Path(team_id): Path<i32>,
) -> StandardResponse {
    let (team, tournament_name) = Team::fetch_public(team_id, &mut *conn)?;

    let matches = MatchListing::load(
        &[team.tournament_id],
        None,
        DateOrder::OldestFirst,
        &mut *conn,
    )?
    .into_iter()
    .filter(|m| {
        m.inner.home_team_id == team.id || m.inner.away_team_id == team.id
    })
    .collect::<Vec<_>>();

    let details = [
        ("Owner", team.owner_name.clone()),
        ("Age", team.age.map(|age| age.to_string())),
        ("Location", team.location.clone()),
        ("Contact", team.contact.clone()),
    ];

    success(
        Page::new()
            .admin_opt(admin)
            .active_nav("teams")
            .body(maud! {
                div class="container py-4" {
                    h1 { (team.name) }
                    p class="text-muted" {
                        a href=(format!("/tournament-teams?tournament={}", team.tournament_id)) {
                            (tournament_name)
                        }
                    }
                    dl class="row" {
                        @for (label, value) in &details {
                            @if let Some(value) = value {
                                dt class="col-sm-2" { (label) }
                                dd class="col-sm-10" { (value) }
                            }
                        }
                    }
                    h2 class="h4" { "Matches" }
                    @if matches.is_empty() {
                        p class="text-muted" { "No matches scheduled." }
                    } @else {
                        MatchTable matches=(&matches) show_tournament=(false);
                    }
                }
            })
            .render(),
    )
}

pub async fn tournament_teams_page(
    admin: Option<Admin>,
    mut conn: Conn,
    query: TournamentQuery,
) -> StandardResponse {
    let tournaments = Tournament::visible(&mut *conn)?;
    let selected = select_tournament(&tournaments, query.id());

    let teams = match selected {
        Some(tournament) => Team::of_tournament(tournament.id, &mut *conn)?,
        None => Vec::new(),
    };

    let tournaments: &[Tournament] = &tournaments;

    success(
        Page::new()
            .admin_opt(admin)
            .active_nav("teams")
            .body(maud! {
                div class="container py-4" {
                    h1 { "Teams" }
                    TournamentSelector
                        action="/tournament-teams"
                        tournaments=(tournaments)
                        selected=(selected.map(|t| t.id))
                        include_all=(false);
                    @if selected.is_none() {
                        p class="text-muted" { "Select a tournament to see its teams." }
                    } @else if teams.is_empty() {
                        p class="text-muted" { "No teams have registered yet." }
                    } @else {
                        ul class="list-group" {
                            @for team in &teams {
                                li class="list-group-item" {
                                    a href=(format!("/team/{}", team.id)) { (team.name) }
                                    @if let Some(location) = &team.location {
                                        span class="text-muted ms-2" { (location) }
                                    }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

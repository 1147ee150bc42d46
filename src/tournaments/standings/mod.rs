//! The league table. Standings are never stored; they are recomputed from
//! the played matches whenever they are shown.

use std::cmp::Ordering;

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use indexmap::IndexMap;

use crate::tournaments::{matches::Match, teams::Team};

pub mod public;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn of(goals_for: i32, goals_against: i32) -> MatchOutcome {
        match goals_for.cmp(&goals_against) {
            Ordering::Greater => MatchOutcome::Win,
            Ordering::Equal => MatchOutcome::Draw,
            Ordering::Less => MatchOutcome::Loss,
        }
    }

    pub fn points(self) -> i32 {
        match self {
            MatchOutcome::Win => 3,
            MatchOutcome::Draw => 1,
            MatchOutcome::Loss => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandingsRow {
    pub team: Team,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
}

impl StandingsRow {
    fn new(team: Team) -> Self {
        StandingsRow {
            team,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    pub fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }

    fn add(&mut self, goals_for: i32, goals_against: i32) {
        let outcome = MatchOutcome::of(goals_for, goals_against);

        self.played += 1;
        self.goals_for += goals_for;
        self.goals_against += goals_against;
        self.points += outcome.points();
        match outcome {
            MatchOutcome::Win => self.wins += 1,
            MatchOutcome::Draw => self.draws += 1,
            MatchOutcome::Loss => self.losses += 1,
        }
    }

    fn ranking(&self, other: &StandingsRow) -> Ordering {
        other
            .points
            .cmp(&self.points)
            .then_with(|| other.goal_difference().cmp(&self.goal_difference()))
            .then_with(|| other.goals_for.cmp(&self.goals_for))
            .then_with(|| self.team.name.cmp(&other.team.name))
            .then_with(|| self.team.id.cmp(&other.team.id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TournamentStandings {
    /// Best team first.
    pub rows: Vec<StandingsRow>,
}

impl TournamentStandings {
    /// Every team gets a row, even without any played match. Matches which
    /// have not been played, or which involve a team that is not in `teams`,
    /// are skipped.
    pub fn compute(teams: Vec<Team>, matches: &[Match]) -> Self {
        let mut rows: IndexMap<i32, StandingsRow> = teams
            .into_iter()
            .map(|team| (team.id, StandingsRow::new(team)))
            .collect();

        for m in matches {
            let Some((home_goals, away_goals)) = m.score() else {
                continue;
            };
            if !rows.contains_key(&m.home_team_id)
                || !rows.contains_key(&m.away_team_id)
            {
                tracing::debug!(
                    match_id = m.id,
                    "skipping match between teams outside the standings"
                );
                continue;
            }

            if let Some(home) = rows.get_mut(&m.home_team_id) {
                home.add(home_goals, away_goals);
            }
            if let Some(away) = rows.get_mut(&m.away_team_id) {
                away.add(away_goals, home_goals);
            }
        }

        let mut rows: Vec<StandingsRow> = rows.into_values().collect();
        rows.sort_by(StandingsRow::ranking);

        TournamentStandings { rows }
    }

    pub fn fetch(
        tournament_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Self> {
        let teams = Team::of_tournament(tournament_id, conn)?;
        let matches = Match::played_of_tournament(tournament_id, conn)?;

        Ok(TournamentStandings::compute(teams, &matches))
    }
}

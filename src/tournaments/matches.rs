use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};

use crate::{
    schema::{matches, teams, tournaments},
    tournaments::WriteError,
    util_resp::FailureResponse,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    Scheduled,
    Played,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Played => "played",
        }
    }
}

#[derive(Queryable, Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub id: i32,
    pub tournament_id: i32,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub match_date: NaiveDate,
    pub status: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
}

impl Match {
    pub fn status(&self) -> MatchStatus {
        match self.score() {
            Some(_) => MatchStatus::Played,
            None => MatchStatus::Scheduled,
        }
    }

    /// `(home, away)` goals, if the match has been played.
    pub fn score(&self) -> Option<(i32, i32)> {
        match (self.status.as_str(), self.home_goals, self.away_goals) {
            ("played", Some(home), Some(away)) => Some((home, away)),
            _ => None,
        }
    }

    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        match_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Match, FailureResponse> {
        matches::table
            .find(match_id)
            .first::<Match>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound)
    }

    pub fn played_of_tournament(
        tournament_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Match>> {
        matches::table
            .filter(matches::tournament_id.eq(tournament_id))
            .filter(matches::status.eq(MatchStatus::Played.as_str()))
            .order_by(matches::id.asc())
            .load(conn)
    }

    pub fn count_of_tournament(
        tournament_id: i32,
        status: Option<MatchStatus>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<i64> {
        let mut query = matches::table
            .filter(matches::tournament_id.eq(tournament_id))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(matches::status.eq(status.as_str()));
        }
        query.count().get_result(conn)
    }

    /// Schedules a match between two distinct teams of the tournament.
    pub fn schedule(
        tournament_id: i32,
        home_team_id: i32,
        away_team_id: i32,
        match_date: NaiveDate,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<(), WriteError> {
        if home_team_id == away_team_id {
            return Err(WriteError::Rejected(
                "The home and away teams must be different.".to_string(),
            ));
        }

        let in_tournament = teams::table
            .filter(teams::tournament_id.eq(tournament_id))
            .filter(teams::id.eq_any([home_team_id, away_team_id]))
            .count()
            .get_result::<i64>(conn)?;
        if in_tournament != 2 {
            return Err(WriteError::Rejected(
                "Both teams must belong to the selected tournament."
                    .to_string(),
            ));
        }

        diesel::insert_into(matches::table)
            .values((
                matches::tournament_id.eq(tournament_id),
                matches::home_team_id.eq(home_team_id),
                matches::away_team_id.eq(away_team_id),
                matches::match_date.eq(match_date),
                matches::status.eq(MatchStatus::Scheduled.as_str()),
            ))
            .execute(conn)?;

        Ok(())
    }

    /// Records (or corrects) the result. Returns whether the match exists.
    pub fn record_result(
        match_id: i32,
        home_goals: i32,
        away_goals: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<bool> {
        diesel::update(matches::table.find(match_id))
            .set((
                matches::home_goals.eq(Some(home_goals)),
                matches::away_goals.eq(Some(away_goals)),
                matches::status.eq(MatchStatus::Played.as_str()),
            ))
            .execute(conn)
            .map(|n| n == 1)
    }

    /// Returns the match to the fixtures, forgetting its result.
    pub fn undo_result(
        match_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<bool> {
        diesel::update(matches::table.find(match_id))
            .set((
                matches::home_goals.eq(None::<i32>),
                matches::away_goals.eq(None::<i32>),
                matches::status.eq(MatchStatus::Scheduled.as_str()),
            ))
            .execute(conn)
            .map(|n| n == 1)
    }
}

/// A match together with the names needed to display it.
#[derive(Clone, Debug)]
pub struct MatchListing {
    pub inner: Match,
    pub home_name: String,
    pub away_name: String,
    pub tournament_name: String,
}

#[derive(Clone, Copy, Debug)]
pub enum DateOrder {
    OldestFirst,
    NewestFirst,
}

impl MatchListing {
    /// Loads the matches of the given tournaments, optionally restricted to
    /// one status.
    pub fn load(
        tournament_ids: &[i32],
        status: Option<MatchStatus>,
        order: DateOrder,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<MatchListing>> {
        if tournament_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = matches::table
            .filter(matches::tournament_id.eq_any(tournament_ids))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(matches::status.eq(status.as_str()));
        }
        query = match order {
            DateOrder::OldestFirst => {
                query.order_by((matches::match_date.asc(), matches::id.asc()))
            }
            DateOrder::NewestFirst => {
                query.order_by((matches::match_date.desc(), matches::id.desc()))
            }
        };
        let found = query.load::<Match>(conn)?;

        let team_names: HashMap<i32, String> = teams::table
            .filter(teams::tournament_id.eq_any(tournament_ids))
            .select((teams::id, teams::name))
            .load::<(i32, String)>(conn)?
            .into_iter()
            .collect();
        let tournament_names: HashMap<i32, String> = tournaments::table
            .filter(tournaments::id.eq_any(tournament_ids))
            .select((tournaments::id, tournaments::name))
            .load::<(i32, String)>(conn)?
            .into_iter()
            .collect();

        let name = |names: &HashMap<i32, String>, id: i32| {
            names.get(&id).cloned().unwrap_or_default()
        };

        Ok(found
            .into_iter()
            .map(|m| MatchListing {
                home_name: name(&team_names, m.home_team_id),
                away_name: name(&team_names, m.away_team_id),
                tournament_name: name(&tournament_names, m.tournament_id),
                inner: m,
            })
            .collect())
    }

    pub fn fetch(
        match_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<MatchListing, FailureResponse> {
        let found = Match::fetch(match_id, conn)?;
        MatchListing::load(&[found.tournament_id], None, DateOrder::OldestFirst, conn)?
            .into_iter()
            .find(|listing| listing.inner.id == match_id)
            .ok_or(FailureResponse::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(status: &str, home: Option<i32>, away: Option<i32>) -> Match {
        Match {
            id: 1,
            tournament_id: 1,
            home_team_id: 1,
            away_team_id: 2,
            match_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            status: status.to_string(),
            home_goals: home,
            away_goals: away,
        }
    }

    #[test]
    fn score_requires_played_status_and_both_goals() {
        assert_eq!(fixture("played", Some(2), Some(1)).score(), Some((2, 1)));
        assert_eq!(fixture("played", Some(2), Some(1)).status(), MatchStatus::Played);
        assert_eq!(fixture("scheduled", None, None).score(), None);
        assert_eq!(fixture("played", Some(2), None).score(), None);
        assert_eq!(
            fixture("scheduled", Some(2), Some(1)).status(),
            MatchStatus::Scheduled
        );
    }
}

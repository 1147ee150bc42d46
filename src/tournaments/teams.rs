use diesel::{
    connection::LoadConnection,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    sqlite::Sqlite,
};
use serde::{Deserialize, Serialize};

use crate::{
    schema::{teams, tournaments},
    tournaments::{WriteError, is_unique_violation},
    util_resp::FailureResponse,
};

#[derive(Serialize, Deserialize, Queryable, Clone, Debug, PartialEq, Eq)]
pub struct Team {
    pub id: i32,
    pub tournament_id: i32,
    pub name: String,
    pub owner_name: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub contact: Option<String>,
}

/// A validated team, ready to be inserted.
#[derive(Insertable, Debug)]
#[diesel(table_name = teams, treat_none_as_default_value = false)]
pub struct NewTeam {
    pub tournament_id: i32,
    pub name: String,
    pub owner_name: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub contact: Option<String>,
}

impl Team {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        team_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Team, FailureResponse> {
        teams::table
            .find(team_id)
            .first::<Team>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound)
    }

    /// Fetches a team for a public page: the team is only returned if its
    /// tournament is visible.
    pub fn fetch_public(
        team_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<(Team, String), FailureResponse> {
        teams::table
            .inner_join(tournaments::table)
            .filter(teams::id.eq(team_id))
            .filter(tournaments::visible.eq(true))
            .select((teams::all_columns, tournaments::name))
            .first::<(Team, String)>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound)
    }

    /// The teams of a tournament, ordered by name.
    pub fn of_tournament(
        tournament_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Team>> {
        teams::table
            .filter(teams::tournament_id.eq(tournament_id))
            .order_by((teams::name.asc(), teams::id.asc()))
            .load(conn)
    }

    pub fn count_of_tournament(
        tournament_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<i64> {
        teams::table
            .filter(teams::tournament_id.eq(tournament_id))
            .count()
            .get_result(conn)
    }

    /// Inserts the team. Team names are unique within a tournament; the
    /// database's unique constraint is what enforces this, so two
    /// simultaneous submissions cannot both succeed.
    pub fn create(
        team: &NewTeam,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<(), WriteError> {
        match diesel::insert_into(teams::table).values(team).execute(conn) {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(WriteError::Rejected(format!(
                    "A team named \"{}\" already exists in this tournament.",
                    team.name
                )))
            }
            Err(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                _,
            )) => Err(WriteError::Rejected(
                "That tournament does not exist.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the team (and, through the foreign keys, its matches).
    /// Returns the tournament the team belonged to, if it existed.
    pub fn delete(
        team_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Option<i32>> {
        let tournament_id = teams::table
            .find(team_id)
            .select(teams::tournament_id)
            .first::<i32>(conn)
            .optional()?;

        if tournament_id.is_some() {
            diesel::delete(teams::table.find(team_id)).execute(conn)?;
        }

        Ok(tournament_id)
    }
}

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    connection::LoadConnection,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    sqlite::Sqlite,
};
use crate::{schema::tournaments, util_resp::FailureResponse};

pub mod manage;
pub mod matches;
pub mod public;
pub mod standings;
pub mod teams;

#[derive(Queryable, Clone, Debug)]
pub struct Tournament {
    pub id: i32,
    pub name: String,
    pub visible: bool,
    pub rules: Option<String>,
    pub created_at: NaiveDateTime,
}

/// The outcome of a write which the admin may have to correct.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The input broke a rule. The message is meant for the admin.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Db(#[from] DieselError),
}

pub fn is_unique_violation(e: &DieselError) -> bool {
    matches!(
        e,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// The `?tournament=<id>` parameter accepted by most list pages. A
/// selection that cannot be read (malformed, repeated) is no selection.
#[derive(Default, Debug)]
pub struct TournamentQuery {
    pub tournament: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for TournamentQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let mut values = parts
            .uri
            .query()
            .into_iter()
            .flat_map(|query| url::form_urlencoded::parse(query.as_bytes()))
            .filter(|(key, _)| key == "tournament")
            .map(|(_, value)| value.into_owned());

        let tournament = match (values.next(), values.next()) {
            (Some(value), None) => Some(value),
            _ => None,
        };
        Ok(TournamentQuery { tournament })
    }
}

impl TournamentQuery {
    pub fn id(&self) -> Option<i32> {
        crate::validation::query_id(self.tournament.as_deref())
    }
}

impl Tournament {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Tournament, FailureResponse> {
        tournaments::table
            .find(id)
            .first::<Tournament>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound)
    }

    /// Ordered by name.
    pub fn all(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Tournament>> {
        tournaments::table
            .order_by((tournaments::name.asc(), tournaments::id.asc()))
            .load(conn)
    }

    pub fn newest_first(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Tournament>> {
        tournaments::table
            .order_by((tournaments::created_at.desc(), tournaments::id.desc()))
            .load(conn)
    }

    /// The tournaments which the public may see, ordered by name.
    pub fn visible(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Tournament>> {
        tournaments::table
            .filter(tournaments::visible.eq(true))
            .order_by((tournaments::name.asc(), tournaments::id.asc()))
            .load(conn)
    }

    /// Creates a hidden tournament. The name must be unique, which the
    /// database enforces.
    pub fn create(
        name: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<(), WriteError> {
        let res = diesel::insert_into(tournaments::table)
            .values((
                tournaments::name.eq(name),
                tournaments::visible.eq(false),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn);

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(WriteError::Rejected(
                format!("A tournament named \"{name}\" already exists."),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns whether the tournament exists.
    pub fn toggle_visibility(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<bool> {
        diesel::update(tournaments::table.find(id))
            .set(tournaments::visible.eq(diesel::dsl::not(tournaments::visible)))
            .execute(conn)
            .map(|n| n == 1)
    }

    /// Deletes the tournament along with its teams and matches. Returns
    /// whether the tournament existed.
    pub fn delete(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<bool> {
        diesel::delete(tournaments::table.find(id))
            .execute(conn)
            .map(|n| n == 1)
    }

    pub fn set_rules(
        id: i32,
        rules: Option<&str>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<bool> {
        diesel::update(tournaments::table.find(id))
            .set(tournaments::rules.eq(rules))
            .execute(conn)
            .map(|n| n == 1)
    }
}

/// Picks the requested tournament out of `tournaments`. Anything which is
/// not in the list (including hidden tournaments, when the list only holds
/// visible ones) counts as no selection.
pub fn select_tournament(
    tournaments: &[Tournament],
    requested: Option<i32>,
) -> Option<&Tournament> {
    requested.and_then(|id| tournaments.iter().find(|t| t.id == id))
}

/// Like [`select_tournament`], but falls back to the first tournament.
pub fn select_tournament_or_first(
    tournaments: &[Tournament],
    requested: Option<i32>,
) -> Option<&Tournament> {
    select_tournament(tournaments, requested).or(tournaments.first())
}

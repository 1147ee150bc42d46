//! Seeds a database with a published demo league, so that every page has
//! something on it.

use chrono::{Days, NaiveDate};
use clap::Parser;
use diesel::{connection::SimpleConnection, prelude::*};
use diesel_migrations::MigrationHarness;
use matchday::{
    MIGRATIONS,
    auth::bootstrap::ensure_admin,
    config::normalize_database_url,
    schema::{teams, tournaments},
    tournaments::{
        Tournament,
        matches::Match,
        teams::{NewTeam, Team},
    },
};

const TOURNAMENT_NAME: &str = "Liga Demo";

const TEAMS: &[(&str, &str, &str)] = &[
    ("Lions", "Ana Ruiz", "Rosario"),
    ("Tigers", "Bruno Diaz", "Cordoba"),
    ("Bears", "Carla Gomez", "Mendoza"),
    ("Wolves", "Diego Sosa", "Salta"),
    ("Eagles", "Elena Paz", "Tucuman"),
    ("Sharks", "Fabian Rios", "La Plata"),
];

const RULES: &str = "Matches are played in two halves of 40 minutes.
A win is worth 3 points and a draw 1 point.
Ties in the table are broken by goal difference, then goals scored.";

#[derive(Parser)]
struct Args {
    /// Defaults to the DATABASE_URL environment variable.
    database_url: Option<String>,
    /// How many rounds already have results.
    #[clap(long, default_value_t = 3)]
    played_rounds: usize,
    #[clap(long, default_value = "admin")]
    admin_username: String,
    #[clap(long, default_value = "password")]
    admin_password: String,
}

fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().init();

    let args = Args::parse();
    let db_url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").expect(
            "please either set `DATABASE_URL` or pass the database url as an argument",
        ),
    };
    let db_url = normalize_database_url(&db_url).unwrap();

    let mut conn = diesel::SqliteConnection::establish(&db_url).unwrap();
    conn.batch_execute("PRAGMA foreign_keys = ON;").unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();

    if ensure_admin(&args.admin_username, &args.admin_password, &mut conn)
        .unwrap()
    {
        tracing::info!(username = %args.admin_username, "created admin");
    }

    if tournaments::table
        .filter(tournaments::name.eq(TOURNAMENT_NAME))
        .count()
        .get_result::<i64>(&mut conn)
        .unwrap()
        > 0
    {
        panic!("{TOURNAMENT_NAME} already exists!")
    }

    Tournament::create(TOURNAMENT_NAME, &mut conn).unwrap();
    let tournament_id = tournaments::table
        .filter(tournaments::name.eq(TOURNAMENT_NAME))
        .select(tournaments::id)
        .first::<i32>(&mut conn)
        .unwrap();
    Tournament::toggle_visibility(tournament_id, &mut conn).unwrap();
    Tournament::set_rules(tournament_id, Some(RULES), &mut conn).unwrap();

    for (i, (name, owner, location)) in TEAMS.iter().enumerate() {
        Team::create(
            &NewTeam {
                tournament_id,
                name: name.to_string(),
                owner_name: Some(owner.to_string()),
                age: Some(20 + i as i32),
                location: Some(location.to_string()),
                contact: None,
            },
            &mut conn,
        )
        .unwrap();
    }

    let team_ids = teams::table
        .filter(teams::tournament_id.eq(tournament_id))
        .order_by(teams::id.asc())
        .select(teams::id)
        .load::<i32>(&mut conn)
        .unwrap();

    let first_matchday = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let mut scheduled = 0;
    let mut played = 0;

    for (round, pairs) in round_robin(&team_ids).into_iter().enumerate() {
        let date = first_matchday
            .checked_add_days(Days::new(7 * round as u64))
            .unwrap();

        for (home, away) in pairs {
            Match::schedule(tournament_id, home, away, date, &mut conn)
                .unwrap();
            scheduled += 1;

            if round < args.played_rounds {
                let match_id = matchday::schema::matches::table
                    .select(matchday::schema::matches::id)
                    .order_by(matchday::schema::matches::id.desc())
                    .first::<i32>(&mut conn)
                    .unwrap();
                // deterministic, but varied, scores
                let home_goals = (home * 7 + round as i32) % 4;
                let away_goals = (away * 3 + round as i32) % 3;
                Match::record_result(match_id, home_goals, away_goals, &mut conn)
                    .unwrap();
                played += 1;
            }
        }
    }

    tracing::info!(tournament_id, scheduled, played, "seeded {TOURNAMENT_NAME}");
}

/// Pairs every team with every other team once (the circle method).
fn round_robin(teams: &[i32]) -> Vec<Vec<(i32, i32)>> {
    let mut ring: Vec<Option<i32>> = teams.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }

    let n = ring.len();
    let mut rounds = Vec::new();
    for round in 0..n.saturating_sub(1) {
        let pairs = (0..n / 2)
            .filter_map(|i| match (ring[i], ring[n - 1 - i]) {
                (Some(a), Some(b)) if round % 2 == 0 => Some((a, b)),
                (Some(a), Some(b)) => Some((b, a)),
                _ => None,
            })
            .collect();
        rounds.push(pairs);
        ring[1..].rotate_right(1);
    }
    rounds
}

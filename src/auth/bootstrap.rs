//! Creating admin accounts outside the web interface (there is no way to
//! register through it).

use diesel::{
    connection::LoadConnection, insert_into, prelude::*, sqlite::Sqlite,
};

use crate::{auth::hash_password, schema::admins};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("could not hash the admin password: {0}")]
    Hash(String),
    #[error(transparent)]
    Db(#[from] diesel::result::Error),
}

/// Creates the admin `username` unless it already exists. Returns whether
/// an admin was created.
pub fn ensure_admin(
    username: &str,
    password: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<bool, BootstrapError> {
    let exists = diesel::dsl::select(diesel::dsl::exists(
        admins::table.filter(admins::username.eq(username)),
    ))
    .get_result::<bool>(conn)?;

    if exists {
        return Ok(false);
    }

    let password_hash =
        hash_password(password).map_err(|e| BootstrapError::Hash(e.to_string()))?;

    insert_into(admins::table)
        .values((
            admins::username.eq(username),
            admins::password_hash.eq(password_hash),
        ))
        .execute(conn)?;

    Ok(true)
}

/// Runs at startup: creates the configured admin when a password for it has
/// been provided.
pub fn bootstrap_admin(
    username: &str,
    password: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), BootstrapError> {
    match password {
        Some(password) => {
            if ensure_admin(username, password, conn)? {
                tracing::info!(username, "created bootstrap admin");
            } else {
                tracing::info!(username, "bootstrap admin already exists");
            }
        }
        None => {
            let count = admins::table.count().get_result::<i64>(conn)?;
            if count == 0 {
                tracing::warn!(
                    "there are no admins and ADMIN_PASS is not set, so nobody \
                     can log in. Set ADMIN_PASS or run `matchday create-admin`."
                );
            }
        }
    }

    Ok(())
}

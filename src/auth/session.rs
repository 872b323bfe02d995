use rand::Rng;
use rusqlite::params;

use crate::market::repository::RepositoryError;
use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: &str, hours: u64) -> Result<String, RepositoryError> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Resolve a session token to its user id. Expired sessions resolve to `None`.
pub fn session_user_id(pool: &DbPool, token: &str) -> Result<Option<String>, RepositoryError> {
    let conn = pool.get()?;

    let result = conn.query_row(
        "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
        params![token],
        |row| row.get(0),
    );

    match result {
        Ok(user_id) => Ok(Some(user_id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<(), RepositoryError> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// Repository pattern - every read and write against the marketplace tables
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Row};
use thiserror::Error;

use crate::db::models::{
    Application, ApplicationDetails, ApplicationStatus, Compensation, IdeaWithFounder,
    NewApplication, NewIdea, NewUser, ProfileUpdate, StartupIdea, User,
};
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Which ideas to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdeaFilter {
    All,
    Founder(String),
}

/// Which applications to select. `Founder` joins through the idea's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationFilter {
    Developer(String),
    Founder(String),
}

/// Credentials row used only by sign-in.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub user: User,
    pub password_hash: String,
}

/// All reads come back newest first (`created_at DESC`).
#[async_trait]
pub trait MarketRepository: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, RepositoryError>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError>;

    async fn list_ideas(&self, filter: &IdeaFilter)
        -> Result<Vec<IdeaWithFounder>, RepositoryError>;

    async fn find_idea(&self, id: &str) -> Result<Option<StartupIdea>, RepositoryError>;

    async fn insert_idea(&self, idea: &NewIdea) -> Result<StartupIdea, RepositoryError>;

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationDetails>, RepositoryError>;

    async fn find_application(
        &self,
        id: &str,
    ) -> Result<Option<ApplicationDetails>, RepositoryError>;

    /// Fails with `Conflict` when the developer already applied to the idea.
    async fn insert_application(
        &self,
        application: &NewApplication,
    ) -> Result<Application, RepositoryError>;

    /// Unconditional write of `status`; transition rules live above this layer.
    async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, RepositoryError>;
}

const USER_COLUMNS: &str = "u.id, u.email, u.full_name, u.user_type, u.background, u.expertise, \
     u.github_username, u.linkedin_url, u.whatsapp_number, u.created_at";
const USER_WIDTH: usize = 10;

const IDEA_COLUMNS: &str = "i.id, i.founder_id, i.title, i.description, i.required_skills, \
     i.compensation_type, i.equity_percentage, i.monetary_compensation, \
     i.terms_and_conditions, i.has_nda, i.created_at";
const IDEA_WIDTH: usize = 11;

const APPLICATION_COLUMNS: &str = "a.id, a.idea_id, a.developer_id, a.note, a.status, a.created_at";
const APPLICATION_WIDTH: usize = 6;

fn user_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(at)?,
        email: row.get(at + 1)?,
        full_name: row.get(at + 2)?,
        user_type: row.get(at + 3)?,
        background: row.get(at + 4)?,
        expertise: row.get(at + 5)?,
        github_username: row.get(at + 6)?,
        linkedin_url: row.get(at + 7)?,
        whatsapp_number: row.get(at + 8)?,
        created_at: row.get(at + 9)?,
    })
}

/// For LEFT JOINed users: a NULL id means no matching row.
fn joined_user_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Option<User>> {
    let id: Option<String> = row.get(at)?;
    match id {
        Some(_) => user_from_row(row, at).map(Some),
        None => Ok(None),
    }
}

fn idea_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<StartupIdea> {
    let skills_json: String = row.get(at + 4)?;
    let required_skills: Vec<String> = serde_json::from_str(&skills_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(at + 4, Type::Text, Box::new(e)))?;

    let compensation_type: String = row.get(at + 5)?;
    let compensation = Compensation::from_parts(&compensation_type, row.get(at + 6)?, row.get(at + 7)?)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(at + 5, Type::Text, Box::new(e)))?;

    Ok(StartupIdea {
        id: row.get(at)?,
        founder_id: row.get(at + 1)?,
        title: row.get(at + 2)?,
        description: row.get(at + 3)?,
        required_skills,
        compensation,
        terms_and_conditions: row.get(at + 8)?,
        has_nda: row.get(at + 9)?,
        created_at: row.get(at + 10)?,
    })
}

fn application_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Application> {
    Ok(Application {
        id: row.get(at)?,
        idea_id: row.get(at + 1)?,
        developer_id: row.get(at + 2)?,
        note: row.get(at + 3)?,
        status: row.get(at + 4)?,
        created_at: row.get(at + 5)?,
    })
}

/// Columns: application, idea, developer.
fn application_details_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationDetails> {
    Ok(ApplicationDetails {
        application: application_from_row(row, 0)?,
        idea: idea_from_row(row, APPLICATION_WIDTH)?,
        developer: joined_user_from_row(row, APPLICATION_WIDTH + IDEA_WIDTH)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// SQLite implementation
pub struct SqliteMarketRepository {
    pool: DbPool,
}

impl SqliteMarketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn user_by_id(conn: &rusqlite::Connection, id: &str) -> Result<Option<User>, RepositoryError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM users u WHERE u.id = ?1", USER_COLUMNS),
            params![id],
            |row| user_from_row(row, 0),
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn idea_by_id(
        conn: &rusqlite::Connection,
        id: &str,
    ) -> Result<Option<StartupIdea>, RepositoryError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM startup_ideas i WHERE i.id = ?1", IDEA_COLUMNS),
            params![id],
            |row| idea_from_row(row, 0),
        );

        match result {
            Ok(idea) => Ok(Some(idea)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn application_by_id(
        conn: &rusqlite::Connection,
        id: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        let result = conn.query_row(
            &format!(
                "SELECT {} FROM applications a WHERE a.id = ?1",
                APPLICATION_COLUMNS
            ),
            params![id],
            |row| application_from_row(row, 0),
        );

        match result {
            Ok(application) => Ok(Some(application)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl MarketRepository for SqliteMarketRepository {
    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        Self::user_by_id(&conn, id)
    }

    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, RepositoryError> {
        let conn = self.pool.get()?;

        let result = conn.query_row(
            &format!(
                "SELECT {}, u.password_hash FROM users u WHERE u.email = ?1 COLLATE NOCASE",
                USER_COLUMNS
            ),
            params![email],
            |row| {
                Ok(LoginRecord {
                    user: user_from_row(row, 0)?,
                    password_hash: row.get(USER_WIDTH)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        conn.execute(
            "INSERT INTO users (id, email, full_name, user_type, password_hash, background,
                                expertise, github_username, linkedin_url, whatsapp_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                user.email,
                user.full_name,
                user.user_type,
                user.password_hash,
                user.background,
                user.expertise,
                user.github_username,
                user.linkedin_url,
                user.whatsapp_number,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("email {} is already registered", user.email))
            } else {
                e.into()
            }
        })?;

        Self::user_by_id(&conn, &id)?.ok_or_else(|| RepositoryError::NotFound(id))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "UPDATE users SET background = ?1, expertise = ?2, github_username = ?3,
                              linkedin_url = ?4, whatsapp_number = ?5
             WHERE id = ?6",
            params![
                update.background,
                update.expertise,
                update.github_username,
                update.linkedin_url,
                update.whatsapp_number,
                user_id,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(user_id.to_string()));
        }

        Self::user_by_id(&conn, user_id)?
            .ok_or_else(|| RepositoryError::NotFound(user_id.to_string()))
    }

    async fn list_ideas(
        &self,
        filter: &IdeaFilter,
    ) -> Result<Vec<IdeaWithFounder>, RepositoryError> {
        let conn = self.pool.get()?;

        let base = format!(
            "SELECT {}, {} FROM startup_ideas i LEFT JOIN users u ON u.id = i.founder_id",
            IDEA_COLUMNS, USER_COLUMNS
        );
        let order = "ORDER BY i.created_at DESC, i.rowid DESC";
        let map = |row: &Row<'_>| -> rusqlite::Result<IdeaWithFounder> {
            Ok(IdeaWithFounder {
                idea: idea_from_row(row, 0)?,
                founder: joined_user_from_row(row, IDEA_WIDTH)?,
            })
        };

        let ideas = match filter {
            IdeaFilter::All => {
                let mut stmt = conn.prepare(&format!("{} {}", base, order))?;
                let rows = stmt.query_map([], map)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            IdeaFilter::Founder(founder_id) => {
                let mut stmt =
                    conn.prepare(&format!("{} WHERE i.founder_id = ?1 {}", base, order))?;
                let rows = stmt.query_map(params![founder_id], map)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(ideas)
    }

    async fn find_idea(&self, id: &str) -> Result<Option<StartupIdea>, RepositoryError> {
        let conn = self.pool.get()?;
        Self::idea_by_id(&conn, id)
    }

    async fn insert_idea(&self, idea: &NewIdea) -> Result<StartupIdea, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        let skills_json = serde_json::to_string(&idea.required_skills)?;

        conn.execute(
            "INSERT INTO startup_ideas (id, founder_id, title, description, required_skills,
                                        compensation_type, equity_percentage, monetary_compensation,
                                        terms_and_conditions, has_nda)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                idea.founder_id,
                idea.title,
                idea.description,
                skills_json,
                idea.compensation.type_str(),
                idea.compensation.equity_percentage(),
                idea.compensation.monetary_compensation(),
                idea.terms_and_conditions,
                idea.has_nda,
            ],
        )?;

        Self::idea_by_id(&conn, &id)?.ok_or_else(|| RepositoryError::NotFound(id))
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationDetails>, RepositoryError> {
        let conn = self.pool.get()?;

        let (condition, owner) = match filter {
            ApplicationFilter::Developer(id) => ("a.developer_id = ?1", id),
            ApplicationFilter::Founder(id) => ("i.founder_id = ?1", id),
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {}, {} FROM applications a
             JOIN startup_ideas i ON i.id = a.idea_id
             LEFT JOIN users u ON u.id = a.developer_id
             WHERE {}
             ORDER BY a.created_at DESC, a.rowid DESC",
            APPLICATION_COLUMNS, IDEA_COLUMNS, USER_COLUMNS, condition
        ))?;
        let applications = stmt
            .query_map(params![owner], application_details_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(applications)
    }

    async fn find_application(
        &self,
        id: &str,
    ) -> Result<Option<ApplicationDetails>, RepositoryError> {
        let conn = self.pool.get()?;

        let result = conn.query_row(
            &format!(
                "SELECT {}, {}, {} FROM applications a
                 JOIN startup_ideas i ON i.id = a.idea_id
                 LEFT JOIN users u ON u.id = a.developer_id
                 WHERE a.id = ?1",
                APPLICATION_COLUMNS, IDEA_COLUMNS, USER_COLUMNS
            ),
            params![id],
            application_details_from_row,
        );

        match result {
            Ok(details) => Ok(Some(details)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_application(
        &self,
        application: &NewApplication,
    ) -> Result<Application, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        conn.execute(
            "INSERT INTO applications (id, idea_id, developer_id, note) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                application.idea_id,
                application.developer_id,
                application.note
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!(
                    "developer {} already applied to idea {}",
                    application.developer_id, application.idea_id
                ))
            } else {
                e.into()
            }
        })?;

        Self::application_by_id(&conn, &id)?.ok_or_else(|| RepositoryError::NotFound(id))
    }

    async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "UPDATE applications SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Self::application_by_id(&conn, id)?.ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

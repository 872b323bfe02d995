use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role chosen at sign-up. Never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Founder,
    Developer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Founder => "founder",
            UserType::Developer => "developer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Capitalised form used on status badges.
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for UserType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "founder" => Ok(UserType::Founder),
            "developer" => Ok(UserType::Developer),
            other => Err(ParseEnumError {
                kind: "user type",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(ParseEnumError {
                kind: "application status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn text_enum<T: FromStr<Err = ParseEnumError>>(value: ValueRef<'_>) -> FromSqlResult<T> {
    value
        .as_str()?
        .parse()
        .map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
}

impl FromSql for UserType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_enum(value)
    }
}

impl ToSql for UserType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ApplicationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_enum(value)
    }
}

impl ToSql for ApplicationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub user_type: UserType,
    pub background: Option<String>,
    pub expertise: Option<String>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub created_at: String,
}

/// How a founder pays for the work. The tag decides which amounts exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "compensation_type", rename_all = "lowercase")]
pub enum Compensation {
    Equity {
        equity_percentage: f64,
    },
    Monetary {
        monetary_compensation: f64,
    },
    Both {
        equity_percentage: f64,
        monetary_compensation: f64,
    },
}

impl Compensation {
    pub fn type_str(&self) -> &'static str {
        match self {
            Compensation::Equity { .. } => "equity",
            Compensation::Monetary { .. } => "monetary",
            Compensation::Both { .. } => "both",
        }
    }

    pub fn equity_percentage(&self) -> Option<f64> {
        match *self {
            Compensation::Equity { equity_percentage }
            | Compensation::Both {
                equity_percentage, ..
            } => Some(equity_percentage),
            Compensation::Monetary { .. } => None,
        }
    }

    pub fn monetary_compensation(&self) -> Option<f64> {
        match *self {
            Compensation::Monetary {
                monetary_compensation,
            }
            | Compensation::Both {
                monetary_compensation,
                ..
            } => Some(monetary_compensation),
            Compensation::Equity { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupIdea {
    pub id: String,
    pub founder_id: String,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    #[serde(flatten)]
    pub compensation: Compensation,
    pub terms_and_conditions: Option<String>,
    pub has_nda: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub idea_id: String,
    pub developer_id: String,
    pub note: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: String,
}

/// An idea row with its founder embedded through `founder_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdeaWithFounder {
    #[serde(flatten)]
    pub idea: StartupIdea,
    pub founder: Option<User>,
}

/// An application row with the idea and the developer embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationDetails {
    #[serde(flatten)]
    pub application: Application,
    pub idea: StartupIdea,
    pub developer: Option<User>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub user_type: UserType,
    pub password_hash: String,
    pub background: Option<String>,
    pub expertise: Option<String>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIdea {
    pub founder_id: String,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub compensation: Compensation,
    pub terms_and_conditions: Option<String>,
    pub has_nda: bool,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub idea_id: String,
    pub developer_id: String,
    pub note: Option<String>,
}

/// Editable profile fields. Email and role are deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub background: Option<String>,
    pub expertise: Option<String>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
}

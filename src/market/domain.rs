// Marketplace rules - pure functions over the row types, no I/O
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fmt;

use crate::db::models::{
    ApplicationDetails, ApplicationStatus, Compensation, IdeaWithFounder, NewIdea, StartupIdea,
    User, UserType,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Only developers can apply to ideas")]
    NotADeveloper,

    #[error("Only founders can do that")]
    NotAFounder,

    #[error("You have already applied to this idea")]
    AlreadyApplied,

    #[error("Application is already {from}; it cannot become {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("{0}")]
    Validation(String),
}

/// The signed-in user, split by role so every view has to handle both.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewer {
    Founder(User),
    Developer(User),
}

impl From<User> for Viewer {
    fn from(user: User) -> Self {
        match user.user_type {
            UserType::Founder => Viewer::Founder(user),
            UserType::Developer => Viewer::Developer(user),
        }
    }
}

impl Viewer {
    pub fn user(&self) -> &User {
        match self {
            Viewer::Founder(user) | Viewer::Developer(user) => user,
        }
    }

    pub fn id(&self) -> &str {
        &self.user().id
    }

    pub fn is_founder(&self) -> bool {
        matches!(self, Viewer::Founder(_))
    }

    pub fn role_label(&self) -> &'static str {
        match self {
            Viewer::Founder(_) => "Startup Founder",
            Viewer::Developer(_) => "Developer",
        }
    }
}

// -- Compensation --

impl Compensation {
    /// Short form shown on idea cards, e.g. `5% + $2000/mo`.
    pub fn label(&self) -> String {
        match self {
            Compensation::Equity { equity_percentage } => {
                format!("{}% equity", equity_percentage)
            }
            Compensation::Monetary {
                monetary_compensation,
            } => format!("${}/mo", monetary_compensation),
            Compensation::Both {
                equity_percentage,
                monetary_compensation,
            } => format!("{}% + ${}/mo", equity_percentage, monetary_compensation),
        }
    }

    pub fn from_parts(
        compensation_type: &str,
        equity_percentage: Option<f64>,
        monetary_compensation: Option<f64>,
    ) -> Result<Self, DomainError> {
        let equity = || {
            equity_percentage
                .ok_or_else(|| DomainError::Validation("Equity percentage is required".into()))
        };
        let monthly = || {
            monetary_compensation
                .ok_or_else(|| DomainError::Validation("Monthly compensation is required".into()))
        };

        match compensation_type {
            "equity" => Ok(Compensation::Equity {
                equity_percentage: equity()?,
            }),
            "monetary" => Ok(Compensation::Monetary {
                monetary_compensation: monthly()?,
            }),
            "both" => Ok(Compensation::Both {
                equity_percentage: equity()?,
                monetary_compensation: monthly()?,
            }),
            other => Err(DomainError::Validation(format!(
                "Unknown compensation type: {}",
                other
            ))),
        }
    }
}

// -- Idea search --

/// Text search plus skill facets, as carried in the `/ideas` query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdeaSearch {
    pub term: String,
    pub skills: Vec<String>,
    pub selected: Option<String>,
}

impl IdeaSearch {
    /// Reads `q`, repeated `skill` and `selected` pairs. Unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut search = IdeaSearch::default();
        let Some(query) = query else {
            return search;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "q" => search.term = value.into_owned(),
                "skill" => {
                    let skill = value.into_owned();
                    if !skill.is_empty() && !search.skills.contains(&skill) {
                        search.skills.push(skill);
                    }
                }
                "selected" if !value.is_empty() => search.selected = Some(value.into_owned()),
                _ => {}
            }
        }
        search
    }

    /// OR across selected skills, AND with the text predicate.
    pub fn matches(&self, idea: &StartupIdea) -> bool {
        let term = self.term.to_lowercase();
        let matches_search = idea.title.to_lowercase().contains(&term)
            || idea.description.to_lowercase().contains(&term);
        let matches_skills = self.skills.is_empty()
            || self
                .skills
                .iter()
                .any(|skill| idea.required_skills.contains(skill));
        matches_search && matches_skills
    }

    pub fn is_selected(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    /// Query string for the same search with `skill` switched on or off.
    pub fn toggle_skill_query(&self, skill: &str) -> String {
        let mut skills: Vec<&str> = self.skills.iter().map(String::as_str).collect();
        if let Some(pos) = skills.iter().position(|s| *s == skill) {
            skills.remove(pos);
        } else {
            skills.push(skill);
        }
        Self::encode(&self.term, &skills, None)
    }

    /// Query string for the same search with the detail panel open on `idea_id`.
    pub fn select_query(&self, idea_id: &str) -> String {
        let skills: Vec<&str> = self.skills.iter().map(String::as_str).collect();
        Self::encode(&self.term, &skills, Some(idea_id))
    }

    /// Query string for the same search with no idea selected.
    pub fn base_query(&self) -> String {
        let skills: Vec<&str> = self.skills.iter().map(String::as_str).collect();
        Self::encode(&self.term, &skills, None)
    }

    fn encode(term: &str, skills: &[&str], selected: Option<&str>) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if !term.is_empty() {
            serializer.append_pair("q", term);
        }
        for skill in skills {
            serializer.append_pair("skill", skill);
        }
        if let Some(id) = selected {
            serializer.append_pair("selected", id);
        }
        serializer.finish()
    }
}

/// Keeps server order; filtering never re-sorts.
pub fn filter_ideas<'a>(
    ideas: &'a [IdeaWithFounder],
    search: &IdeaSearch,
) -> Vec<&'a IdeaWithFounder> {
    ideas
        .iter()
        .filter(|entry| search.matches(&entry.idea))
        .collect()
}

/// Distinct skills across `ideas`, in first-seen order.
pub fn collect_skills(ideas: &[IdeaWithFounder]) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for entry in ideas {
        for skill in &entry.idea.required_skills {
            if !skills.contains(skill) {
                skills.push(skill.clone());
            }
        }
    }
    skills
}

// -- Applications --

/// Advisory uniqueness check against the developer's own application list.
pub fn ensure_not_applied(
    own_applications: &[ApplicationDetails],
    idea_id: &str,
) -> Result<(), DomainError> {
    if has_applied(own_applications, idea_id) {
        Err(DomainError::AlreadyApplied)
    } else {
        Ok(())
    }
}

pub fn has_applied(own_applications: &[ApplicationDetails], idea_id: &str) -> bool {
    own_applications
        .iter()
        .any(|details| details.application.idea_id == idea_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(self) -> ApplicationStatus {
        match self {
            Decision::Approved => ApplicationStatus::Approved,
            Decision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

/// Outcome of applying a founder decision to the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// pending -> approved | rejected
    Applied(ApplicationStatus),
    /// The same decision arrived again before the founder saw the refetch.
    Repeated(ApplicationStatus),
}

pub fn decide(current: ApplicationStatus, decision: Decision) -> Result<Transition, DomainError> {
    let target = decision.status();
    match current {
        ApplicationStatus::Pending => Ok(Transition::Applied(target)),
        status if status == target => Ok(Transition::Repeated(target)),
        status => Err(DomainError::InvalidTransition {
            from: status,
            to: target,
        }),
    }
}

/// Contact details are disclosed on an application only once it is approved.
pub fn discloses_contact(status: ApplicationStatus) -> bool {
    status == ApplicationStatus::Approved
}

// -- Posting ideas --

/// Input for a new idea before validation, shared by the form and the JSON API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdeaDraft {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub compensation_type: String,
    pub equity_percentage: Option<f64>,
    pub monetary_compensation: Option<f64>,
    pub terms_and_conditions: Option<String>,
    pub has_nda: bool,
}

impl IdeaDraft {
    pub fn validate(self, founder_id: &str) -> Result<NewIdea, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("Title is required".into()));
        }
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::Validation("Description is required".into()));
        }

        let required_skills: Vec<String> = self
            .required_skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .fold(Vec::new(), |mut acc, s| {
                if !acc.iter().any(|existing| existing == s) {
                    acc.push(s.to_string());
                }
                acc
            });
        if required_skills.is_empty() {
            return Err(DomainError::Validation(
                "At least one required skill is needed".into(),
            ));
        }

        let compensation = Compensation::from_parts(
            &self.compensation_type,
            self.equity_percentage,
            self.monetary_compensation,
        )?;
        if let Some(equity) = compensation.equity_percentage() {
            if !equity.is_finite() || equity <= 0.0 || equity > 100.0 {
                return Err(DomainError::Validation(
                    "Equity percentage must be between 0 and 100".into(),
                ));
            }
        }
        if let Some(monthly) = compensation.monetary_compensation() {
            if !monthly.is_finite() || monthly < 0.0 {
                return Err(DomainError::Validation(
                    "Monthly compensation cannot be negative".into(),
                ));
            }
        }

        Ok(NewIdea {
            founder_id: founder_id.to_string(),
            title,
            description,
            required_skills,
            compensation,
            terms_and_conditions: non_empty(self.terms_and_conditions),
            has_nda: self.has_nda,
        })
    }
}

/// Splits the comma-separated skills field of the posting form.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses an optional numeric form field; blank means absent.
pub fn parse_amount(raw: &str, field: &str) -> Result<Option<f64>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| DomainError::Validation(format!("{} must be a number", field)))
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Profile links end up in `href`, so only absolute http(s) URLs are kept.
pub fn web_link(value: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match url::Url::parse(&raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(raw)),
        _ => Err(DomainError::Validation(
            "LinkedIn URL must start with http:// or https://".into(),
        )),
    }
}

// -- Presentation helpers --

/// `Jan 5, 2025`. Unparseable timestamps are shown as stored.
pub fn format_date(timestamp: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.format("%b %-d, %Y").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") {
        return dt.format("%b %-d, %Y").to_string();
    }
    timestamp.to_string()
}

pub fn whatsapp_link(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("https://wa.me/{}", digits)
}

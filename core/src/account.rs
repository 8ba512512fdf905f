//! Learner and instructor accounts.
//!
//! # Design
//! `Account` is a tagged union over the two kinds. Both share an `Identity`
//! (username, display name, locality, optional session token); instructors
//! add expertise tags and a weekday mask. Only the account that performed
//! its own login carries a token; accounts hydrated for other users (search
//! results, lookups) never do.

use std::str::FromStr;

use crate::error::ApiError;
use crate::types::{ProfileRecord, RegisterInstructor, RegisterLearner};

/// Account kind as reported by `/api/get_user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Learner,
    Instructor,
}

impl AccountKind {
    /// Wire token used by the backend.
    pub fn as_wire(self) -> &'static str {
        match self {
            AccountKind::Learner => "STUDENT",
            AccountKind::Instructor => "TUTOR",
        }
    }
}

impl FromStr for AccountKind {
    type Err = ApiError;

    /// Accepts bare text or a JSON string literal, in any case, with
    /// surrounding whitespace.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let decoded = serde_json::from_str::<String>(trimmed).ok();
        let token = decoded.as_deref().unwrap_or(trimmed).trim();
        if token.eq_ignore_ascii_case("STUDENT") {
            Ok(AccountKind::Learner)
        } else if token.eq_ignore_ascii_case("TUTOR") {
            Ok(AccountKind::Instructor)
        } else {
            Err(ApiError::AccountTypeUnresolved(raw.to_string()))
        }
    }
}

/// Fields shared by both account kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub locality: String,
    session_token: Option<String>,
}

impl Identity {
    pub fn new(username: &str, display_name: &str, locality: &str) -> Self {
        Self {
            username: username.to_string(),
            display_name: display_name.to_string(),
            locality: locality.to_string(),
            session_token: None,
        }
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    fn with_token(mut self, token: Option<String>) -> Self {
        self.session_token = token.filter(|t| !t.is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Learner {
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructor {
    pub identity: Identity,
    pub expertise_tags: String,
    /// One digit per available weekday, Sunday = 0 (e.g. "023").
    pub available_weekdays_mask: String,
}

impl Instructor {
    /// Hydrate another user's credential record; never carries a token.
    pub fn from_record(record: ProfileRecord) -> Self {
        Self {
            identity: Identity::new(&record.username, &record.name, &record.locality),
            expertise_tags: record.expertise,
            available_weekdays_mask: record.allowed_weekdays,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    Learner(Learner),
    Instructor(Instructor),
}

impl Account {
    /// Hydrate the variant named by `kind` from a profile record, attaching
    /// `token` when the profile belongs to the caller.
    pub fn hydrate(kind: AccountKind, record: ProfileRecord, token: Option<String>) -> Self {
        match kind {
            AccountKind::Learner => Account::Learner(Learner {
                identity: Identity::new(&record.username, &record.name, &record.locality)
                    .with_token(token),
            }),
            AccountKind::Instructor => {
                let mut instructor = Instructor::from_record(record);
                instructor.identity = instructor.identity.with_token(token);
                Account::Instructor(instructor)
            }
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            Account::Learner(_) => AccountKind::Learner,
            Account::Instructor(_) => AccountKind::Instructor,
        }
    }

    pub fn identity(&self) -> &Identity {
        match self {
            Account::Learner(l) => &l.identity,
            Account::Instructor(i) => &i.identity,
        }
    }

    pub fn username(&self) -> &str {
        &self.identity().username
    }

    pub fn session_token(&self) -> Option<&str> {
        self.identity().session_token()
    }

    pub fn as_learner(&self) -> Option<&Learner> {
        match self {
            Account::Learner(l) => Some(l),
            Account::Instructor(_) => None,
        }
    }

    pub fn as_instructor(&self) -> Option<&Instructor> {
        match self {
            Account::Instructor(i) => Some(i),
            Account::Learner(_) => None,
        }
    }
}

/// Registration intent for a new learner.
#[derive(Debug, Clone)]
pub struct LearnerRegistration {
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub locality: String,
}

impl LearnerRegistration {
    pub fn to_wire(&self) -> RegisterLearner {
        RegisterLearner {
            username: self.username.clone(),
            name: self.display_name.clone(),
            password: self.password.clone(),
            locality: self.locality.clone(),
        }
    }
}

/// Registration intent for a new instructor.
#[derive(Debug, Clone)]
pub struct InstructorRegistration {
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub locality: String,
    pub expertise_tags: String,
    pub available_weekdays_mask: String,
}

impl InstructorRegistration {
    pub fn to_wire(&self) -> RegisterInstructor {
        RegisterInstructor {
            username: self.username.clone(),
            name: self.display_name.clone(),
            password: self.password.clone(),
            locality: self.locality.clone(),
            expertise: self.expertise_tags.clone(),
            allowed_weekdays: self.available_weekdays_mask.clone(),
        }
    }
}

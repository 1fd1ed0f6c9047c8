use std::error::Error;
use std::fmt;

use rusqlite::Connection;
use serde::Serialize;

use crate::config::ConfigError;
use crate::db::{self, FollowDirection, RequestDirection, UserRecord};
use crate::domain::recurrence::RecurrenceError;
use crate::domain::status::{InvalidStatusTransition, InviteStatus, ParseInviteStatusError};
use crate::domain::text::{looks_like_email, non_empty, normalize_email, normalize_text};
use crate::ids;
use crate::relations::RelationshipService;
use crate::scheduling::SchedulingService;

pub const DEFAULT_ROLE: &str = "User";

pub struct App {
    conn: Connection,
    max_occurrences: usize,
}

/// A user as shown to callers; the stored password never leaves the store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub major: String,
    pub student_id: String,
    pub profile_picture: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub major: Option<String>,
    pub student_id: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub major: Option<String>,
    pub student_id: Option<String>,
    pub profile_picture: Option<String>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.password.is_some()
            || self.role.is_some()
            || self.major.is_some()
            || self.student_id.is_some()
            || self.profile_picture.is_some()
            || self.is_active.is_some()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FollowSummary {
    pub user: UserView,
    pub followers: Vec<UserView>,
    pub following: Vec<UserView>,
    pub pending: Vec<UserView>,
}

impl App {
    pub fn open(db_path: &str, max_occurrences: usize) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        log::debug!(
            "opened {} at schema version {}",
            db_path,
            db::get_meta(&conn, "schema_version")?.unwrap_or_default()
        );
        Ok(Self {
            conn,
            max_occurrences,
        })
    }

    pub fn relations(&self) -> RelationshipService<'_> {
        RelationshipService::new(&self.conn)
    }

    pub fn scheduling(&self) -> SchedulingService<'_> {
        SchedulingService::new(&self.conn, self.max_occurrences)
    }

    pub fn register_user(&self, input: NewUser) -> Result<UserView, AppError> {
        let name = non_empty(&input.name)
            .ok_or_else(|| AppError::InvalidArgument("name cannot be empty".to_string()))?;
        let email = validated_email(&input.email)?;
        if input.password.is_empty() {
            return Err(AppError::InvalidArgument(
                "password cannot be empty".to_string(),
            ));
        }
        if db::get_user_by_email(&self.conn, &email)?.is_some() {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                email
            )));
        }

        let record = UserRecord {
            id: ids::new_id(),
            name,
            email,
            password: input.password,
            role: normalize_text(input.role.as_deref(), DEFAULT_ROLE),
            major: normalize_text(input.major.as_deref(), ""),
            student_id: normalize_text(input.student_id.as_deref(), ""),
            profile_picture: normalize_text(input.profile_picture.as_deref(), ""),
            is_active: true,
            created_at: db::now_utc_rfc3339(),
        };
        db::insert_user(&self.conn, &record)?;
        log::info!("registered user {} <{}>", record.id, record.email);
        Ok(UserView::from(record))
    }

    /// Checks credentials against the stored password verbatim.
    pub fn login(&self, email: &str, password: &str) -> Result<UserView, AppError> {
        let email = normalize_email(email);
        let user = db::get_user_by_email(&self.conn, &email)?
            .ok_or_else(|| AppError::not_found("user", &email))?;
        if user.password != password {
            log::warn!("rejected login for {}", email);
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::InactiveUser(user.id));
        }
        Ok(UserView::from(user))
    }

    pub fn get_user(&self, id: &str) -> Result<UserView, AppError> {
        Ok(UserView::from(self.require_user(id)?))
    }

    pub fn list_users(&self) -> Result<Vec<UserView>, AppError> {
        Ok(db::list_users(&self.conn)?
            .into_iter()
            .map(UserView::from)
            .collect())
    }

    pub fn update_user(&self, id: &str, patch: UserPatch) -> Result<UserView, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field change".to_string(),
            ));
        }

        let mut user = self.require_user(id)?;
        if let Some(raw) = patch.name.as_deref() {
            user.name = non_empty(raw)
                .ok_or_else(|| AppError::InvalidArgument("name cannot be empty".to_string()))?;
        }
        if let Some(raw) = patch.email.as_deref() {
            let email = validated_email(raw)?;
            if let Some(other) = db::get_user_by_email(&self.conn, &email)? {
                if other.id != user.id {
                    return Err(AppError::Conflict(format!(
                        "email '{}' is already registered",
                        email
                    )));
                }
            }
            user.email = email;
        }
        if let Some(password) = patch.password {
            if password.is_empty() {
                return Err(AppError::InvalidArgument(
                    "password cannot be empty".to_string(),
                ));
            }
            user.password = password;
        }
        if let Some(raw) = patch.role.as_deref() {
            user.role = normalize_text(Some(raw), DEFAULT_ROLE);
        }
        if let Some(raw) = patch.major.as_deref() {
            user.major = raw.trim().to_string();
        }
        if let Some(raw) = patch.student_id.as_deref() {
            user.student_id = raw.trim().to_string();
        }
        if let Some(raw) = patch.profile_picture.as_deref() {
            user.profile_picture = raw.trim().to_string();
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }

        db::update_user(&self.conn, &user)?;
        Ok(UserView::from(user))
    }

    pub fn deactivate_user(&self, id: &str) -> Result<UserView, AppError> {
        self.update_user(
            id,
            UserPatch {
                is_active: Some(false),
                ..UserPatch::default()
            },
        )
    }

    pub fn delete_user(&self, id: &str) -> Result<(), AppError> {
        if db::delete_user(&self.conn, id)? == 0 {
            return Err(AppError::not_found("user", id));
        }
        log::info!("deleted user {}", id);
        Ok(())
    }

    /// Profile view of a user's graph. Edges whose other end no longer resolves
    /// to a user are left out.
    pub fn follow_summary(&self, id: &str) -> Result<FollowSummary, AppError> {
        let user = self.require_user(id)?;
        let followers = db::list_follows(&self.conn, id, FollowDirection::Followers)?
            .into_iter()
            .map(|edge| edge.follower_id);
        let following = db::list_follows(&self.conn, id, FollowDirection::Following)?
            .into_iter()
            .map(|edge| edge.followee_id);
        let pending = db::list_follow_requests(
            &self.conn,
            id,
            RequestDirection::Incoming,
            Some(InviteStatus::Pending.as_str()),
        )?
        .into_iter()
        .map(|request| request.requester_id);

        Ok(FollowSummary {
            user: UserView::from(user),
            followers: self.resolve_users(followers, "follower"),
            following: self.resolve_users(following, "followee"),
            pending: self.resolve_users(pending, "requester"),
        })
    }

    fn resolve_users(&self, ids: impl Iterator<Item = String>, role: &str) -> Vec<UserView> {
        let mut users = Vec::new();
        for id in ids {
            match db::get_user(&self.conn, &id) {
                Ok(Some(user)) => users.push(UserView::from(user)),
                Ok(None) => log::warn!("skipping {} {}: user not found", role, id),
                Err(err) => log::warn!("skipping {} {}: {}", role, id, err),
            }
        }
        users
    }

    fn require_user(&self, id: &str) -> Result<UserRecord, AppError> {
        db::get_user(&self.conn, id)?.ok_or_else(|| AppError::not_found("user", id))
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn validated_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if !looks_like_email(&email) {
        return Err(AppError::InvalidArgument(format!(
            "'{}' does not look like an email address",
            raw.trim()
        )));
    }
    Ok(email)
}

/// Canonicalizes an id argument, naming the field when it is malformed.
pub fn parse_id_arg(raw: &str, field: &str) -> Result<String, AppError> {
    ids::parse_id(raw)
        .ok_or_else(|| AppError::InvalidArgument(format!("{} '{}' is not a valid id", field, raw)))
}

impl From<UserRecord> for UserView {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            role: value.role,
            major: value.major,
            student_id: value.student_id,
            profile_picture: value.profile_picture,
            is_active: value.is_active,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Config(ConfigError),
    ParseStatus(ParseInviteStatusError),
    InvalidTransition(InvalidStatusTransition),
    InvalidArgument(String),
    InvalidCredentials,
    InactiveUser(String),
    NotFound { entity: &'static str, id: String },
    Conflict(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Db(err) => write!(f, "database error: {}", err),
            AppError::Config(err) => write!(f, "config error: {}", err),
            AppError::ParseStatus(err) => write!(f, "status parse error: {}", err),
            AppError::InvalidTransition(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::InvalidCredentials => write!(f, "wrong password"),
            AppError::InactiveUser(id) => write!(f, "user '{}' is deactivated", id),
            AppError::NotFound { entity, id } => write!(f, "{} '{}' not found", entity, id),
            AppError::Conflict(message) => write!(f, "conflict: {}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Db(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::ParseStatus(err) => Some(err),
            AppError::InvalidTransition(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::InvalidCredentials => None,
            AppError::InactiveUser(_) => None,
            AppError::NotFound { .. } => None,
            AppError::Conflict(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<ParseInviteStatusError> for AppError {
    fn from(value: ParseInviteStatusError) -> Self {
        AppError::ParseStatus(value)
    }
}

impl From<InvalidStatusTransition> for AppError {
    fn from(value: InvalidStatusTransition) -> Self {
        AppError::InvalidTransition(value)
    }
}

impl From<RecurrenceError> for AppError {
    fn from(value: RecurrenceError) -> Self {
        AppError::InvalidArgument(value.to_string())
    }
}

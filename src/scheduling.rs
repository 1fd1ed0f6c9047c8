//! Schedules, weekly recurrence, and participant invitations.

use std::str::FromStr;

use rusqlite::Connection;
use serde::Serialize;

use crate::app::{AppError, UserView};
use crate::db::{self, ParticipantFilter, ParticipantRecord, ScheduleRecord};
use crate::domain::recurrence::{
    expand_weekly, format_local_datetime, parse_local_datetime, parse_until_date,
    validate_window,
};
use crate::domain::status::{InvalidStatusTransition, InviteStatus};
use crate::domain::text::non_empty;
use crate::ids;

pub struct SchedulingService<'a> {
    conn: &'a Connection,
    max_occurrences: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NewSchedule {
    pub owner_id: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub color: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    /// Last date (inclusive) a weekly occurrence may start on.
    pub recurring_until: Option<String>,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
}

impl SchedulePatch {
    fn has_changes(&self) -> bool {
        self.start_time.is_some()
            || self.end_time.is_some()
            || self.title.is_some()
            || self.description.is_some()
            || self.location.is_some()
            || self.category.is_some()
            || self.color.is_some()
            || self.kind.is_some()
            || self.status.is_some()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduleView {
    pub id: String,
    pub owner_id: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParticipantView {
    pub id: String,
    pub schedule_id: String,
    pub user_id: String,
    pub status: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreatedSchedules {
    pub schedules: Vec<ScheduleView>,
    pub participants: Vec<ParticipantView>,
}

/// An invitation joined with the schedule it belongs to and the invited user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InvitationView {
    pub participant_id: String,
    pub status: String,
    pub schedule: ScheduleView,
    pub user: UserView,
}

impl<'a> SchedulingService<'a> {
    pub fn new(conn: &'a Connection, max_occurrences: usize) -> Self {
        Self {
            conn,
            max_occurrences,
        }
    }

    /// Creates one schedule row per weekly occurrence, plus one pending
    /// invitation per (occurrence, participant). Nothing is written unless
    /// every row succeeds.
    pub fn create_schedule(&self, input: NewSchedule) -> Result<CreatedSchedules, AppError> {
        let title = non_empty(&input.title)
            .ok_or_else(|| AppError::InvalidArgument("title cannot be empty".to_string()))?;
        let start = parse_local_datetime(&input.start_time)?;
        let end = parse_local_datetime(&input.end_time)?;
        let until = input
            .recurring_until
            .as_deref()
            .and_then(non_empty)
            .map(|raw| parse_until_date(&raw))
            .transpose()?;
        let occurrences = expand_weekly(start, end, until, self.max_occurrences)?;

        let mut participants: Vec<String> = Vec::new();
        for id in input.participants {
            if !participants.contains(&id) {
                participants.push(id);
            }
        }

        let tx = self.conn.unchecked_transaction()?;
        if !db::user_exists(&tx, &input.owner_id)? {
            return Err(AppError::not_found("user", &input.owner_id));
        }
        for user_id in &participants {
            if !db::user_exists(&tx, user_id)? {
                return Err(AppError::not_found("user", user_id));
            }
        }

        let created_at = db::now_utc_rfc3339();
        let mut created = CreatedSchedules {
            schedules: Vec::with_capacity(occurrences.len()),
            participants: Vec::with_capacity(occurrences.len() * participants.len()),
        };
        for occurrence in &occurrences {
            let schedule = ScheduleRecord {
                id: ids::new_id(),
                owner_id: input.owner_id.clone(),
                start_time: format_local_datetime(occurrence.start),
                end_time: format_local_datetime(occurrence.end),
                title: title.clone(),
                description: input.description.trim().to_string(),
                location: input.location.trim().to_string(),
                category: input.category.trim().to_string(),
                color: input.color.as_deref().and_then(non_empty),
                kind: input.kind.as_deref().and_then(non_empty),
                status: input.status.as_deref().and_then(non_empty),
                created_at: created_at.clone(),
            };
            db::insert_schedule(&tx, &schedule)?;

            for user_id in &participants {
                let participant = ParticipantRecord {
                    id: ids::new_id(),
                    schedule_id: schedule.id.clone(),
                    user_id: user_id.clone(),
                    status: InviteStatus::Pending.as_str().to_string(),
                    created_at: created_at.clone(),
                    updated_at: created_at.clone(),
                };
                db::insert_participant(&tx, &participant)?;
                created.participants.push(ParticipantView::from(participant));
            }
            created.schedules.push(ScheduleView::from(schedule));
        }
        tx.commit()?;
        log::debug!(
            "committed {} schedule row(s) and {} participant row(s)",
            created.schedules.len(),
            created.participants.len()
        );

        log::info!(
            "created {} occurrence(s) of '{}' for {} with {} invitation(s)",
            created.schedules.len(),
            title,
            input.owner_id,
            created.participants.len()
        );
        Ok(created)
    }

    pub fn get_schedule(&self, id: &str) -> Result<ScheduleView, AppError> {
        Ok(ScheduleView::from(self.require_schedule(id)?))
    }

    pub fn list_schedules(&self, owner_id: &str) -> Result<Vec<ScheduleView>, AppError> {
        Ok(db::list_schedules_by_owner(self.conn, owner_id)?
            .into_iter()
            .map(ScheduleView::from)
            .collect())
    }

    pub fn update_schedule(
        &self,
        id: &str,
        patch: SchedulePatch,
    ) -> Result<ScheduleView, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field change".to_string(),
            ));
        }

        let mut schedule = self.require_schedule(id)?;
        let start = match patch.start_time.as_deref() {
            Some(raw) => parse_local_datetime(raw)?,
            None => parse_local_datetime(&schedule.start_time)?,
        };
        let end = match patch.end_time.as_deref() {
            Some(raw) => parse_local_datetime(raw)?,
            None => parse_local_datetime(&schedule.end_time)?,
        };
        validate_window(start, end)?;
        schedule.start_time = format_local_datetime(start);
        schedule.end_time = format_local_datetime(end);

        if let Some(raw) = patch.title.as_deref() {
            schedule.title = non_empty(raw)
                .ok_or_else(|| AppError::InvalidArgument("title cannot be empty".to_string()))?;
        }
        if let Some(raw) = patch.description.as_deref() {
            schedule.description = raw.trim().to_string();
        }
        if let Some(raw) = patch.location.as_deref() {
            schedule.location = raw.trim().to_string();
        }
        if let Some(raw) = patch.category.as_deref() {
            schedule.category = raw.trim().to_string();
        }
        if let Some(raw) = patch.color.as_deref() {
            schedule.color = non_empty(raw);
        }
        if let Some(raw) = patch.kind.as_deref() {
            schedule.kind = non_empty(raw);
        }
        if let Some(raw) = patch.status.as_deref() {
            schedule.status = non_empty(raw);
        }

        db::update_schedule(self.conn, &schedule)?;
        Ok(ScheduleView::from(schedule))
    }

    /// Removes the schedule and its invitations together; returns how many
    /// invitations went with it.
    pub fn delete_schedule(&self, id: &str) -> Result<usize, AppError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed_participants = db::delete_participants_for_schedule(&tx, id)?;
        if db::delete_schedule(&tx, id)? == 0 {
            return Err(AppError::not_found("schedule", id));
        }
        tx.commit()?;
        log::debug!("committed cascade delete of schedule {}", id);
        log::info!(
            "deleted schedule {} and {} invitation(s)",
            id,
            removed_participants
        );
        Ok(removed_participants)
    }

    pub fn accept_invitation(&self, participant_id: &str) -> Result<ParticipantView, AppError> {
        self.resolve_invitation(participant_id, InviteStatus::Accepted)
    }

    pub fn reject_invitation(&self, participant_id: &str) -> Result<ParticipantView, AppError> {
        self.resolve_invitation(participant_id, InviteStatus::Rejected)
    }

    /// Every invitation addressed to `user_id`, any status.
    pub fn requests_for_user(&self, user_id: &str) -> Result<Vec<InvitationView>, AppError> {
        let rows = db::list_participants(self.conn, ParticipantFilter::User(user_id))?;
        Ok(self.join_invitations(rows))
    }

    pub fn requests_for_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Vec<InvitationView>, AppError> {
        let rows = db::list_participants(self.conn, ParticipantFilter::Schedule(schedule_id))?;
        Ok(self.join_invitations(rows))
    }

    pub fn accepted_for_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Vec<InvitationView>, AppError> {
        let rows = db::list_participants(
            self.conn,
            ParticipantFilter::ScheduleWithStatus(schedule_id, InviteStatus::Accepted.as_str()),
        )?;
        Ok(self.join_invitations(rows))
    }

    fn resolve_invitation(
        &self,
        participant_id: &str,
        next: InviteStatus,
    ) -> Result<ParticipantView, AppError> {
        let participant = db::get_participant(self.conn, participant_id)?
            .ok_or_else(|| AppError::not_found("invitation", participant_id))?;
        let current = InviteStatus::from_str(&participant.status)?;
        current.validate_transition(next)?;

        let updated_at = db::now_utc_rfc3339();
        let changed = db::set_participant_status(
            self.conn,
            participant_id,
            current.as_str(),
            next.as_str(),
            &updated_at,
        )?;
        if changed != 1 {
            return Err(AppError::InvalidTransition(InvalidStatusTransition {
                from: current,
                to: next,
            }));
        }

        log::info!(
            "invitation {} for schedule {} {}",
            participant_id,
            participant.schedule_id,
            next.as_str().to_ascii_lowercase()
        );
        Ok(ParticipantView {
            status: next.as_str().to_string(),
            updated_at,
            ..ParticipantView::from(participant)
        })
    }

    /// Rows whose schedule or user cannot be loaded are dropped from the
    /// result instead of failing the whole query.
    fn join_invitations(&self, rows: Vec<ParticipantRecord>) -> Vec<InvitationView> {
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let schedule = match db::get_schedule(self.conn, &row.schedule_id) {
                Ok(Some(schedule)) => schedule,
                Ok(None) => {
                    log::warn!(
                        "skipping invitation {}: schedule {} not found",
                        row.id,
                        row.schedule_id
                    );
                    continue;
                }
                Err(err) => {
                    log::warn!("skipping invitation {}: {}", row.id, err);
                    continue;
                }
            };
            let user = match db::get_user(self.conn, &row.user_id) {
                Ok(Some(user)) => user,
                Ok(None) => {
                    log::warn!(
                        "skipping invitation {}: user {} not found",
                        row.id,
                        row.user_id
                    );
                    continue;
                }
                Err(err) => {
                    log::warn!("skipping invitation {}: {}", row.id, err);
                    continue;
                }
            };
            result.push(InvitationView {
                participant_id: row.id,
                status: row.status,
                schedule: ScheduleView::from(schedule),
                user: UserView::from(user),
            });
        }
        result
    }

    fn require_schedule(&self, id: &str) -> Result<ScheduleRecord, AppError> {
        db::get_schedule(self.conn, id)?.ok_or_else(|| AppError::not_found("schedule", id))
    }
}

impl From<ScheduleRecord> for ScheduleView {
    fn from(value: ScheduleRecord) -> Self {
        Self {
            id: value.id,
            owner_id: value.owner_id,
            start_time: value.start_time,
            end_time: value.end_time,
            title: value.title,
            description: value.description,
            location: value.location,
            category: value.category,
            color: value.color,
            kind: value.kind,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

impl From<ParticipantRecord> for ParticipantView {
    fn from(value: ParticipantRecord) -> Self {
        Self {
            id: value.id,
            schedule_id: value.schedule_id,
            user_id: value.user_id,
            status: value.status,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
#[path = "scheduling_tests.rs"]
mod tests;

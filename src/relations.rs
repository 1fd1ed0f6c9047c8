//! Follow edges and the follow-request lifecycle.
//!
//! A request starts `Pending` and ends either `Accepted` (which also creates
//! the requester -> requestee follow edge) or `Rejected`. A pending request can
//! be withdrawn by its requester, which deletes the row.

use std::str::FromStr;

use rusqlite::Connection;
use serde::Serialize;

use crate::app::AppError;
use crate::db::{self, FollowDirection, FollowRecord, FollowRequestRecord, RequestDirection};
use crate::domain::status::{InvalidStatusTransition, InviteStatus};
use crate::ids;

pub struct RelationshipService<'a> {
    conn: &'a Connection,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FollowView {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FollowRequestView {
    pub id: String,
    pub requester_id: String,
    pub requestee_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl<'a> RelationshipService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Direct follow without a request.
    pub fn follow(&self, follower_id: &str, followee_id: &str) -> Result<FollowView, AppError> {
        let edge = create_follow(self.conn, follower_id, followee_id)?;
        log::info!("{} now follows {}", follower_id, followee_id);
        Ok(FollowView::from(edge))
    }

    pub fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<(), AppError> {
        if db::delete_follow(self.conn, follower_id, followee_id)? == 0 {
            return Err(AppError::not_found(
                "follow",
                &format!("{} -> {}", follower_id, followee_id),
            ));
        }
        log::info!("{} unfollowed {}", follower_id, followee_id);
        Ok(())
    }

    pub fn create_request(
        &self,
        requester_id: &str,
        requestee_id: &str,
    ) -> Result<FollowRequestView, AppError> {
        ensure_distinct_pair(requester_id, requestee_id)?;
        require_user(self.conn, requester_id)?;
        require_user(self.conn, requestee_id)?;
        if db::find_follow(self.conn, requester_id, requestee_id)?.is_some() {
            return Err(AppError::Conflict(format!(
                "{} already follows {}",
                requester_id, requestee_id
            )));
        }
        if let Some(existing) = db::find_pending_request(self.conn, requester_id, requestee_id)? {
            return Err(AppError::Conflict(format!(
                "follow request {} from {} to {} is already pending",
                existing.id, requester_id, requestee_id
            )));
        }

        let now = db::now_utc_rfc3339();
        let record = FollowRequestRecord {
            id: ids::new_id(),
            requester_id: requester_id.to_string(),
            requestee_id: requestee_id.to_string(),
            status: InviteStatus::Pending.as_str().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        db::insert_follow_request(self.conn, &record)?;
        log::info!(
            "follow request {} created: {} -> {}",
            record.id,
            requester_id,
            requestee_id
        );
        Ok(FollowRequestView::from(record))
    }

    /// Creates the follow edge and marks the request accepted, atomically.
    pub fn accept_request(&self, request_id: &str) -> Result<FollowView, AppError> {
        let tx = self.conn.unchecked_transaction()?;
        let request = db::get_follow_request(&tx, request_id)?
            .ok_or_else(|| AppError::not_found("follow request", request_id))?;
        let current = InviteStatus::from_str(&request.status)?;
        current.validate_transition(InviteStatus::Accepted)?;

        let edge = create_follow(&tx, &request.requester_id, &request.requestee_id)?;
        let changed = db::set_follow_request_status(
            &tx,
            request_id,
            current.as_str(),
            InviteStatus::Accepted.as_str(),
            &db::now_utc_rfc3339(),
        )?;
        if changed != 1 {
            return Err(AppError::InvalidTransition(InvalidStatusTransition {
                from: current,
                to: InviteStatus::Accepted,
            }));
        }
        tx.commit()?;
        log::debug!("committed follow edge {} for request {}", edge.id, request_id);

        log::info!(
            "follow request {} accepted: {} -> {}",
            request_id,
            request.requester_id,
            request.requestee_id
        );
        Ok(FollowView::from(edge))
    }

    pub fn reject_request(&self, request_id: &str) -> Result<FollowRequestView, AppError> {
        let request = db::get_follow_request(self.conn, request_id)?
            .ok_or_else(|| AppError::not_found("follow request", request_id))?;
        let current = InviteStatus::from_str(&request.status)?;
        current.validate_transition(InviteStatus::Rejected)?;

        let updated_at = db::now_utc_rfc3339();
        let changed = db::set_follow_request_status(
            self.conn,
            request_id,
            current.as_str(),
            InviteStatus::Rejected.as_str(),
            &updated_at,
        )?;
        if changed != 1 {
            return Err(AppError::InvalidTransition(InvalidStatusTransition {
                from: current,
                to: InviteStatus::Rejected,
            }));
        }

        log::info!("follow request {} rejected", request_id);
        Ok(FollowRequestView {
            status: InviteStatus::Rejected.as_str().to_string(),
            updated_at,
            ..FollowRequestView::from(request)
        })
    }

    /// Withdraws the pending request from `requester_id` to `requestee_id`.
    pub fn cancel_request(&self, requester_id: &str, requestee_id: &str) -> Result<(), AppError> {
        if db::delete_pending_requests(self.conn, requester_id, requestee_id)? == 0 {
            return Err(AppError::not_found(
                "pending follow request",
                &format!("{} -> {}", requester_id, requestee_id),
            ));
        }
        log::info!(
            "follow request cancelled: {} -> {}",
            requester_id,
            requestee_id
        );
        Ok(())
    }

    pub fn followers(&self, user_id: &str) -> Result<Vec<FollowView>, AppError> {
        self.edges(user_id, FollowDirection::Followers)
    }

    pub fn following(&self, user_id: &str) -> Result<Vec<FollowView>, AppError> {
        self.edges(user_id, FollowDirection::Following)
    }

    /// Pending requests waiting on `user_id` to answer.
    pub fn pending_requests(&self, user_id: &str) -> Result<Vec<FollowRequestView>, AppError> {
        let rows = db::list_follow_requests(
            self.conn,
            user_id,
            RequestDirection::Incoming,
            Some(InviteStatus::Pending.as_str()),
        )?;
        Ok(rows.into_iter().map(FollowRequestView::from).collect())
    }

    pub fn list_requests(
        &self,
        user_id: &str,
        direction: &str,
    ) -> Result<Vec<FollowRequestView>, AppError> {
        let direction = parse_request_direction(direction)?;
        let rows = db::list_follow_requests(self.conn, user_id, direction, None)?;
        Ok(rows.into_iter().map(FollowRequestView::from).collect())
    }

    fn edges(
        &self,
        user_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<FollowView>, AppError> {
        let rows = db::list_follows(self.conn, user_id, direction)?;
        Ok(rows.into_iter().map(FollowView::from).collect())
    }
}

fn create_follow(
    conn: &Connection,
    follower_id: &str,
    followee_id: &str,
) -> Result<FollowRecord, AppError> {
    ensure_distinct_pair(follower_id, followee_id)?;
    require_user(conn, follower_id)?;
    require_user(conn, followee_id)?;
    if db::find_follow(conn, follower_id, followee_id)?.is_some() {
        return Err(AppError::Conflict(format!(
            "{} already follows {}",
            follower_id, followee_id
        )));
    }

    let record = FollowRecord {
        id: ids::new_id(),
        follower_id: follower_id.to_string(),
        followee_id: followee_id.to_string(),
        created_at: db::now_utc_rfc3339(),
    };
    db::insert_follow(conn, &record)?;
    Ok(record)
}

fn ensure_distinct_pair(from: &str, to: &str) -> Result<(), AppError> {
    if from == to {
        return Err(AppError::InvalidArgument(
            "users cannot follow themselves".to_string(),
        ));
    }
    Ok(())
}

fn require_user(conn: &Connection, id: &str) -> Result<(), AppError> {
    if db::user_exists(conn, id)? {
        Ok(())
    } else {
        Err(AppError::not_found("user", id))
    }
}

fn parse_request_direction(raw: &str) -> Result<RequestDirection, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "incoming" | "in" | "received" => Ok(RequestDirection::Incoming),
        "outgoing" | "out" | "sent" => Ok(RequestDirection::Outgoing),
        _ => Err(AppError::InvalidArgument(format!(
            "unsupported request direction '{}'; use incoming|outgoing",
            raw
        ))),
    }
}

impl From<FollowRecord> for FollowView {
    fn from(value: FollowRecord) -> Self {
        Self {
            id: value.id,
            follower_id: value.follower_id,
            followee_id: value.followee_id,
            created_at: value.created_at,
        }
    }
}

impl From<FollowRequestRecord> for FollowRequestView {
    fn from(value: FollowRequestRecord) -> Self {
        Self {
            id: value.id,
            requester_id: value.requester_id,
            requestee_id: value.requestee_id,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
#[path = "relations_tests.rs"]
mod tests;

use rusqlite::{params, Connection, OptionalExtension, Result, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRecord {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRequestRecord {
    pub id: String,
    pub requester_id: String,
    pub requestee_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    /// Edges pointing at the user.
    Followers,
    /// Edges leaving the user.
    Following,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDirection {
    Incoming,
    Outgoing,
}

fn follow_from_row(row: &Row<'_>) -> Result<FollowRecord> {
    Ok(FollowRecord {
        id: row.get(0)?,
        follower_id: row.get(1)?,
        followee_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn request_from_row(row: &Row<'_>) -> Result<FollowRequestRecord> {
    Ok(FollowRequestRecord {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        requestee_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn insert_follow(conn: &Connection, follow: &FollowRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO follows (id, follower_id, followee_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            follow.id,
            follow.follower_id,
            follow.followee_id,
            follow.created_at
        ],
    )?;
    Ok(())
}

pub fn find_follow(
    conn: &Connection,
    follower_id: &str,
    followee_id: &str,
) -> Result<Option<FollowRecord>> {
    conn.query_row(
        r#"
SELECT id, follower_id, followee_id, created_at
FROM follows
WHERE follower_id = ?1 AND followee_id = ?2
"#,
        params![follower_id, followee_id],
        follow_from_row,
    )
    .optional()
}

pub fn delete_follow(conn: &Connection, follower_id: &str, followee_id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
        params![follower_id, followee_id],
    )
}

pub fn list_follows(
    conn: &Connection,
    user_id: &str,
    direction: FollowDirection,
) -> Result<Vec<FollowRecord>> {
    let sql = match direction {
        FollowDirection::Followers => concat!(
            "SELECT id, follower_id, followee_id, created_at FROM follows ",
            "WHERE followee_id = ?1 ORDER BY rowid"
        ),
        FollowDirection::Following => concat!(
            "SELECT id, follower_id, followee_id, created_at FROM follows ",
            "WHERE follower_id = ?1 ORDER BY rowid"
        ),
    };
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![user_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(follow_from_row(row)?);
    }
    Ok(result)
}

pub fn insert_follow_request(conn: &Connection, request: &FollowRequestRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO follow_requests (id, requester_id, requestee_id, status, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
        params![
            request.id,
            request.requester_id,
            request.requestee_id,
            request.status,
            request.created_at,
            request.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_follow_request(conn: &Connection, id: &str) -> Result<Option<FollowRequestRecord>> {
    conn.query_row(
        r#"
SELECT id, requester_id, requestee_id, status, created_at, updated_at
FROM follow_requests
WHERE id = ?1
"#,
        params![id],
        request_from_row,
    )
    .optional()
}

pub fn find_pending_request(
    conn: &Connection,
    requester_id: &str,
    requestee_id: &str,
) -> Result<Option<FollowRequestRecord>> {
    conn.query_row(
        r#"
SELECT id, requester_id, requestee_id, status, created_at, updated_at
FROM follow_requests
WHERE requester_id = ?1 AND requestee_id = ?2 AND status = 'Pending'
ORDER BY rowid
LIMIT 1
"#,
        params![requester_id, requestee_id],
        request_from_row,
    )
    .optional()
}

/// Moves a request to `status` only if it still holds `expected`.
pub fn set_follow_request_status(
    conn: &Connection,
    id: &str,
    expected: &str,
    status: &str,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE follow_requests SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        params![id, expected, status, updated_at],
    )
}

pub fn delete_pending_requests(
    conn: &Connection,
    requester_id: &str,
    requestee_id: &str,
) -> Result<usize> {
    conn.execute(
        r#"
DELETE FROM follow_requests
WHERE requester_id = ?1 AND requestee_id = ?2 AND status = 'Pending'
"#,
        params![requester_id, requestee_id],
    )
}

pub fn list_follow_requests(
    conn: &Connection,
    user_id: &str,
    direction: RequestDirection,
    status: Option<&str>,
) -> Result<Vec<FollowRequestRecord>> {
    let column = match direction {
        RequestDirection::Incoming => "requestee_id",
        RequestDirection::Outgoing => "requester_id",
    };
    let sql = format!(
        r#"
SELECT id, requester_id, requestee_id, status, created_at, updated_at
FROM follow_requests
WHERE {column} = ?1 AND (?2 IS NULL OR status = ?2)
ORDER BY rowid
"#
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![user_id, status])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(request_from_row(row)?);
    }
    Ok(result)
}

use rusqlite::{params, Connection, OptionalExtension, Result, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub id: String,
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
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub id: String,
    pub schedule_id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantFilter<'a> {
    User(&'a str),
    Schedule(&'a str),
    ScheduleWithStatus(&'a str, &'a str),
}

const SCHEDULE_COLUMNS: &str = concat!(
    "id, owner_id, start_time, end_time, title, description, location, ",
    "category, color, kind, status, created_at"
);

const PARTICIPANT_COLUMNS: &str = "id, schedule_id, user_id, status, created_at, updated_at";

fn schedule_from_row(row: &Row<'_>) -> Result<ScheduleRecord> {
    Ok(ScheduleRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        location: row.get(6)?,
        category: row.get(7)?,
        color: row.get(8)?,
        kind: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn participant_from_row(row: &Row<'_>) -> Result<ParticipantRecord> {
    Ok(ParticipantRecord {
        id: row.get(0)?,
        schedule_id: row.get(1)?,
        user_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn insert_schedule(conn: &Connection, schedule: &ScheduleRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO schedules ({SCHEDULE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            schedule.id,
            schedule.owner_id,
            schedule.start_time,
            schedule.end_time,
            schedule.title,
            schedule.description,
            schedule.location,
            schedule.category,
            schedule.color,
            schedule.kind,
            schedule.status,
            schedule.created_at
        ],
    )?;
    Ok(())
}

pub fn get_schedule(conn: &Connection, id: &str) -> Result<Option<ScheduleRecord>> {
    conn.query_row(
        &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"),
        params![id],
        schedule_from_row,
    )
    .optional()
}

pub fn list_schedules_by_owner(conn: &Connection, owner_id: &str) -> Result<Vec<ScheduleRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE owner_id = ?1 ORDER BY start_time, rowid"
    ))?;
    let mut rows = stmt.query(params![owner_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(schedule_from_row(row)?);
    }
    Ok(result)
}

pub fn update_schedule(conn: &Connection, schedule: &ScheduleRecord) -> Result<usize> {
    conn.execute(
        r#"
UPDATE schedules SET
    start_time = ?2,
    end_time = ?3,
    title = ?4,
    description = ?5,
    location = ?6,
    category = ?7,
    color = ?8,
    kind = ?9,
    status = ?10
WHERE id = ?1
"#,
        params![
            schedule.id,
            schedule.start_time,
            schedule.end_time,
            schedule.title,
            schedule.description,
            schedule.location,
            schedule.category,
            schedule.color,
            schedule.kind,
            schedule.status
        ],
    )
}

pub fn delete_schedule(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM schedules WHERE id = ?1", params![id])
}

pub fn insert_participant(conn: &Connection, participant: &ParticipantRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO schedule_participants ({PARTICIPANT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            participant.id,
            participant.schedule_id,
            participant.user_id,
            participant.status,
            participant.created_at,
            participant.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_participant(conn: &Connection, id: &str) -> Result<Option<ParticipantRecord>> {
    conn.query_row(
        &format!("SELECT {PARTICIPANT_COLUMNS} FROM schedule_participants WHERE id = ?1"),
        params![id],
        participant_from_row,
    )
    .optional()
}

/// Moves an invitation to `status` only if it still holds `expected`.
pub fn set_participant_status(
    conn: &Connection,
    id: &str,
    expected: &str,
    status: &str,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        concat!(
            "UPDATE schedule_participants SET status = ?3, updated_at = ?4 ",
            "WHERE id = ?1 AND status = ?2"
        ),
        params![id, expected, status, updated_at],
    )
}

pub fn delete_participants_for_schedule(conn: &Connection, schedule_id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM schedule_participants WHERE schedule_id = ?1",
        params![schedule_id],
    )
}

pub fn list_participants(
    conn: &Connection,
    filter: ParticipantFilter<'_>,
) -> Result<Vec<ParticipantRecord>> {
    let (clause, key, status) = match filter {
        ParticipantFilter::User(user_id) => ("user_id = ?1", user_id, None),
        ParticipantFilter::Schedule(schedule_id) => ("schedule_id = ?1", schedule_id, None),
        ParticipantFilter::ScheduleWithStatus(schedule_id, status) => {
            ("schedule_id = ?1", schedule_id, Some(status))
        }
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM schedule_participants \
         WHERE {clause} AND (?2 IS NULL OR status = ?2) ORDER BY rowid"
    ))?;
    let mut rows = stmt.query(params![key, status])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(participant_from_row(row)?);
    }
    Ok(result)
}

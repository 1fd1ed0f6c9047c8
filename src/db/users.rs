use rusqlite::{params, Connection, OptionalExtension, Result, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub major: String,
    pub student_id: String,
    pub profile_picture: String,
    pub is_active: bool,
    pub created_at: String,
}

const USER_COLUMNS: &str = concat!(
    "id, name, email, password, role, major, student_id, ",
    "profile_picture, is_active, created_at"
);

fn user_from_row(row: &Row<'_>) -> Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        major: row.get(5)?,
        student_id: row.get(6)?,
        profile_picture: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub fn insert_user(conn: &Connection, user: &UserRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO users (
    id, name, email, password, role, major, student_id,
    profile_picture, is_active, created_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#,
        params![
            user.id,
            user.name,
            user.email,
            user.password,
            user.role,
            user.major,
            user.student_id,
            user.profile_picture,
            user.is_active,
            user.created_at
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<UserRecord>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRecord>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        user_from_row,
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY name ASC, id ASC"
    ))?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.collect()
}

/// Overwrites every mutable column; returns the number of rows touched.
pub fn update_user(conn: &Connection, user: &UserRecord) -> Result<usize> {
    conn.execute(
        r#"
UPDATE users SET
    name = ?2,
    email = ?3,
    password = ?4,
    role = ?5,
    major = ?6,
    student_id = ?7,
    profile_picture = ?8,
    is_active = ?9
WHERE id = ?1
"#,
        params![
            user.id,
            user.name,
            user.email,
            user.password,
            user.role,
            user.major,
            user.student_id,
            user.profile_picture,
            user.is_active
        ],
    )
}

pub fn delete_user(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM users WHERE id = ?1", params![id])
}

pub fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

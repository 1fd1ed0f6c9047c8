pub mod recurrence;
pub mod status;
pub mod text;

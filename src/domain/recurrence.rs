use std::error::Error;
use std::fmt;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime};

/// Wall-clock timestamp layout for schedule start/end, e.g. `2024-01-01T10:00:00`.
pub const LOCAL_DATETIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
pub const LOCAL_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub const DEFAULT_MAX_OCCURRENCES: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

pub fn parse_local_datetime(raw: &str) -> Result<PrimitiveDateTime, RecurrenceError> {
    PrimitiveDateTime::parse(raw.trim(), LOCAL_DATETIME)
        .map_err(|_| RecurrenceError::InvalidTimestamp(raw.to_string()))
}

pub fn format_local_datetime(value: PrimitiveDateTime) -> String {
    value
        .format(LOCAL_DATETIME)
        .expect("local datetime formatting should never fail")
}

/// Accepts either a bare date or a full local timestamp; only the date part is kept.
pub fn parse_until_date(raw: &str) -> Result<Date, RecurrenceError> {
    let trimmed = raw.trim();
    if let Ok(date) = Date::parse(trimmed, LOCAL_DATE) {
        return Ok(date);
    }
    parse_local_datetime(trimmed)
        .map(|value| value.date())
        .map_err(|_| RecurrenceError::InvalidTimestamp(raw.to_string()))
}

pub fn validate_window(
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
) -> Result<(), RecurrenceError> {
    if start >= end {
        return Err(RecurrenceError::EndNotAfterStart {
            start: format_local_datetime(start),
            end: format_local_datetime(end),
        });
    }
    Ok(())
}

/// Expands one schedule window into weekly occurrences.
///
/// Without `until` the window itself is the only occurrence. With `until`, one
/// occurrence is produced per 7-day step whose start date is on or before
/// `until`. Every occurrence keeps the time of day and the duration of the
/// first one.
pub fn expand_weekly(
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
    until: Option<Date>,
    max_occurrences: usize,
) -> Result<Vec<Occurrence>, RecurrenceError> {
    validate_window(start, end)?;
    let Some(until) = until else {
        return Ok(vec![Occurrence { start, end }]);
    };
    if until < start.date() {
        return Err(RecurrenceError::UntilBeforeStart {
            start: format_local_datetime(start),
            until: until.to_string(),
        });
    }

    let duration = end - start;
    let mut occurrences = Vec::new();
    let mut current = start;
    while current.date() <= until {
        if occurrences.len() == max_occurrences {
            return Err(RecurrenceError::TooManyOccurrences {
                limit: max_occurrences,
            });
        }
        let occurrence_end = current
            .checked_add(duration)
            .ok_or_else(|| RecurrenceError::OutOfRange {
                start: format_local_datetime(current),
            })?;
        occurrences.push(Occurrence {
            start: current,
            end: occurrence_end,
        });
        current = match current.checked_add(Duration::weeks(1)) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(occurrences)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    InvalidTimestamp(String),
    EndNotAfterStart { start: String, end: String },
    UntilBeforeStart { start: String, until: String },
    TooManyOccurrences { limit: usize },
    OutOfRange { start: String },
}

impl fmt::Display for RecurrenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceError::InvalidTimestamp(value) => write!(
                f,
                "invalid timestamp '{}': expected YYYY-MM-DDTHH:MM:SS",
                value
            ),
            RecurrenceError::EndNotAfterStart { start, end } => {
                write!(f, "schedule end {} must be after start {}", end, start)
            }
            RecurrenceError::UntilBeforeStart { start, until } => write!(
                f,
                "recurring until {} precedes schedule start {}",
                until, start
            ),
            RecurrenceError::TooManyOccurrences { limit } => write!(
                f,
                "recurrence would create more than {} occurrences",
                limit
            ),
            RecurrenceError::OutOfRange { start } => write!(
                f,
                "occurrence starting {} ends past the last supported date",
                start
            ),
        }
    }
}

impl Error for RecurrenceError {}

#[cfg(test)]
mod tests {
    use super::{
        expand_weekly, format_local_datetime, parse_local_datetime, parse_until_date,
        RecurrenceError, DEFAULT_MAX_OCCURRENCES,
    };
    use time::Duration;

    #[test]
    fn weekly_expansion_includes_the_until_date() {
        let start = parse_local_datetime("2024-01-01T10:00:00").unwrap();
        let end = parse_local_datetime("2024-01-01T11:00:00").unwrap();
        let until = parse_until_date("2024-01-15").unwrap();

        let occurrences =
            expand_weekly(start, end, Some(until), DEFAULT_MAX_OCCURRENCES).unwrap();
        let starts = occurrences
            .iter()
            .map(|occurrence| format_local_datetime(occurrence.start))
            .collect::<Vec<_>>();
        assert_eq!(
            starts,
            vec![
                "2024-01-01T10:00:00",
                "2024-01-08T10:00:00",
                "2024-01-15T10:00:00"
            ]
        );
        for occurrence in &occurrences {
            assert_eq!(occurrence.end - occurrence.start, Duration::hours(1));
        }
    }

    #[test]
    fn until_between_steps_stops_at_last_fitting_week() {
        let start = parse_local_datetime("2024-01-01T22:30:00").unwrap();
        let end = parse_local_datetime("2024-01-02T01:00:00").unwrap();
        let until = parse_until_date("2024-01-14").unwrap();

        let occurrences =
            expand_weekly(start, end, Some(until), DEFAULT_MAX_OCCURRENCES).unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(
            format_local_datetime(occurrences[1].end),
            "2024-01-09T01:00:00"
        );
    }

    #[test]
    fn no_until_yields_single_occurrence() {
        let start = parse_local_datetime("2024-03-05T09:00:00").unwrap();
        let end = parse_local_datetime("2024-03-05T09:45:00").unwrap();
        let occurrences = expand_weekly(start, end, None, DEFAULT_MAX_OCCURRENCES).unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].start, start);
    }

    #[test]
    fn rejects_empty_or_inverted_window() {
        let start = parse_local_datetime("2024-01-01T10:00:00").unwrap();
        let same = expand_weekly(start, start, None, DEFAULT_MAX_OCCURRENCES);
        assert!(matches!(
            same,
            Err(RecurrenceError::EndNotAfterStart { .. })
        ));

        let earlier = parse_local_datetime("2024-01-01T09:00:00").unwrap();
        let inverted = expand_weekly(start, earlier, None, DEFAULT_MAX_OCCURRENCES);
        assert!(matches!(
            inverted,
            Err(RecurrenceError::EndNotAfterStart { .. })
        ));
    }

    #[test]
    fn rejects_until_before_start_date() {
        let start = parse_local_datetime("2024-01-10T10:00:00").unwrap();
        let end = parse_local_datetime("2024-01-10T11:00:00").unwrap();
        let until = parse_until_date("2024-01-09").unwrap();
        let result = expand_weekly(start, end, Some(until), DEFAULT_MAX_OCCURRENCES);
        assert!(matches!(
            result,
            Err(RecurrenceError::UntilBeforeStart { .. })
        ));
    }

    #[test]
    fn until_on_start_date_yields_single_occurrence() {
        let start = parse_local_datetime("2024-01-10T10:00:00").unwrap();
        let end = parse_local_datetime("2024-01-10T11:00:00").unwrap();
        let until = parse_until_date("2024-01-10").unwrap();
        let occurrences =
            expand_weekly(start, end, Some(until), DEFAULT_MAX_OCCURRENCES).unwrap();
        assert_eq!(occurrences.len(), 1);
    }

    #[test]
    fn caps_runaway_recurrences() {
        let start = parse_local_datetime("2024-01-01T10:00:00").unwrap();
        let end = parse_local_datetime("2024-01-01T11:00:00").unwrap();
        let until = parse_until_date("2024-12-31").unwrap();
        let result = expand_weekly(start, end, Some(until), 4);
        assert_eq!(result, Err(RecurrenceError::TooManyOccurrences { limit: 4 }));
    }

    #[test]
    fn parses_until_from_full_timestamp() {
        let until = parse_until_date("2024-01-15T23:59:59").unwrap();
        assert_eq!(until.to_string(), "2024-01-15");
        assert!(parse_until_date("next tuesday").is_err());
    }

    #[test]
    fn rejects_timestamps_outside_local_layout() {
        let err = parse_local_datetime("2024-01-01 10:00").expect_err("layout mismatch");
        assert!(err.to_string().contains("YYYY-MM-DDTHH:MM:SS"));
    }

    #[test]
    fn occurrence_ending_past_supported_range_is_an_error() {
        let start = parse_local_datetime("9999-12-24T10:00:00").unwrap();
        let end = parse_local_datetime("9999-12-31T12:00:00").unwrap();
        let until = parse_until_date("9999-12-31").unwrap();

        let result = expand_weekly(start, end, Some(until), DEFAULT_MAX_OCCURRENCES);
        assert_eq!(
            result,
            Err(RecurrenceError::OutOfRange {
                start: "9999-12-31T10:00:00".to_string()
            })
        );
    }
}

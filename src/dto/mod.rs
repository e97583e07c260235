use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod common;
pub mod health;
pub mod phase;
pub mod public;
pub mod validation;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// HH:MM:SS rendering of an elapsed duration in whole seconds.
///
/// Hours are not capped at 24; a long race simply shows a large hour field.
pub(crate) fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hms_pads_each_field() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(62), "00:01:02");
        assert_eq!(format_hms(3 * 3600 + 25 * 60 + 5), "03:25:05");
    }

    #[test]
    fn format_hms_does_not_wrap_hours() {
        assert_eq!(format_hms(25 * 3600), "25:00:00");
    }
}

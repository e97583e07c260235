//! CSV rendering of the ranked standings.
//!
//! The export is the one durable artifact a race produces, so it is kept
//! strictly deterministic: same records in, same bytes out. Fields containing
//! a comma, quote or newline are quoted RFC 4180 style; everything else is
//! emitted bare.

use std::time::SystemTime;

use time::OffsetDateTime;

use crate::{
    dao::models::SubmissionEntity,
    dto::{format_hms, format_system_time},
};

/// Column headers, in the exact order row fields are emitted.
const HEADERS: [&str; 11] = [
    "Rank",
    "Participant Name",
    "Email",
    "Participant ID",
    "Competition Time (seconds)",
    "Formatted Time",
    "Submitted Mass (g)",
    "File Name",
    "File Size (MB)",
    "Submission Time",
    "Material Used",
];

/// Render the ranked submissions as a CSV document, header row included.
pub fn csv_document(ranked: &[&SubmissionEntity], material: &str) -> String {
    let mut lines = Vec::with_capacity(ranked.len() + 1);
    lines.push(HEADERS.join(","));

    for (index, submission) in ranked.iter().enumerate() {
        let row = [
            (index + 1).to_string(),
            csv_field(&submission.name),
            csv_field(&submission.email),
            csv_field(&submission.participant_id),
            submission.elapsed_seconds.to_string(),
            format_hms(submission.elapsed_seconds),
            format!("{:.3}", submission.mass_grams),
            csv_field(&submission.file_name),
            format!(
                "{:.2}",
                submission.file_size_bytes as f64 / (1024.0 * 1024.0)
            ),
            csv_field(&format_system_time(submission.submitted_at)),
            csv_field(material),
        ];
        lines.push(row.join(","));
    }

    let mut document = lines.join("\n");
    document.push('\n');
    document
}

/// Dated download name, e.g. `speedmodelling_results_2024-11-02.csv`.
pub fn export_file_name(now: SystemTime) -> String {
    let date = OffsetDateTime::from(now).date();
    format!(
        "speedmodelling_results_{:04}-{:02}-{:02}.csv",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn csv_field(raw: &str) -> String {
    if raw.chars().any(|c| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::registry::SubmissionRegistry;

    fn instant(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn submission(email: &str, name: &str, submitted_secs: u64) -> SubmissionEntity {
        SubmissionEntity {
            participant_id: format!("{}_123456", &email[..3]),
            name: name.into(),
            email: email.into(),
            file_name: "part.step".into(),
            file_size_bytes: 2 * 1024 * 1024,
            mass_grams: 120.5,
            race_started_at: instant(100),
            submitted_at: instant(submitted_secs),
            elapsed_seconds: submitted_secs - 100,
        }
    }

    #[test]
    fn header_row_lists_all_eleven_columns() {
        let document = csv_document(&[], "Steel");
        let header = document.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 11);
        assert!(header.starts_with("Rank,Participant Name,Email"));
        assert!(header.ends_with("Submission Time,Material Used"));
    }

    #[test]
    fn rows_follow_rank_order() {
        let mut registry = SubmissionRegistry::new();
        registry.record(submission("bob@example.com", "Bob", 300));
        registry.record(submission("alice@example.com", "Alice", 200));

        let ranked = registry.ranked();
        let document = csv_document(&ranked, "Steel");
        let lines: Vec<&str> = document.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,Alice,alice@example.com"));
        assert!(lines[2].starts_with("2,Bob,bob@example.com"));
        assert!(lines[1].ends_with(",Steel"));
        assert!(lines[1].contains(",00:01:40,"));
        assert!(lines[1].contains(",120.500,"));
        assert!(lines[1].contains(",2.00,"));
    }

    #[test]
    fn exporting_twice_yields_identical_bytes() {
        let mut registry = SubmissionRegistry::new();
        registry.record(submission("alice@example.com", "Alice", 200));
        registry.record(submission("bob@example.com", "Bob", 300));

        let ranked = registry.ranked();
        let first = csv_document(&ranked, "Aluminum");
        let second = csv_document(&registry.ranked(), "Aluminum");
        assert_eq!(first, second);
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        let mut one = submission("alice@example.com", "Doe, Jane", 200);
        one.file_name = "my \"final\" part.step".into();

        let document = csv_document(&[&one], "Steel");
        let row = document.lines().nth(1).unwrap();
        assert!(row.contains("\"Doe, Jane\""));
        assert!(row.contains("\"my \"\"final\"\" part.step\""));
    }

    #[test]
    fn file_name_carries_the_export_date() {
        // 2024-11-02 12:00:00 UTC
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_730_548_800);
        assert_eq!(
            export_file_name(now),
            "speedmodelling_results_2024-11-02.csv"
        );
    }
}

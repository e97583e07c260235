//! Roster and submission registries over the shared list records.
//!
//! Both registries key by email and are rebuilt from the stored lists on
//! every operation; nothing here caches across calls. The two upsert rules
//! differ on purpose: re-registering keeps the roster position, resubmitting
//! moves the entry to the tail so its rank derives from the new instant.

use std::time::{Duration, SystemTime};

use indexmap::IndexMap;

use crate::dao::models::{ParticipantEntity, SubmissionEntity};

/// Derive the public participant identifier for `email` at `registered_at`.
///
/// First three characters of the email plus the trailing six digits of the
/// registration instant in epoch milliseconds. Readable enough for a results
/// sheet without pretending to be a global ID.
pub fn derive_participant_id(email: &str, registered_at: SystemTime) -> String {
    let millis = registered_at
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis();
    let prefix: String = email.chars().take(3).collect();
    format!("{prefix}_{:06}", millis % 1_000_000)
}

/// Participant roster keyed by email, preserving first-registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    entries: IndexMap<String, ParticipantEntity>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the stored record; on duplicate emails the last entry wins.
    pub fn from_entries(entries: Vec<ParticipantEntity>) -> Self {
        let mut roster = Self::new();
        for entry in entries {
            roster.entries.insert(entry.email.clone(), entry);
        }
        roster
    }

    /// Insert or replace the entry for `participant.email` in place.
    ///
    /// A replaced entry keeps its roster position; the count never grows for
    /// a known email. Returns `true` when an existing entry was replaced.
    pub fn register(&mut self, participant: ParticipantEntity) -> bool {
        self.entries
            .insert(participant.email.clone(), participant)
            .is_some()
    }

    /// Entry registered under `email`, if any.
    pub fn get(&self, email: &str) -> Option<&ParticipantEntity> {
        self.entries.get(email)
    }

    /// Whether `email` is registered.
    pub fn contains(&self, email: &str) -> bool {
        self.entries.contains_key(email)
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ParticipantEntity> {
        self.entries.values()
    }

    /// Serialize back to the stored record shape.
    pub fn into_entries(self) -> Vec<ParticipantEntity> {
        self.entries.into_values().collect()
    }
}

/// Submission registry keyed by email: at most one live entry per racer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionRegistry {
    entries: IndexMap<String, SubmissionEntity>,
}

impl SubmissionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the stored record; on duplicate emails the last entry wins.
    pub fn from_entries(entries: Vec<SubmissionEntity>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.record(entry);
        }
        registry
    }

    /// Record a submission, dropping any prior entry for the same email.
    ///
    /// The new entry always lands at the tail, so a resubmission is ranked by
    /// its new instant and loses its old tie-break position. Returns `true`
    /// when a prior entry was replaced.
    pub fn record(&mut self, submission: SubmissionEntity) -> bool {
        let replaced = self.entries.shift_remove(&submission.email).is_some();
        self.entries.insert(submission.email.clone(), submission);
        replaced
    }

    /// Live submission for `email`, if any.
    pub fn get(&self, email: &str) -> Option<&SubmissionEntity> {
        self.entries.get(email)
    }

    /// Number of live submissions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no submission has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in recording order (resubmissions at the tail).
    pub fn iter(&self) -> impl Iterator<Item = &SubmissionEntity> {
        self.entries.values()
    }

    /// Submissions ordered by ascending submission instant.
    ///
    /// The sort is stable, so entries sharing an instant keep their recording
    /// order. This ordering is the single source for ranks, standings and the
    /// CSV export.
    pub fn ranked(&self) -> Vec<&SubmissionEntity> {
        let mut ranked: Vec<&SubmissionEntity> = self.entries.values().collect();
        ranked.sort_by_key(|submission| submission.submitted_at);
        ranked
    }

    /// 1-based rank of `email` in the current ordering, if submitted.
    pub fn rank_of(&self, email: &str) -> Option<usize> {
        self.ranked()
            .iter()
            .position(|submission| submission.email == email)
            .map(|index| index + 1)
    }

    /// Serialize back to the stored record shape.
    pub fn into_entries(self) -> Vec<SubmissionEntity> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn participant(email: &str, name: &str, registered_secs: u64) -> ParticipantEntity {
        let registered_at = instant(registered_secs);
        ParticipantEntity {
            participant_id: derive_participant_id(email, registered_at),
            name: name.into(),
            email: email.into(),
            registered_at,
        }
    }

    fn submission(email: &str, submitted_secs: u64) -> SubmissionEntity {
        SubmissionEntity {
            participant_id: derive_participant_id(email, instant(1)),
            name: email.split('@').next().unwrap_or(email).into(),
            email: email.into(),
            file_name: "part.step".into(),
            file_size_bytes: 4096,
            mass_grams: 120.5,
            race_started_at: instant(100),
            submitted_at: instant(submitted_secs),
            elapsed_seconds: submitted_secs.saturating_sub(100),
        }
    }

    #[test]
    fn participant_id_has_prefix_and_six_digits() {
        let id = derive_participant_id(
            "alice@example.com",
            SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_123_456),
        );
        assert_eq!(id, "ali_123456");
    }

    #[test]
    fn participant_id_zero_pads_short_suffixes() {
        let id = derive_participant_id(
            "bob@example.com",
            SystemTime::UNIX_EPOCH + Duration::from_millis(2_000_000_000_042),
        );
        assert_eq!(id, "bob_000042");
    }

    #[test]
    fn reregistration_replaces_in_place() {
        let mut roster = Roster::new();
        roster.register(participant("a@example.com", "Alice", 10));
        roster.register(participant("b@example.com", "Bob", 20));

        let replaced = roster.register(participant("a@example.com", "Alice Updated", 30));
        assert!(replaced);
        assert_eq!(roster.len(), 2);

        let order: Vec<&str> = roster.iter().map(|entry| entry.email.as_str()).collect();
        assert_eq!(order, ["a@example.com", "b@example.com"]);
        assert_eq!(roster.get("a@example.com").unwrap().name, "Alice Updated");
        assert_eq!(
            roster.get("a@example.com").unwrap().registered_at,
            instant(30)
        );
    }

    #[test]
    fn roster_rebuild_deduplicates_by_email() {
        let roster = Roster::from_entries(vec![
            participant("a@example.com", "Alice", 10),
            participant("a@example.com", "Alice Again", 20),
        ]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("a@example.com").unwrap().name, "Alice Again");
    }

    #[test]
    fn resubmission_keeps_one_entry_and_moves_to_tail() {
        let mut registry = SubmissionRegistry::new();
        registry.record(submission("a@example.com", 200));
        registry.record(submission("b@example.com", 300));

        let replaced = registry.record(submission("a@example.com", 400));
        assert!(replaced);
        assert_eq!(registry.len(), 2);

        let order: Vec<&str> = registry.iter().map(|entry| entry.email.as_str()).collect();
        assert_eq!(order, ["b@example.com", "a@example.com"]);
        assert_eq!(
            registry.get("a@example.com").unwrap().submitted_at,
            instant(400)
        );
    }

    #[test]
    fn ranking_sorts_by_submission_instant() {
        let mut registry = SubmissionRegistry::new();
        registry.record(submission("late@example.com", 500));
        registry.record(submission("early@example.com", 200));
        registry.record(submission("middle@example.com", 350));

        let ranked: Vec<&str> = registry
            .ranked()
            .iter()
            .map(|entry| entry.email.as_str())
            .collect();
        assert_eq!(
            ranked,
            ["early@example.com", "middle@example.com", "late@example.com"]
        );
        assert_eq!(registry.rank_of("early@example.com"), Some(1));
        assert_eq!(registry.rank_of("late@example.com"), Some(3));
        assert_eq!(registry.rank_of("absent@example.com"), None);
    }

    #[test]
    fn ties_keep_recording_order() {
        let mut registry = SubmissionRegistry::new();
        registry.record(submission("first@example.com", 300));
        registry.record(submission("second@example.com", 300));

        let ranked: Vec<&str> = registry
            .ranked()
            .iter()
            .map(|entry| entry.email.as_str())
            .collect();
        assert_eq!(ranked, ["first@example.com", "second@example.com"]);
    }

    #[test]
    fn resubmission_rerank_reflects_new_instant() {
        let mut registry = SubmissionRegistry::new();
        registry.record(submission("a@example.com", 200));
        registry.record(submission("b@example.com", 300));
        assert_eq!(registry.rank_of("a@example.com"), Some(1));

        registry.record(submission("a@example.com", 400));
        assert_eq!(registry.rank_of("b@example.com"), Some(1));
        assert_eq!(registry.rank_of("a@example.com"), Some(2));
    }
}

/// Coordinator service for competition lifecycle operations.
pub mod admin_service;
/// CSV rendering of the ranked standings.
pub mod export;
/// Health check service.
pub mod health_service;
/// Read-side projection over the shared records.
pub mod leaderboard;
/// Racer-facing service for registration, polling and submissions.
pub mod participant_service;

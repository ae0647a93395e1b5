//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by identity user ID)
    pub const PROFILES: &str = "profiles";
    /// Gym membership records (`user_id` field)
    pub const MEMBERS: &str = "members";
    /// Class/session bookings made by a member (`user_id` field)
    pub const SESSION_BOOKINGS: &str = "session_bookings";
    /// Sessions run by a trainer (`trainer_id` field)
    pub const TRAINER_SESSIONS: &str = "trainer_sessions";
    /// Membership payments (`user_id` field)
    pub const PAYMENTS: &str = "payments";
    /// In-app notifications (`user_id` field)
    pub const NOTIFICATIONS: &str = "notifications";
    /// Append-only audit trail (`user_id` field)
    pub const ACTIVITY_LOGS: &str = "activity_logs";
}

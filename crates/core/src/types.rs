/// Opaque session identifier assigned by the job runner at acceptance time.
pub type SessionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

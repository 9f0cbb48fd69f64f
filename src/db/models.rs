// Database model structs

use chrono::{DateTime, Utc};

/// One row of the append-only quiz audit log. Written once per successful
/// generation.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizLogRecord {
    pub topic: String,
    pub num_questions: i32,
    pub custom_instructions: String,
    pub latency_ms: i64,
    pub created_at: DateTime<Utc>,
}

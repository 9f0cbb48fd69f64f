pub const GENERATE_URL: &str = "/generate";
pub const SELECT_ANSWER_URL: &str = "/select-answer";
pub const SUBMIT_QUIZ_URL: &str = "/submit-quiz";
pub const RESET_URL: &str = "/reset";

pub const QUIZ_SESSION_COOKIE_NAME: &str = "quiz_session";

// Quiz request limits. The form accepts up to MAX_QUESTION_COUNT, but the
// provider is never asked for more than PROVIDER_QUESTION_CAP in one call.
pub const MIN_QUESTION_COUNT: u32 = 1;
pub const MAX_QUESTION_COUNT: u32 = 50;
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const PROVIDER_QUESTION_CAP: u32 = 8;

pub const DEFAULT_TOPIC: &str = "Psychology";
pub const DEFAULT_INSTRUCTIONS: &str = "Classical Conditioning";

/// The "no selection yet" value a question's answer control starts on.
pub const ANSWER_PLACEHOLDER: &str = "Select an option...";

// Quiz log retry policy
pub const LOG_RETRY_ATTEMPTS: usize = 3;
pub const LOG_RETRY_PAUSE_MS: u64 = 1_000;

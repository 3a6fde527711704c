pub const LOG_FILE_PATH: &str = "/tmp/research-chat.log";

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Thinking is disabled by default for lower latency.
pub const DEFAULT_THINKING_BUDGET: i32 = 0;

/// Environment variables consulted, in order, when the configuration
/// carries no API key.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_SQLITE_FILE: &str = "research-chat.db";

use super::constants::*;

pub(crate) fn log_level() -> Option<String> {
    Some("info".to_string())
}

pub(crate) fn log_file_path() -> String {
    LOG_FILE_PATH.to_string()
}

pub(crate) fn endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

pub(crate) fn model() -> String {
    DEFAULT_MODEL.to_string()
}

pub(crate) fn thinking_budget() -> Option<i32> {
    Some(DEFAULT_THINKING_BUDGET)
}

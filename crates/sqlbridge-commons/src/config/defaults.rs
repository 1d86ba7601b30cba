// Default value functions

pub fn default_retry_attempts() -> u32 {
    0 // Execute exactly once
}

pub fn default_preview_capacity() -> usize {
    100
}

pub fn default_max_rows_in_memory() -> usize {
    1000
}

pub fn default_max_parse_buffer_bytes() -> usize {
    16 * 1024 * 1024 // 16MB
}

pub fn default_true() -> bool {
    true
}

pub fn default_delimiter() -> String {
    ",".to_string()
}

pub fn default_poll_base_interval_ms() -> u64 {
    50
}

pub fn default_poll_max_interval_ms() -> u64 {
    5000
}

pub fn default_connection_timeout_secs() -> u64 {
    10
}

pub fn default_request_timeout_secs() -> u64 {
    300
}

pub fn default_user_agent() -> String {
    format!("sqlbridge/{}", env!("CARGO_PKG_VERSION"))
}

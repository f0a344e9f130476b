use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub backend_base_url: String,
    pub ask_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub speech_timeout_secs: u64,
    pub selection_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_port: parse_var("SERVER_PORT", 8080),
            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            ask_timeout_secs: parse_var("ASK_TIMEOUT_SECS", 45),
            health_timeout_secs: parse_var("HEALTH_TIMEOUT_SECS", 5),
            speech_timeout_secs: parse_var("SPEECH_TIMEOUT_SECS", 15),
            selection_ttl_minutes: parse_var("SELECTION_TTL_MINUTES", 30),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

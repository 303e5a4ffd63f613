/// Application configuration loaded explicitly from environment variables.
///
/// The model credential lives in `GeminiConfig` (`GEMINI_API_KEY`); this
/// only carries the app-level knobs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables
    /// the result cache; every analysis recomputes.
    pub redis_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL").ok(),
        }
    }
}

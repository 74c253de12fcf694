use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://api.medmatch.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub use_mock_catalog: bool,
    pub mock_latency_ms: u64,
    pub fetch_timeout_secs: u64,
    pub results_ceiling: usize,
    pub total_pages: u32,
    pub bind_addr: String,
    pub session_idle_secs: u64,
    pub session_sweep_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            use_mock_catalog: true,
            mock_latency_ms: 1000,
            fetch_timeout_secs: 30,
            results_ceiling: 20,
            total_pages: 3,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_idle_secs: 1800,
            session_sweep_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: env::var("MEDMATCH_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("MEDMATCH_API_BASE_URL not set, using default");
                    defaults.api_base_url.clone()
                }),
            use_mock_catalog: parse_var("MEDMATCH_USE_MOCK_CATALOG", defaults.use_mock_catalog),
            mock_latency_ms: parse_var("MEDMATCH_MOCK_LATENCY_MS", defaults.mock_latency_ms),
            fetch_timeout_secs: parse_var("MEDMATCH_FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            results_ceiling: parse_var("MEDMATCH_RESULTS_CEILING", defaults.results_ceiling),
            total_pages: parse_var("MEDMATCH_TOTAL_PAGES", defaults.total_pages),
            bind_addr: env::var("MEDMATCH_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("MEDMATCH_BIND_ADDR not set, using default");
                    defaults.bind_addr.clone()
                }),
            session_idle_secs: parse_var("MEDMATCH_SESSION_IDLE_SECS", defaults.session_idle_secs),
            session_sweep_secs: parse_var("MEDMATCH_SESSION_SWEEP_SECS", defaults.session_sweep_secs),
        };

        if !config.is_configured() {
            warn!("Remote catalog selected without MEDMATCH_API_BASE_URL - falling back to the mock doctor catalog");
        }

        config
    }

    /// A remote catalog needs a base URL; the mock catalog needs nothing.
    pub fn is_configured(&self) -> bool {
        self.use_mock_catalog || !self.api_base_url.is_empty()
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Search sessions untouched for this long are dropped.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {:?}", name, default);
            default
        }
    }
}

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Wayback-Archiver
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wayback: WaybackConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "EngineConfig::posts")]
    pub posts: EngineConfig,
    #[serde(default = "EngineConfig::media")]
    pub media: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wayback: WaybackConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig::default(),
            posts: EngineConfig::posts(),
            media: EngineConfig::media(),
        }
    }
}

/// Snapshot service endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct WaybackConfig {
    /// Prefix for replayed snapshots, e.g. `https://web.archive.org/web`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// CDX search endpoint used to build the snapshot list
    #[serde(rename = "cdx-url")]
    pub cdx_url: String,
}

impl Default for WaybackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://web.archive.org/web".to_string(),
            cdx_url: "http://web.archive.org/cdx/search/cdx".to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("wayback-archiver/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root of the archived post tree
    #[serde(rename = "tweets-dir")]
    pub tweets_dir: PathBuf,

    /// Directory receiving downloaded media
    #[serde(rename = "attaches-dir")]
    pub attaches_dir: PathBuf,

    /// Directory holding `list_{username}.json` files
    #[serde(rename = "list-dir")]
    pub list_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tweets_dir: PathBuf::from("tweets"),
            attaches_dir: PathBuf::from("attaches"),
            list_dir: PathBuf::from("."),
        }
    }
}

/// Download engine tuning for one kind of run (posts or media)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Number of concurrent workers (one chunk each)
    pub workers: usize,

    /// Total fetch attempts for transient failures
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay between transient-failure retries (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Wait after a 429 that carries no `Retry-After` header (milliseconds)
    #[serde(rename = "rate-limit-delay-ms")]
    pub rate_limit_delay_ms: u64,

    /// Pause after each successful write (milliseconds)
    #[serde(rename = "success-pacing-ms")]
    pub success_pacing_ms: u64,

    /// Cap on consecutive rate-limit waits for one item; 0 means unbounded
    #[serde(rename = "max-rate-limit-waits", default)]
    pub max_rate_limit_waits: u32,

    /// Abort sibling workers when one worker faults
    #[serde(rename = "abort-on-fault", default)]
    pub abort_on_fault: bool,
}

impl EngineConfig {
    /// Defaults for post archiving runs
    pub fn posts() -> Self {
        Self {
            workers: 4,
            max_attempts: 3,
            retry_delay_ms: 10_000,
            rate_limit_delay_ms: 10_000,
            success_pacing_ms: 0,
            max_rate_limit_waits: 0,
            abort_on_fault: false,
        }
    }

    /// Defaults for media archiving runs
    pub fn media() -> Self {
        Self {
            workers: 3,
            max_attempts: 3,
            retry_delay_ms: 3_000,
            rate_limit_delay_ms: 3_000,
            success_pacing_ms: 5_000,
            max_rate_limit_waits: 0,
            abort_on_fault: false,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn success_pacing(&self) -> Duration {
        Duration::from_millis(self.success_pacing_ms)
    }

    /// Returns the rate-limit cap, `None` when waits are unbounded
    pub fn rate_limit_cap(&self) -> Option<u32> {
        (self.max_rate_limit_waits > 0).then_some(self.max_rate_limit_waits)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::posts()
    }
}

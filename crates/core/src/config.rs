use std::env;
use std::path::PathBuf;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub telegram: TelegramConfig,
    pub watcher: WatcherConfig,
    pub store: StoreConfig,
    pub message: MessageConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            source: SourceConfig::from_env(),
            telegram: TelegramConfig::from_env(),
            watcher: WatcherConfig::from_env(),
            store: StoreConfig::from_env(),
            message: MessageConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  source:    endpoint={}, search={:?}, page={}+{}, auth={}",
            self.source.endpoint,
            self.source.search_term,
            self.source.page_offset,
            self.source.page_count,
            if self.source.bearer_token.is_some() { "bearer" } else { "none" },
        );
        tracing::info!(
            "  telegram:  channel={}, ops_chat={}, token={}",
            self.telegram.channel,
            self.telegram.ops_chat_id,
            if self.telegram.bot_token.is_some() { "set" } else { "NOT SET" },
        );
        tracing::info!(
            "  watcher:   interval={}s, attempts={}, backoff={}ms x{}",
            self.watcher.poll_interval_secs,
            self.watcher.retry_max_attempts,
            self.watcher.retry_initial_backoff_ms,
            self.watcher.retry_backoff_factor,
        );
        tracing::info!("  store:     path={}, cap={}", self.store.path.display(), self.store.cap);
        tracing::info!("  message:   description_limit={}", self.message.description_max_chars);
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 5000),
        }
    }
}

// ── Listing source ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub endpoint: String,
    pub bearer_token: Option<String>,
    pub search_term: String,
    pub skill_uid: String,
    pub page_offset: u32,
    pub page_count: u32,
    pub timeout_secs: u64,
}

impl SourceConfig {
    fn from_env() -> Self {
        Self {
            endpoint: env_or(
                "SOURCE_ENDPOINT",
                "https://www.upwork.com/api/graphql/v1?alias=visitorJobSearch",
            ),
            bearer_token: env_opt("SOURCE_BEARER_TOKEN"),
            search_term: env_or("SEARCH_TERM", "web scraping"),
            skill_uid: env_or("SKILL_UID", "1031626730405085184"),
            page_offset: env_u32("PAGE_OFFSET", 0),
            page_count: env_u32("PAGE_COUNT", 10),
            timeout_secs: env_u64("FETCH_TIMEOUT_SECS", 30),
        }
    }
}

// ── Telegram ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Channel that receives listing broadcasts (e.g. `@web_scraping_jobs`).
    pub channel: String,
    /// Chat that receives operational pings (healthcheck).
    pub ops_chat_id: String,
}

impl TelegramConfig {
    fn from_env() -> Self {
        Self {
            // `TOKEN` kept as a fallback name for older deployments.
            bot_token: env_opt("TELEGRAM_BOT_TOKEN").or_else(|| env_opt("TOKEN")),
            channel: env_or("TELEGRAM_CHANNEL", "@web_scraping_jobs"),
            ops_chat_id: env_or("OPS_CHAT_ID", "7376212965"),
        }
    }
}

// ── Watcher loop ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub poll_interval_secs: u64,
    /// Total attempts per cycle, including the first.
    pub retry_max_attempts: u32,
    pub retry_initial_backoff_ms: u64,
    pub retry_backoff_factor: f64,
}

impl WatcherConfig {
    fn from_env() -> Self {
        Self {
            poll_interval_secs: env_u64("POLL_INTERVAL_SECS", 180),
            retry_max_attempts: env_u32("RETRY_MAX_ATTEMPTS", 3),
            retry_initial_backoff_ms: env_u64("RETRY_INITIAL_BACKOFF_MS", 1000),
            retry_backoff_factor: env_f64("RETRY_BACKOFF_FACTOR", 2.0),
        }
    }
}

// ── Listing store ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Maximum number of listings kept in the snapshot.
    pub cap: usize,
}

impl StoreConfig {
    fn from_env() -> Self {
        Self {
            path: PathBuf::from(env_or("STORE_PATH", "data/latest_jobs.json")),
            cap: env_usize("STORE_CAP", 50),
        }
    }
}

// ── Message rendering ─────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MessageConfig {
    /// Character ceiling for the description block of a broadcast message.
    pub description_max_chars: usize,
}

impl MessageConfig {
    fn from_env() -> Self {
        Self {
            description_max_chars: env_usize("DESCRIPTION_LIMIT", 3600),
        }
    }
}

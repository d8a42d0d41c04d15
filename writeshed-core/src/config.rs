//! Layered CLI/env configuration, resolved via `clap`'s `env` feature the
//! way `sideseat-server`'s `core::cli` module resolves its (much larger)
//! configuration surface.

use std::time::Duration;

use clap::Parser;

use crate::constants::*;

/// Parses `REDIS_PORT`, which the upstream system sometimes expresses as a
/// bare port (`"6379"`) and sometimes as a `tcp://host:port` URL (a
/// container-orchestration convention). Both forms must resolve to the
/// same numeric port — see Testable Property #11.
pub fn parse_redis_port(raw: &str) -> Result<u16, String> {
    let candidate = raw.rsplit(':').next().unwrap_or(raw);
    candidate
        .trim()
        .parse::<u16>()
        .map_err(|_| format!("'{raw}' is not a valid port or tcp://host:port value"))
}

#[derive(Parser, Debug, Clone)]
#[command(name = "writeshed", version, about = "Write-shedding ingestion pipeline")]
pub struct Config {
    /// MongoDB connection URI.
    #[arg(long, env = ENV_MONGO_URI, default_value = DEFAULT_MONGO_URI)]
    pub mongo_uri: String,

    /// Redis host (broker).
    #[arg(long, env = ENV_REDIS_HOST, default_value = DEFAULT_REDIS_HOST)]
    pub redis_host: String,

    /// Redis port. Accepts a bare port or a `tcp://host:port` value.
    #[arg(long, env = ENV_REDIS_PORT, default_value_t = DEFAULT_REDIS_PORT, value_parser = parse_redis_port)]
    pub redis_port: u16,

    /// Port the ingress HTTP server listens on.
    #[arg(long, env = ENV_APP_PORT, default_value_t = DEFAULT_APP_PORT)]
    pub app_port: u16,

    /// Cache entry TTL, in seconds.
    #[arg(long, env = ENV_CACHE_TTL, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Maximum number of entries the consumer accumulates before an
    /// unconditional flush.
    #[arg(long, env = ENV_BATCH_SIZE, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Maximum wall-clock time, in seconds, a non-empty buffer is held
    /// before being flushed regardless of size.
    #[arg(long, env = ENV_FLUSH_INTERVAL, default_value_t = DEFAULT_FLUSH_INTERVAL_SECS)]
    pub flush_interval_secs: f64,

    /// Maximum retry attempts for a transient store/broker failure before
    /// the consumer logs and moves on (entries remain in the PEL).
    #[arg(long, env = ENV_MAX_RETRIES, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Delay, in seconds, between retry attempts.
    #[arg(long, env = ENV_RETRY_DELAY, default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay_secs: f64,

    /// Stable consumer name within the consumer group. Defaults to the
    /// host identity, per spec §3.
    #[arg(long, env = ENV_HOSTNAME, default_value = DEFAULT_HOSTNAME)]
    pub hostname: String,

    /// Idle duration, in milliseconds, before a pending entry becomes
    /// eligible for claiming by another consumer.
    #[arg(long, env = ENV_CLAIM_IDLE_MS, default_value_t = DEFAULT_CLAIM_IDLE_MS)]
    pub claim_idle_ms: u64,
}

impl Config {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs_f64(self.flush_interval_secs.max(0.0))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs.max(0.0))
    }

    pub fn claim_idle(&self) -> Duration {
        Duration::from_millis(self.claim_idle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_port() {
        assert_eq!(parse_redis_port("6379").unwrap(), 6379);
    }

    #[test]
    fn parses_tcp_url_port() {
        assert_eq!(parse_redis_port("tcp://10.0.0.1:6379").unwrap(), 6379);
    }

    #[test]
    fn parses_tcp_url_port_with_hostname() {
        assert_eq!(parse_redis_port("tcp://redis-master:16379").unwrap(), 16379);
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(parse_redis_port("tcp://redis-master:notaport").is_err());
    }

    #[test]
    fn redis_url_formats_host_and_port() {
        let cfg = Config {
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            redis_host: "cache.internal".to_string(),
            redis_port: 6380,
            app_port: DEFAULT_APP_PORT,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            hostname: DEFAULT_HOSTNAME.to_string(),
            claim_idle_ms: DEFAULT_CLAIM_IDLE_MS,
        };
        assert_eq!(cfg.redis_url(), "redis://cache.internal:6380");
    }
}

//! Application configuration module
use std::env;

/// One year
const MAX_REPORT_TTL_SECONDS: u64 = 365 * 24 * 3600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub report_cache: ReportCacheConfig,
}

#[derive(Clone, Debug)]
pub struct ReportCacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
    /// Decimal places kept when keying reports by coordinates
    pub coord_precision: usize,
    pub sweep_seconds: u64,
}

impl ReportCacheConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ttl_seconds == 0 || self.ttl_seconds > MAX_REPORT_TTL_SECONDS {
            anyhow::bail!(
                "REPORT_CACHE_TTL_SECONDS must be between 1 and {}, got {}",
                MAX_REPORT_TTL_SECONDS,
                self.ttl_seconds
            );
        }
        if self.max_entries == 0 {
            anyhow::bail!("REPORT_CACHE_MAX_ENTRIES must be at least 1");
        }
        Ok(())
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds.min(MAX_REPORT_TTL_SECONDS) as i64)
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let coord_precision = env_u64("COORD_PRECISION", 2) as usize;
        if coord_precision > 6 {
            anyhow::bail!("COORD_PRECISION must be at most 6, got {}", coord_precision);
        }

        let report_cache = ReportCacheConfig {
            ttl_seconds: env_u64("REPORT_CACHE_TTL_SECONDS", 900), // 15 min
            max_entries: env_u64("REPORT_CACHE_MAX_ENTRIES", 256) as usize,
            coord_precision,
            sweep_seconds: env_u64("CACHE_SWEEP_SECONDS", 60),
        };
        report_cache.validate()?;

        Ok(Self {
            bind_addr,
            report_cache,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

use anyhow::{bail, Context, Result};

/// Process configuration, read once from the environment at boot (§6).
/// No file layer and no ambient discovery: every field comes from a named
/// env var with a typed default, grouped by concern the way the teacher's
/// own (larger) `Config` groups `server`/`database`/`auth`/etc.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub fanout: FanoutConfig,
    pub platform_token: String,
    pub debug: bool,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub pool_size: u32,
    pub pool_overflow: u32,
}

impl StoreConfig {
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.pool_overflow
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    pub pool_max: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub secret_key: String,
    pub token_expire_minutes: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct FanoutConfig {
    pub per_room_concurrency: usize,
    pub retry_max: u32,
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required environment variable {name}"))
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_csv(name: &str) -> Vec<String> {
    std::env::var(name)
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl Config {
    pub fn load() -> Result<Self> {
        let secret_key = env_var("SECRET_KEY")?;
        if secret_key.len() < 32 {
            bail!("SECRET_KEY must be at least 32 bytes");
        }

        Ok(Self {
            server: ServerConfig {
                bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
                allowed_origins: env_csv("ALLOWED_ORIGINS"),
            },
            store: StoreConfig {
                url: env_var("STORE_URL")?,
                pool_size: env_or("STORE_POOL_SIZE", 20),
                pool_overflow: env_or("STORE_POOL_OVERFLOW", 30),
            },
            cache: CacheConfig {
                url: env_var("CACHE_URL")?,
                pool_max: env_or("CACHE_POOL_MAX", 20),
            },
            auth: AuthConfig {
                admin_username: env_var("ADMIN_USERNAME")?,
                admin_password: env_var("ADMIN_PASSWORD")?,
                secret_key,
                token_expire_minutes: env_or("TOKEN_EXPIRE_MINUTES", 1440),
                rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", 100),
                rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SEC", 60),
            },
            fanout: FanoutConfig {
                per_room_concurrency: env_or("FANOUT_PER_ROOM_CONCURRENCY", 32),
                retry_max: env_or("FANOUT_RETRY_MAX", 3),
            },
            platform_token: env_var("PLATFORM_TOKEN")?,
            debug: env_bool("DEBUG", false),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_required_env<F: FnOnce()>(f: F) {
        std::env::set_var("SECRET_KEY", "01234567890123456789012345678901");
        std::env::set_var("STORE_URL", "sqlite::memory:");
        std::env::set_var("CACHE_URL", "redis://127.0.0.1:6379");
        std::env::set_var("ADMIN_USERNAME", "admin");
        std::env::set_var("ADMIN_PASSWORD", "hunter2");
        std::env::set_var("PLATFORM_TOKEN", "token");
        f();
        for var in [
            "SECRET_KEY",
            "STORE_URL",
            "CACHE_URL",
            "ADMIN_USERNAME",
            "ADMIN_PASSWORD",
            "PLATFORM_TOKEN",
            "BIND_ADDRESS",
            "TOKEN_EXPIRE_MINUTES",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn load_applies_documented_defaults() {
        with_required_env(|| {
            let config = Config::load().expect("config loads from required env alone");
            assert_eq!(config.server.bind_address, "0.0.0.0:8080");
            assert_eq!(config.auth.token_expire_minutes, 1440);
            assert_eq!(config.auth.rate_limit_requests, 100);
            assert_eq!(config.auth.rate_limit_window_secs, 60);
            assert_eq!(config.store.pool_size, 20);
            assert_eq!(config.store.pool_overflow, 30);
            assert_eq!(config.store.max_connections(), 50);
            assert_eq!(config.cache.pool_max, 20);
            assert_eq!(config.fanout.per_room_concurrency, 32);
            assert_eq!(config.fanout.retry_max, 3);
            assert!(config.server.allowed_origins.is_empty());
        });
    }

    #[test]
    fn load_rejects_short_secret_key() {
        with_required_env(|| {
            std::env::set_var("SECRET_KEY", "too-short");
            let result = Config::load();
            std::env::set_var("SECRET_KEY", "01234567890123456789012345678901");
            assert!(result.is_err());
        });
    }

    #[test]
    fn load_honors_bind_address_override() {
        with_required_env(|| {
            std::env::set_var("BIND_ADDRESS", "127.0.0.1:9090");
            let config = Config::load().expect("config loads");
            assert_eq!(config.server.bind_address, "127.0.0.1:9090");
        });
    }
}

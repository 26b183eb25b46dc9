//! Server configuration, read from the environment.

use std::net::SocketAddr;

use taskq_core::PoolConfig;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub pool: PoolConfig,
}

impl ServerConfig {
    /// - `QUEUE_SIZE`: admission queue capacity (default 64)
    /// - `WORKERS`: worker count (default 4)
    /// - `TASKQ_ADDR`: listen address (default `0.0.0.0:8080`)
    ///
    /// Missing, unparsable or non-positive values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let queue_capacity =
            positive(lookup("QUEUE_SIZE")).unwrap_or(PoolConfig::DEFAULT_QUEUE_CAPACITY);
        let workers = positive(lookup("WORKERS")).unwrap_or(PoolConfig::DEFAULT_WORKERS);
        let addr = lookup("TASKQ_ADDR")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(default_addr);

        Self {
            addr,
            pool: PoolConfig::new(workers, queue_capacity),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            pool: PoolConfig::default(),
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn positive(raw: Option<String>) -> Option<usize> {
    raw?.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

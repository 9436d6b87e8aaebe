use clap::{Parser, ValueEnum};
use hop_service::HitExpiry;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "HOP_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "HOP_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "HOP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "HOP_MYSQL_DSN";
pub const MYSQL_MAX_CONNECTIONS_ENV: &str = "HOP_MYSQL_MAX_CONNECTIONS";
pub const CACHE_BACKEND_ENV: &str = "HOP_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "HOP_REDIS_URL";
pub const CACHE_TTL_ENV: &str = "HOP_CACHE_TTL_SECS";
pub const MOKA_CAPACITY_ENV: &str = "HOP_MOKA_CAPACITY";
pub const CODE_LENGTH_ENV: &str = "HOP_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "HOP_MAX_ATTEMPTS";
pub const HIT_EXPIRY_ENV: &str = "HOP_HIT_EXPIRY";
pub const LOG_FORMAT_ENV: &str = "HOP_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
    /// Moka in front of Redis.
    #[value(name = "layered")]
    Layered,
    #[value(name = "none")]
    None,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
            CacheBackendArg::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HitExpiryArg {
    #[value(name = "relaxed")]
    Relaxed,
    #[value(name = "strict")]
    Strict,
}

impl From<HitExpiryArg> for HitExpiry {
    fn from(value: HitExpiryArg) -> Self {
        match value {
            HitExpiryArg::Relaxed => HitExpiry::Relaxed,
            HitExpiryArg::Strict => HitExpiry::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "hop-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Base URL short links are published under.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = MYSQL_MAX_CONNECTIONS_ENV, default_value_t = 10)]
    pub mysql_max_connections: u32,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    /// TTL of redirect cache entries, in seconds.
    #[arg(long, env = CACHE_TTL_ENV, default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = MOKA_CAPACITY_ENV, default_value_t = 10_000)]
    pub moka_capacity: u64,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = 7)]
    pub code_length: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 10)]
    pub max_attempts: usize,

    #[arg(
        long,
        env = HIT_EXPIRY_ENV,
        value_enum,
        default_value_t = HitExpiryArg::Relaxed
    )]
    pub hit_expiry: HitExpiryArg,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,
}

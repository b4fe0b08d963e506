//! Application configuration

use std::path::PathBuf;

use clap::Args;
use tizaraa::cart::StockPolicy;

use crate::domain::carts::{CartStoreConfig, CartSyncChannel};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Storefront cart settings.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Directory the cart is stored under
    #[arg(long, env = "TIZARAA_DATA_DIR", default_value = ".tizaraa", global = true)]
    pub data_dir: PathBuf,

    /// Product catalog fixture; the built-in storefront catalog when omitted
    #[arg(long, env = "TIZARAA_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Promo code fixture; the built-in storefront codes when omitted
    #[arg(long, env = "TIZARAA_PROMO_CODES", global = true)]
    pub promo_codes: Option<PathBuf>,

    /// Stock check applied on add, update and move (reservation-aware, per-variant)
    #[arg(
        long,
        env = "TIZARAA_STOCK_POLICY",
        default_value_t = StockPolicy::ReservationAware,
        global = true
    )]
    pub stock_policy: StockPolicy,

    /// Name of the cross-context sync channel
    #[arg(
        long,
        env = "TIZARAA_SYNC_CHANNEL",
        default_value = CartSyncChannel::DEFAULT_NAME,
        global = true
    )]
    pub sync_channel: String,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Store settings derived from this configuration.
    #[must_use]
    pub fn store(&self) -> CartStoreConfig {
        CartStoreConfig {
            stock_policy: self.stock_policy,
        }
    }
}

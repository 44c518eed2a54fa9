//! Configuration for the order client.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults (the reference NEW / CANCEL scenario),
//! 2. an optional TOML file,
//! 3. environment variables:
//!    - `ORDER_CLIENT_ENDPOINT`        (default: "/tmp/demo.sock")
//!    - `ORDER_CLIENT_RECV_TIMEOUT_MS` (default: unset, reads block forever)
//!    - `ORDER_CLIENT_INITIAL_SEQNO`   (default: "1")
//! 4. command-line flags (applied by the binary).
//!
//! Example file:
//!
//! ```toml
//! endpoint = "tcp://127.0.0.1:9000"
//! recv_timeout_ms = 5000
//!
//! [order]
//! client_order_id = 42
//! price_ticks = 101
//! qty = 30
//! instrument_id = 1
//! side = "bid"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use order_protocol::wire_types::TIF_IOC;
use order_protocol::{OrderNewBody, Side};
use serde::Deserialize;
use thiserror::Error;

use crate::network::Endpoint;
use crate::session::{CancelRequest, SessionOptions};

pub const ENV_ENDPOINT: &str = "ORDER_CLIENT_ENDPOINT";
pub const ENV_RECV_TIMEOUT_MS: &str = "ORDER_CLIENT_RECV_TIMEOUT_MS";
pub const ENV_INITIAL_SEQNO: &str = "ORDER_CLIENT_INITIAL_SEQNO";

pub const DEFAULT_ENDPOINT: &str = "/tmp/demo.sock";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid endpoint {0:?}: expected a socket path, unix://path or tcp://host:port")]
    InvalidEndpoint(String),
}

/// Order side as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SideConfig {
    Bid,
    Ask,
}

impl From<SideConfig> for Side {
    fn from(s: SideConfig) -> Self {
        match s {
            SideConfig::Bid => Side::Bid,
            SideConfig::Ask => Side::Ask,
        }
    }
}

/// The single order a session submits and then cancels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    pub client_order_id: u64,
    pub price_ticks: i64,
    pub qty: i32,
    pub instrument_id: u32,
    pub side: SideConfig,
    /// Raw time-in-force bits; `0` is good-till-cancel.
    pub flags: u8,
    /// Fresh client id used for the cancel request.
    pub cancel_client_order_id: u64,
    pub reason_code: u8,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            client_order_id: 42,
            price_ticks: 101,
            qty: 30,
            instrument_id: 1,
            side: SideConfig::Bid,
            flags: 0,
            cancel_client_order_id: 43,
            reason_code: 0,
        }
    }
}

impl OrderConfig {
    pub fn new_order(&self) -> OrderNewBody {
        OrderNewBody {
            client_order_id: self.client_order_id,
            price_ticks: self.price_ticks,
            qty: self.qty,
            instrument_id: self.instrument_id,
            side: self.side.into(),
            flags: self.flags,
        }
    }

    pub fn cancel_request(&self) -> CancelRequest {
        CancelRequest {
            client_order_id: self.cancel_client_order_id,
            reason_code: self.reason_code,
        }
    }

    pub fn set_ioc(&mut self, ioc: bool) {
        if ioc {
            self.flags |= TIF_IOC;
        } else {
            self.flags &= !TIF_IOC;
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Engine endpoint, see [`Endpoint::parse`].
    pub endpoint: String,

    /// Per-frame receive deadline. `None` blocks indefinitely.
    pub recv_timeout_ms: Option<u64>,

    /// Sequence number stamped on the first frame sent.
    pub initial_seqno: u64,

    pub order: OrderConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            recv_timeout_ms: None,
            initial_seqno: 1,
            order: OrderConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults, overlaid by `path` (if any), overlaid by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(ms) = read_env::<u64>(ENV_RECV_TIMEOUT_MS)? {
            self.recv_timeout_ms = Some(ms);
        }
        self.initial_seqno = read_env_or_default(ENV_INITIAL_SEQNO, self.initial_seqno)?;
        Ok(())
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::parse(&self.endpoint)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            initial_seqno: self.initial_seqno,
            recv_timeout: self.recv_timeout_ms.map(Duration::from_millis),
        }
    }
}

fn read_env<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: val }),
        Err(_) => Ok(None),
    }
}

fn read_env_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(read_env(key)?.unwrap_or(default))
}

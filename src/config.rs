//! Client configuration and loaders.
//!
//! [`ConsoleConfig`] carries the recognised options with their defaults. It
//! can be assembled fluently from Rust, deserialised with `serde` (keys use
//! the camelCase names below), or read from an INI file.
//!
//! | Key | Default |
//! |---|---|
//! | `serverHost` | `localhost` |
//! | `serverPort` | `4445` |
//! | `useXmlFormat` | `true` |
//! | `autoReconnect` | `true` |
//! | `reconnectDelaySeconds` | `5` |
//! | `transport` | `datagram` |
//! | `queueCapacity` | `1024` |
//! | `connectTimeoutMs` | `5000` |
//! | `minLevel` | `TRACE` |

use std::{fs, io, path::Path, time::Duration};

use ini::Ini;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    formatter::WireFormat,
    level::Severity,
    transport::{Destination, TransportKind},
};

pub const DEFAULT_SERVER_HOST: &str = "localhost";
pub const DEFAULT_SERVER_PORT: u16 = 4445;
pub const DEFAULT_RECONNECT_DELAY_SECONDS: u64 = 5;
/// Bound on events waiting for the stream worker; newer events are dropped
/// once it is reached.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// INI section consulted before the general section.
const INI_SECTION: &str = "console";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or malformed.
    #[error("invalid console configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid INI configuration: {0}")]
    Ini(#[from] ini::ParseError),
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Which sink a [`Console`](crate::Console) is built around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// TCP with a background worker and reconnects.
    Stream,
    /// Fire-and-forget UDP.
    #[default]
    Datagram,
    /// Discard everything.
    Disabled,
}

impl std::str::FromStr for SinkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" | "tcp" => Ok(Self::Stream),
            "datagram" | "udp" => Ok(Self::Datagram),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(ConfigError::InvalidConfig(format!(
                "unknown transport: {other}"
            ))),
        }
    }
}

/// Options shared by every client type.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    pub server_host: String,
    pub server_port: u16,
    pub use_xml_format: bool,
    pub auto_reconnect: bool,
    pub reconnect_delay_seconds: u64,
    pub transport: SinkKind,
    pub queue_capacity: usize,
    pub connect_timeout_ms: u64,
    pub min_level: Severity,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_SERVER_HOST.into(),
            server_port: DEFAULT_SERVER_PORT,
            use_xml_format: true,
            auto_reconnect: true,
            reconnect_delay_seconds: DEFAULT_RECONNECT_DELAY_SECONDS,
            transport: SinkKind::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            min_level: Severity::Trace,
        }
    }
}

impl ConsoleConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::default().with_server(host, port)
    }

    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server_host = host.into();
        self.server_port = port;
        self
    }

    pub fn with_xml_format(mut self, use_xml: bool) -> Self {
        self.use_xml_format = use_xml;
        self
    }

    pub fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    pub fn with_reconnect_delay_seconds(mut self, seconds: u64) -> Self {
        self.reconnect_delay_seconds = seconds;
        self
    }

    pub fn with_transport(mut self, transport: SinkKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    pub fn with_min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    pub fn wire_format(&self) -> WireFormat {
        WireFormat::from_xml_flag(self.use_xml_format)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Destination for the given transport kind.
    pub fn destination(&self, kind: TransportKind) -> Destination {
        Destination::new(self.server_host.clone(), self.server_port, kind)
    }

    /// Check every field, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_host.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "serverHost must not be empty".into(),
            ));
        }
        ensure_positive!(self.server_port, "serverPort")?;
        ensure_positive!(self.reconnect_delay_seconds, "reconnectDelaySeconds")?;
        ensure_positive!(self.queue_capacity, "queueCapacity")?;
        ensure_positive!(self.connect_timeout_ms, "connectTimeoutMs")?;
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate INI text.
    ///
    /// Keys are read from the general section first and then from
    /// `[console]`, so the section overrides top-level values.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        let mut config = Self::default();
        let sections = [ini.section(None::<String>), ini.section(Some(INI_SECTION))];
        for props in sections.into_iter().flatten() {
            for (key, value) in props.iter() {
                config.apply_entry(key, value)?;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ini_str(&text)
    }

    fn apply_entry(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "serverHost" => self.server_host = value.trim().to_owned(),
            "serverPort" => self.server_port = parse_number(key, value)?,
            "useXmlFormat" => self.use_xml_format = parse_bool(key, value)?,
            "autoReconnect" => self.auto_reconnect = parse_bool(key, value)?,
            "reconnectDelaySeconds" => self.reconnect_delay_seconds = parse_number(key, value)?,
            "transport" => self.transport = value.parse()?,
            "queueCapacity" => self.queue_capacity = parse_number(key, value)?,
            "connectTimeoutMs" => self.connect_timeout_ms = parse_number(key, value)?,
            "minLevel" => {
                self.min_level = value
                    .parse()
                    .map_err(|err| ConfigError::InvalidConfig(format!("minLevel: {err}")))?;
            }
            other => log::debug!("ignoring unrecognised console option {other}"),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidConfig(format!("{key} must be a number, got {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidConfig(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

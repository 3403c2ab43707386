//! # Configuration
//!
//! Everything is resolved once, before any actor starts, into plain values that are then
//! passed to constructors. Nothing reads the environment after startup.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `NOTIFY_ORDERS_BINDING` | `notifyOrders` | Outbound channel for notifications |
//! | `FINISHED_ORDERS_BINDING` | `finishedOrders` | Inbound channel of completion events |
//! | `STREAM_MAX_ATTEMPTS` | `3` | Deliveries per event, including the first |
//! | `STREAM_BACKOFF_INITIAL_MS` | `1000` | Pause after the first failed delivery |
//! | `STREAM_BACKOFF_MAX_MS` | `10000` | Upper bound on the pause |
//! | `STREAM_BACKOFF_MULTIPLIER` | `2.0` | Growth factor between pauses |
//! | `STREAM_DELIVERY_TIMEOUT_MS` | `5000` | Limit for one delivery attempt |
//! | `ACTOR_BUFFER_SIZE` | `32` | Order store mailbox capacity |

use crate::messaging::DeliverySettings;
use crate::notifier::NotifierConfig;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const NOTIFY_ORDERS_BINDING: &str = "NOTIFY_ORDERS_BINDING";
pub const FINISHED_ORDERS_BINDING: &str = "FINISHED_ORDERS_BINDING";
pub const STREAM_MAX_ATTEMPTS: &str = "STREAM_MAX_ATTEMPTS";
pub const STREAM_BACKOFF_INITIAL_MS: &str = "STREAM_BACKOFF_INITIAL_MS";
pub const STREAM_BACKOFF_MAX_MS: &str = "STREAM_BACKOFF_MAX_MS";
pub const STREAM_BACKOFF_MULTIPLIER: &str = "STREAM_BACKOFF_MULTIPLIER";
pub const STREAM_DELIVERY_TIMEOUT_MS: &str = "STREAM_DELIVERY_TIMEOUT_MS";
pub const ACTOR_BUFFER_SIZE: &str = "ACTOR_BUFFER_SIZE";

/// Errors raised while resolving [`Settings`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub notifier: NotifierConfig,
    pub finished_channel: String,
    pub delivery: DeliverySettings,
    pub buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifier: NotifierConfig::new("notifyOrders"),
            finished_channel: "finishedOrders".to_string(),
            delivery: DeliverySettings::default(),
            buffer_size: 32,
        }
    }
}

impl Settings {
    /// Resolve settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, falling back to defaults for absent keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let notify_channel = channel(&lookup, NOTIFY_ORDERS_BINDING, defaults.notifier.notify_channel)?;
        let finished_channel = channel(&lookup, FINISHED_ORDERS_BINDING, defaults.finished_channel)?;
        if notify_channel == finished_channel {
            return Err(ConfigError::Invalid {
                key: NOTIFY_ORDERS_BINDING,
                value: notify_channel,
                reason: format!("must differ from {FINISHED_ORDERS_BINDING}"),
            });
        }

        let max_attempts: u32 = parse(&lookup, STREAM_MAX_ATTEMPTS, defaults.delivery.max_attempts)?;
        at_least(STREAM_MAX_ATTEMPTS, max_attempts, 1)?;

        let backoff_initial = millis(&lookup, STREAM_BACKOFF_INITIAL_MS, defaults.delivery.backoff_initial)?;
        let backoff_max = millis(&lookup, STREAM_BACKOFF_MAX_MS, defaults.delivery.backoff_max)?;
        if backoff_max < backoff_initial {
            return Err(ConfigError::Invalid {
                key: STREAM_BACKOFF_MAX_MS,
                value: backoff_max.as_millis().to_string(),
                reason: format!("must not be below {STREAM_BACKOFF_INITIAL_MS}"),
            });
        }

        let backoff_multiplier: f64 =
            parse(&lookup, STREAM_BACKOFF_MULTIPLIER, defaults.delivery.backoff_multiplier)?;
        if !backoff_multiplier.is_finite() || backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                key: STREAM_BACKOFF_MULTIPLIER,
                value: backoff_multiplier.to_string(),
                reason: "must be a finite number >= 1".to_string(),
            });
        }

        let timeout = millis(&lookup, STREAM_DELIVERY_TIMEOUT_MS, defaults.delivery.timeout)?;
        at_least(STREAM_DELIVERY_TIMEOUT_MS, timeout.as_millis(), 1)?;

        let buffer_size: usize = parse(&lookup, ACTOR_BUFFER_SIZE, defaults.buffer_size)?;
        at_least(ACTOR_BUFFER_SIZE, buffer_size, 1)?;

        Ok(Self {
            notifier: NotifierConfig::new(notify_channel),
            finished_channel,
            delivery: DeliverySettings {
                max_attempts,
                backoff_initial,
                backoff_max,
                backoff_multiplier,
                timeout,
            },
            buffer_size,
        })
    }
}

fn channel(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: String,
) -> Result<String, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { key }),
        Some(value) => Ok(value.trim().to_string()),
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse(lookup, key, default_ms).map(Duration::from_millis)
}

fn at_least<T: PartialOrd + Display>(key: &'static str, value: T, min: T) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be at least {min}"),
        });
    }
    Ok(())
}

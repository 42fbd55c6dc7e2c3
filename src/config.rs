//! Configuration management for the reservation agent.
//!
//! Configuration can be set via environment variables:
//! - `OLLAMA_HOST` - Optional. Model backend base URL. Defaults to `http://127.0.0.1:11434`.
//! - `DEFAULT_MODEL` - Optional. Model alias or raw model tag. Defaults to `llama3.1`.
//! - `RESTAURANT_NAME` - Optional. Shown to the model in the system prompt.
//! - `MAX_ITERATIONS` - Optional. Model invocations allowed per turn. Defaults to `10`.
//! - `TURN_TIMEOUT_SECS` - Optional. Deadline for the model calls of one turn. Defaults to `120`.
//! - `HORIZON_DAYS` - Optional. Number of bookable days starting today. Defaults to `6`.
//! - `OPENING_TIME` - Optional. First slot of the day (`HH:MM`). Defaults to `18:00`.
//! - `SLOT_COUNT` - Optional. Slots per day. Defaults to `8`.
//! - `SLOT_MINUTES` - Optional. Minutes between slots. Defaults to `30`.
//! - `ALLOW_DOUBLE_BOOKING` - Optional. Overwrite occupied slots instead of rejecting.
//!   Defaults to `false`.

use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

use crate::reservations::{BookingPolicy, Schedule};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Models the assistant is known to work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedModel {
    Llama31,
    Llama32,
    Mistral7b,
}

impl SupportedModel {
    /// Tag understood by the Ollama backend.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Llama31 => "llama3.1:8b",
            Self::Llama32 => "llama3.2",
            Self::Mistral7b => "mistral:7b",
        }
    }
}

impl FromStr for SupportedModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llama3.1" | "llama3_1" => Ok(Self::Llama31),
            "llama3.2" | "llama3_2" => Ok(Self::Llama32),
            "mistral_7b" | "mistral-7b" => Ok(Self::Mistral7b),
            other => Err(format!("unsupported model alias: {}", other)),
        }
    }
}

/// Resolve a configured model name into a backend tag.
///
/// Known aliases map to their tag; anything else is passed through unchanged.
pub fn resolve_model(name: &str) -> Result<String, ConfigError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidValue(
            "DEFAULT_MODEL".to_string(),
            "model name is empty".to_string(),
        ));
    }
    Ok(SupportedModel::from_str(name)
        .map(|m| m.tag().to_string())
        .unwrap_or_else(|_| name.to_string()))
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model backend base URL
    pub model_base_url: String,

    /// Backend model tag
    pub default_model: String,

    /// Restaurant name used in the system prompt
    pub restaurant_name: String,

    /// Maximum model invocations per user turn
    pub max_iterations: usize,

    /// Overall deadline for the model calls of one turn
    pub turn_timeout: Duration,

    /// Date horizon and slot grid of the reservation book
    pub schedule: Schedule,

    /// What to do when booking an occupied slot
    pub booking_policy: BookingPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let model_base_url = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());

        let default_model = resolve_model(
            &std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "llama3.1".to_string()),
        )?;

        let restaurant_name = std::env::var("RESTAURANT_NAME")
            .unwrap_or_else(|_| "Tastes of Brazil".to_string());

        let max_iterations: usize = parse_env("MAX_ITERATIONS", 10)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let turn_timeout = Duration::from_secs(parse_env("TURN_TIMEOUT_SECS", 120)?);

        let opening_time = match std::env::var("OPENING_TIME") {
            Ok(v) => NaiveTime::parse_from_str(v.trim(), "%H:%M").map_err(|e| {
                ConfigError::InvalidValue("OPENING_TIME".to_string(), format!("{}", e))
            })?,
            Err(_) => Schedule::default().opening_time,
        };

        let schedule = Schedule {
            horizon_days: parse_env("HORIZON_DAYS", 6)?,
            opening_time,
            slot_count: parse_env("SLOT_COUNT", 8)?,
            slot_minutes: parse_env("SLOT_MINUTES", 30)?,
        };
        schedule
            .validate()
            .map_err(|e| ConfigError::InvalidValue("schedule".to_string(), e))?;

        let allow_double_booking = std::env::var("ALLOW_DOUBLE_BOOKING")
            .ok()
            .map(|v| {
                parse_bool(&v).map_err(|e| {
                    ConfigError::InvalidValue("ALLOW_DOUBLE_BOOKING".to_string(), e)
                })
            })
            .transpose()?
            .unwrap_or(false);

        let booking_policy = if allow_double_booking {
            BookingPolicy::Overwrite
        } else {
            BookingPolicy::Reject
        };

        Ok(Self {
            model_base_url,
            default_model,
            restaurant_name,
            max_iterations,
            turn_timeout,
            schedule,
            booking_policy,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(model_base_url: String, default_model: String) -> Self {
        Self {
            model_base_url,
            default_model,
            restaurant_name: "Tastes of Brazil".to_string(),
            max_iterations: 10,
            turn_timeout: Duration::from_secs(120),
            schedule: Schedule::default(),
            booking_policy: BookingPolicy::Reject,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

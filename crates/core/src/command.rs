// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat command grammar for bubble control
//!
//! Commands are scoped two-word phrases accepted in either order, e.g.
//! `!stop bubbles` and `!bubbles stop` mean the same thing. Both the singular
//! and plural noun are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Duration used by `activate bubbles` when no argument is given
pub const DEFAULT_ACTIVATE_SECONDS: f64 = 10.0;

/// Minimum level allowed to change bubble state from chat
pub const REQUIRED_LEVEL: AuthorizationLevel = AuthorizationLevel::Moderator;

/// Chat privilege levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationLevel {
    None,
    Restricted,
    Elevated,
    Moderator,
    Admin,
}

impl fmt::Display for AuthorizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthorizationLevel::None => "none",
            AuthorizationLevel::Restricted => "restricted",
            AuthorizationLevel::Elevated => "elevated",
            AuthorizationLevel::Moderator => "moderator",
            AuthorizationLevel::Admin => "admin",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for AuthorizationLevel {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(AuthorizationLevel::None),
            "restricted" => Ok(AuthorizationLevel::Restricted),
            "elevated" => Ok(AuthorizationLevel::Elevated),
            "moderator" | "mod" => Ok(AuthorizationLevel::Moderator),
            "admin" => Ok(AuthorizationLevel::Admin),
            other => Err(CommandError::UnknownLevel(other.to_string())),
        }
    }
}

/// The person who typed a chat command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatter {
    pub user_name: String,
    pub level: AuthorizationLevel,
}

impl Chatter {
    pub fn new(user_name: impl Into<String>, level: AuthorizationLevel) -> Self {
        Self {
            user_name: user_name.into(),
            level,
        }
    }

    pub fn can_control_bubbles(&self) -> bool {
        self.level >= REQUIRED_LEVEL
    }
}

/// A parsed bubble command
#[derive(Debug, Clone, PartialEq)]
pub enum BubblesCommand {
    /// Emergency stop: device off and feature disabled
    Stop,
    SetEnabled(bool),
    Activate { seconds: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("expected `set bubbles enabled` or `set bubbles disabled`")]
    InvalidSetArgument,
    #[error("expected `activate bubbles` or `activate bubbles <seconds>`")]
    InvalidActivateArgument,
    #[error("unknown authorization level: {0}")]
    UnknownLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Stop,
    Set,
    Enable,
    Disable,
    Activate,
}

impl Verb {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "stop" => Some(Verb::Stop),
            "set" => Some(Verb::Set),
            "enable" => Some(Verb::Enable),
            "disable" => Some(Verb::Disable),
            "activate" => Some(Verb::Activate),
            _ => None,
        }
    }
}

fn is_noun(word: &str) -> bool {
    word == "bubble" || word == "bubbles"
}

/// Parse a chat line.
///
/// Returns `Ok(None)` when the line is not a bubble command at all, so the
/// caller can ignore it silently.
pub fn parse(text: &str) -> Result<Option<BubblesCommand>, CommandError> {
    let mut words = text.split_whitespace();
    let (Some(first), Some(second)) = (words.next(), words.next()) else {
        return Ok(None);
    };
    let first = first.strip_prefix('!').unwrap_or(first).to_lowercase();
    let second = second.to_lowercase();

    let verb = if is_noun(&first) {
        Verb::from_word(&second)
    } else if is_noun(&second) {
        Verb::from_word(&first)
    } else {
        None
    };
    let Some(verb) = verb else {
        return Ok(None);
    };

    let rest: Vec<&str> = words.collect();
    let command = match verb {
        Verb::Stop => BubblesCommand::Stop,
        Verb::Enable => BubblesCommand::SetEnabled(true),
        Verb::Disable => BubblesCommand::SetEnabled(false),
        Verb::Set => BubblesCommand::SetEnabled(parse_enabled_flag(rest.first().copied())?),
        Verb::Activate => BubblesCommand::Activate {
            seconds: parse_activate_seconds(rest.first().copied())?,
        },
    };
    Ok(Some(command))
}

fn parse_enabled_flag(arg: Option<&str>) -> Result<bool, CommandError> {
    let arg = arg.ok_or(CommandError::InvalidSetArgument)?;
    match arg.to_lowercase().as_str() {
        "enabled" | "enable" | "on" => Ok(true),
        "disabled" | "disable" | "off" => Ok(false),
        _ => Err(CommandError::InvalidSetArgument),
    }
}

fn parse_activate_seconds(arg: Option<&str>) -> Result<f64, CommandError> {
    let Some(arg) = arg else {
        return Ok(DEFAULT_ACTIVATE_SECONDS);
    };
    match arg.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(CommandError::InvalidActivateArgument),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::errors::{ConfigError, ConfigResult};

/// Canonical name of the flagship title, used in redirect paths.
pub const FLAGSHIP_GAME_TYPE: &str = "DerDesDers";

pub const SEED_VAR: &str = "WARROOM_SEED";
pub const GAME_TYPE_VAR: &str = "WARROOM_GAME_TYPE";
pub const ID_ATTEMPTS_VAR: &str = "WARROOM_ID_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Seed for game ids and player keys.
    pub seed: u64,
    /// Game-type tag placed in redirect paths.
    pub game_type: String,
    /// Draws allowed before giving up on finding an unused identifier.
    pub id_attempts: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            game_type: FLAGSHIP_GAME_TYPE.to_string(),
            id_attempts: 16,
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `WARROOM_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(seed) = parse_var(&lookup, SEED_VAR)? {
            config.seed = seed;
        }
        if let Some(game_type) = lookup(GAME_TYPE_VAR) {
            if game_type.trim().is_empty() {
                return Err(invalid(GAME_TYPE_VAR, &game_type));
            }
            config.game_type = game_type;
        }
        if let Some(attempts) = parse_var::<usize, _>(&lookup, ID_ATTEMPTS_VAR)? {
            if attempts == 0 {
                return Err(invalid(ID_ATTEMPTS_VAR, "0"));
            }
            config.id_attempts = attempts;
        }
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, &raw)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

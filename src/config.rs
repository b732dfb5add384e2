use crate::error::ParseDomainError;
use crate::normalize::Domain;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const INPUT_VAR: &str = "QUANT_NORM_INPUT";
pub const DOMAIN_VAR: &str = "QUANT_NORM_DOMAIN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{var} is invalid: {source}")]
    InvalidDomain {
        var: &'static str,
        #[source]
        source: ParseDomainError,
    },
}

/// Settings for the `quant_norm` binary.
///
/// The normalizer itself reads nothing from the environment; this only wires
/// up the command-line tool around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON file holding the raw table.
    pub input: PathBuf,
    /// Market domain of the input, `crypto` unless overridden.
    pub domain: Domain,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// Call `dotenv().ok()` first if a `.env` file should be honored.
    ///
    /// # Errors
    /// Returns an error if `QUANT_NORM_INPUT` is unset or `QUANT_NORM_DOMAIN`
    /// does not name a known domain.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = lookup(INPUT_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(INPUT_VAR))?;

        let domain = match lookup(DOMAIN_VAR) {
            Some(value) if !value.trim().is_empty() => {
                value
                    .parse::<Domain>()
                    .map_err(|source| ConfigError::InvalidDomain {
                        var: DOMAIN_VAR,
                        source,
                    })?
            }
            _ => Domain::Crypto,
        };

        Ok(Self { input, domain })
    }
}

// ABOUTME: Config values that are either literals or references to environment variables.
// ABOUTME: Used for secrets such as the monitor token, so they stay out of the config file.

use crate::error::{Error, Result};
use crate::types::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }

    pub fn resolve_secret(&self) -> Result<Secret> {
        self.resolve().map(Secret::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
        let value: EnvValue = serde_yaml::from_str("plain-token").unwrap();
        assert_eq!(value.resolve().unwrap(), "plain-token");
    }

    #[test]
    fn env_reference_uses_variable_then_default() {
        let value: EnvValue =
            serde_yaml::from_str("{ env: PRESSDOCK_TEST_ENV_VALUE, default: fallback }").unwrap();

        temp_env::with_var("PRESSDOCK_TEST_ENV_VALUE", Some("from-env"), || {
            assert_eq!(value.resolve().unwrap(), "from-env");
        });
        temp_env::with_var_unset("PRESSDOCK_TEST_ENV_VALUE", || {
            assert_eq!(value.resolve().unwrap(), "fallback");
        });
    }

    #[test]
    fn missing_variable_without_default_is_an_error() {
        let value: EnvValue = serde_yaml::from_str("{ env: PRESSDOCK_TEST_UNSET }").unwrap();
        temp_env::with_var_unset("PRESSDOCK_TEST_UNSET", || {
            assert!(matches!(
                value.resolve_secret(),
                Err(Error::MissingEnvVar(var)) if var == "PRESSDOCK_TEST_UNSET"
            ));
        });
    }
}

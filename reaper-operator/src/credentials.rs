//! JMX credentials referenced by a Reaper.
//!
//! The deployment never embeds secret values. It references the secret keys
//! through `secretKeyRef`, after checking that the secret carries them.

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, Secret, SecretKeySelector};
use tracing::error;

use crate::desired::ObjectKey;
use crate::error::{ConfigError, Error};
use crate::store::ObjectStore;

pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";
pub const USERNAME_ENV: &str = "REAPER_JMX_AUTH_USERNAME";
pub const PASSWORD_ENV: &str = "REAPER_JMX_AUTH_PASSWORD";

/// Environment entries pointing at the JMX credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct JmxCredentials {
    pub username: EnvVar,
    pub password: EnvVar,
}

fn secret_env(env_name: &str, secret_name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: env_name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret_name.to_string()),
                key: key.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl JmxCredentials {
    /// Entries referencing `secret_name`, without looking at the secret.
    pub fn referencing(secret_name: &str) -> Self {
        Self {
            username: secret_env(USERNAME_ENV, secret_name, USERNAME_KEY),
            password: secret_env(PASSWORD_ENV, secret_name, PASSWORD_KEY),
        }
    }

    /// Entries for `secret`, which must carry both credential keys.
    pub fn from_secret(secret: &Secret) -> Result<Self, ConfigError> {
        let secret_name = secret.metadata.name.clone().unwrap_or_default();
        for key in [USERNAME_KEY, PASSWORD_KEY] {
            let in_data = secret.data.as_ref().is_some_and(|d| d.contains_key(key));
            let in_string_data = secret
                .string_data
                .as_ref()
                .is_some_and(|d| d.contains_key(key));
            if !in_data && !in_string_data {
                return Err(ConfigError::MissingSecretKey {
                    secret: secret_name,
                    key,
                });
            }
        }
        Ok(Self::referencing(&secret_name))
    }
}

/// Read the secret `secret_name` from the store and check it.
///
/// A missing or malformed secret is a configuration error. Store failures
/// are passed through unchanged so they can be retried.
pub async fn resolve_jmx_credentials<S: ObjectStore>(
    store: &S,
    namespace: &str,
    secret_name: &str,
) -> Result<JmxCredentials, Error> {
    let key = ObjectKey::new(namespace, secret_name);
    let secret = store
        .get::<Secret>(&key)
        .await?
        .ok_or_else(|| ConfigError::MissingSecret(key.to_string()))?;

    JmxCredentials::from_secret(&secret).map_err(|e| {
        error!("Invalid jmx user secret {}: {}", key, e);
        Error::from(e)
    })
}

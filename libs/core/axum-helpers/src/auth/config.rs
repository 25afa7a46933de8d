//! JWT verification settings.
//!
//! Follows the same `FromEnv` pattern as `PostgresConfig`.

use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

pub const DEFAULT_AUTHORITIES_CLAIM: &str = "groups";
pub const DEFAULT_AUTHORITY_PREFIX: &str = "ROLE_";

/// Key material used to check token signatures
#[derive(Clone)]
pub enum JwtKey {
    /// Shared HMAC secret (HS256)
    Secret(String),
    /// Issuer's RSA public key in PEM format (RS256)
    RsaPublicPem(String),
}

impl std::fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret(_) => f.write_str("Secret(***)"),
            Self::RsaPublicPem(_) => f.write_str("RsaPublicPem(..)"),
        }
    }
}

/// JWT resource-server configuration.
///
/// Loaded from environment variables:
/// - `JWT_PUBLIC_KEY_PEM` - RSA public key; takes precedence over the secret
/// - `JWT_SECRET` - HMAC secret, at least 32 characters
/// - `JWT_ISSUER`, `JWT_AUDIENCE` (optional) - checked when set
/// - `JWT_AUTHORITIES_CLAIM` (default: `groups`)
/// - `JWT_AUTHORITY_PREFIX` (default: `ROLE_`)
/// - `JWT_LEEWAY_SECS` (default: 30)
///
/// # Example
///
/// ```ignore
/// use axum_helpers::auth::JwtConfig;
/// use core_config::FromEnv;
///
/// let config = JwtConfig::from_env()?;
///
/// // Tests
/// let config = JwtConfig::with_secret("my-super-secret-key-that-is-at-least-32-chars");
/// ```
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub key: JwtKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Claim holding the caller's groups
    pub authorities_claim: String,
    /// Prepended to every group to form an authority
    pub authority_prefix: String,
    /// Clock skew tolerated on `exp`
    pub leeway_secs: u64,
}

impl JwtConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            key: JwtKey::Secret(secret.into()),
            issuer: None,
            audience: None,
            authorities_claim: DEFAULT_AUTHORITIES_CLAIM.to_string(),
            authority_prefix: DEFAULT_AUTHORITY_PREFIX.to_string(),
            leeway_secs: 30,
        }
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let key = match env_optional("JWT_PUBLIC_KEY_PEM") {
            Some(pem) => JwtKey::RsaPublicPem(pem),
            None => {
                let secret = env_optional("JWT_SECRET").ok_or_else(|| {
                    ConfigError::MissingEnvVar("JWT_SECRET or JWT_PUBLIC_KEY_PEM".to_string())
                })?;
                if secret.len() < 32 {
                    return Err(ConfigError::ParseError {
                        key: "JWT_SECRET".to_string(),
                        details: format!(
                            "must be at least 32 characters (got {}). Generate one with: openssl rand -base64 32",
                            secret.len()
                        ),
                    });
                }
                JwtKey::Secret(secret)
            }
        };

        Ok(Self {
            key,
            issuer: env_optional("JWT_ISSUER"),
            audience: env_optional("JWT_AUDIENCE"),
            authorities_claim: env_or_default("JWT_AUTHORITIES_CLAIM", DEFAULT_AUTHORITIES_CLAIM),
            authority_prefix: env_or_default("JWT_AUTHORITY_PREFIX", DEFAULT_AUTHORITY_PREFIX),
            leeway_secs: env_parse("JWT_LEEWAY_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    #[test]
    fn test_jwt_config_from_env_secret() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some(SECRET)),
                ("JWT_PUBLIC_KEY_PEM", None),
                ("JWT_ISSUER", Some("https://auth.example.com")),
                ("JWT_AUDIENCE", None),
                ("JWT_AUTHORITIES_CLAIM", None),
                ("JWT_AUTHORITY_PREFIX", None),
            ],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert!(matches!(config.key, JwtKey::Secret(ref s) if s == SECRET));
                assert_eq!(config.issuer.as_deref(), Some("https://auth.example.com"));
                assert!(config.audience.is_none());
                assert_eq!(config.authorities_claim, "groups");
                assert_eq!(config.authority_prefix, "ROLE_");
            },
        );
    }

    #[test]
    fn test_jwt_config_prefers_public_key() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some(SECRET)),
                ("JWT_PUBLIC_KEY_PEM", Some("-----BEGIN PUBLIC KEY-----")),
            ],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert!(matches!(config.key, JwtKey::RsaPublicPem(_)));
            },
        );
    }

    #[test]
    fn test_jwt_config_from_env_missing() {
        temp_env::with_vars_unset(["JWT_SECRET", "JWT_PUBLIC_KEY_PEM"], || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn test_jwt_config_from_env_too_short() {
        temp_env::with_vars(
            [("JWT_SECRET", Some("short")), ("JWT_PUBLIC_KEY_PEM", None)],
            || {
                let err = JwtConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("32 characters"));
            },
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = JwtConfig::with_secret(SECRET);
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}

use super::config::{JwtConfig, JwtKey};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Authentication failures; all of them surface as 401
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No bearer token provided")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid JWT configuration: {0}")]
    Config(String),
}

/// Claims read from an incoming token. Anything beyond `sub` and `exp`
/// lands in `extra`, where the authorities claim is looked up.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub authorities: Vec<String>,
}

/// Validates bearer tokens issued by an external authorization server.
///
/// Checks signature and expiry, plus issuer and audience when configured.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
    authorities_claim: String,
    authority_prefix: String,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        let (key, algorithm) = match &config.key {
            JwtKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            JwtKey::RsaPublicPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::Config(e.to_string()))?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        match &config.issuer {
            Some(issuer) => validation.set_issuer(&[issuer]),
            None => validation.iss = None,
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        tracing::info!(
            algorithm = ?algorithm,
            issuer = ?config.issuer,
            audience = ?config.audience,
            "JWT verifier initialized"
        );

        Ok(Self {
            key,
            validation,
            authorities_claim: config.authorities_claim.clone(),
            authority_prefix: config.authority_prefix.clone(),
        })
    }

    /// Verify a raw token and resolve the caller
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)?;
        let authorities = self.authorities(&data.claims);

        Ok(Principal {
            subject: data.claims.sub,
            authorities,
        })
    }

    /// The authorities claim may be a JSON array or a space-separated string
    fn authorities(&self, claims: &JwtClaims) -> Vec<String> {
        let groups: Vec<&str> = match claims.extra.get(&self.authorities_claim) {
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(value)) => value.split_whitespace().collect(),
            _ => Vec::new(),
        };

        groups
            .into_iter()
            .map(|group| format!("{}{}", self.authority_prefix, group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";

    fn token(claims: Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn exp(offset_secs: i64) -> i64 {
        (Utc::now() + Duration::seconds(offset_secs)).timestamp()
    }

    #[test]
    fn test_verify_maps_groups_to_authorities() {
        let verifier = JwtVerifier::new(&JwtConfig::with_secret(SECRET)).unwrap();
        let token = token(
            json!({ "sub": "alice", "exp": exp(300), "groups": ["admin", "users"] }),
            SECRET,
        );

        let principal = verifier.verify(&token).unwrap();
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.authorities, vec!["ROLE_admin", "ROLE_users"]);
    }

    #[test]
    fn test_verify_accepts_space_separated_claim() {
        let mut config = JwtConfig::with_secret(SECRET);
        config.authorities_claim = "scope".to_string();
        config.authority_prefix = "SCOPE_".to_string();
        let verifier = JwtVerifier::new(&config).unwrap();

        let token = token(
            json!({ "sub": "svc", "exp": exp(300), "scope": "users.read users.write" }),
            SECRET,
        );

        let principal = verifier.verify(&token).unwrap();
        assert_eq!(principal.authorities, vec!["SCOPE_users.read", "SCOPE_users.write"]);
    }

    #[test]
    fn test_verify_without_groups() {
        let verifier = JwtVerifier::new(&JwtConfig::with_secret(SECRET)).unwrap();
        let token = token(json!({ "sub": "bob", "exp": exp(300) }), SECRET);

        let principal = verifier.verify(&token).unwrap();
        assert!(principal.authorities.is_empty());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = JwtVerifier::new(&JwtConfig::with_secret(SECRET)).unwrap();
        let token = token(json!({ "sub": "alice", "exp": exp(-3600) }), SECRET);

        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_wrong_signature() {
        let verifier = JwtVerifier::new(&JwtConfig::with_secret(SECRET)).unwrap();
        let token = token(
            json!({ "sub": "alice", "exp": exp(300) }),
            "another-secret-key-that-is-also-long-enough",
        );

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_checks_issuer_and_audience() {
        let config = JwtConfig::with_secret(SECRET)
            .issuer("https://auth.example.com")
            .audience("users-api");
        let verifier = JwtVerifier::new(&config).unwrap();

        let good = token(
            json!({
                "sub": "alice",
                "exp": exp(300),
                "iss": "https://auth.example.com",
                "aud": "users-api"
            }),
            SECRET,
        );
        assert!(verifier.verify(&good).is_ok());

        let wrong_issuer = token(
            json!({
                "sub": "alice",
                "exp": exp(300),
                "iss": "https://evil.example.com",
                "aud": "users-api"
            }),
            SECRET,
        );
        assert!(verifier.verify(&wrong_issuer).is_err());
    }

    #[test]
    fn test_invalid_public_key_is_config_error() {
        let mut config = JwtConfig::with_secret(SECRET);
        config.key = JwtKey::RsaPublicPem("not a pem".to_string());

        assert!(matches!(JwtVerifier::new(&config), Err(AuthError::Config(_))));
    }
}

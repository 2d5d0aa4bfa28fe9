/// RS256 token signing and verification
///
/// Access and refresh tokens use separate key pairs. Signing always uses the
/// private half of the selected pair and verification the public half, so a
/// refresh token never verifies as an access token and vice versa.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{TokenClaims, TokenPayload};
use crate::configuration::JwtSettings;
use crate::error::{AppError, ConfigError};

/// Which key pair a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn label(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// PEM documents for both key pairs
pub struct KeyMaterial<'a> {
    pub access_private: &'a [u8],
    pub access_public: &'a [u8],
    pub refresh_private: &'a [u8],
    pub refresh_public: &'a [u8],
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_pem(kind: TokenKind, private_pem: &[u8], public_pem: &[u8]) -> Result<Self, AppError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(|e| {
            ConfigError::InvalidValue(format!("{} private key: {}", kind.label(), e))
        })?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).map_err(|e| {
            ConfigError::InvalidValue(format!("{} public key: {}", kind.label(), e))
        })?;
        Ok(Self { encoding, decoding })
    }
}

/// Signs and verifies tokens with the configured RSA key pairs
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenCodec {
    /// Build the codec from raw PEM documents
    ///
    /// # Errors
    /// Returns `ConfigError` if any key fails to parse
    pub fn from_pem(keys: KeyMaterial<'_>) -> Result<Self, AppError> {
        let mut validation = Validation::new(Algorithm::RS256);
        // tokens are rejected from the second `exp` is reached
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            access: KeyPair::from_pem(TokenKind::Access, keys.access_private, keys.access_public)?,
            refresh: KeyPair::from_pem(
                TokenKind::Refresh,
                keys.refresh_private,
                keys.refresh_public,
            )?,
            validation,
        })
    }

    /// Build the codec from base64-encoded PEM keys in settings
    ///
    /// # Errors
    /// Returns `ConfigError` if a key is missing, not base64, or not a valid RSA PEM
    pub fn from_settings(config: &JwtSettings) -> Result<Self, AppError> {
        let access_private = decode_key("access_private_key", &config.access_private_key)?;
        let access_public = decode_key("access_public_key", &config.access_public_key)?;
        let refresh_private = decode_key("refresh_private_key", &config.refresh_private_key)?;
        let refresh_public = decode_key("refresh_public_key", &config.refresh_public_key)?;

        Self::from_pem(KeyMaterial {
            access_private: &access_private,
            access_public: &access_public,
            refresh_private: &refresh_private,
            refresh_public: &refresh_public,
        })
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign `payload` with the private key of `kind`, expiring after `expires_in`
    ///
    /// # Errors
    /// Returns error if the key cannot produce a signature
    pub fn sign(
        &self,
        payload: TokenPayload,
        kind: TokenKind,
        expires_in: chrono::Duration,
    ) -> Result<String, AppError> {
        let claims = TokenClaims::new(payload, expires_in);

        encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|e| {
            AppError::Config(ConfigError::InvalidValue(format!(
                "{} token signing failed: {}",
                kind.label(),
                e
            )))
        })
    }

    /// Verify signature and expiry with the public key of `kind`
    ///
    /// Any failure collapses to `None`; callers treat it like a missing token.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Option<TokenClaims> {
        match decode::<TokenClaims>(token, &self.keys(kind).decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(kind = kind.label(), error = %e, "Token verification failed");
                None
            }
        }
    }
}

fn decode_key(name: &str, encoded: &str) -> Result<Vec<u8>, AppError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ConfigError::MissingRequired(format!("jwt.{}", name)).into());
    }

    STANDARD
        .decode(encoded)
        .map_err(|e| ConfigError::ParseError(format!("jwt.{} is not valid base64: {}", name, e)).into())
}

use crate::domain::ports::UserRepository;
use crate::utils::error::{CatalogueError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
    /// Lifetime as the admin UI displays it, e.g. `30m`.
    pub expires_in: String,
}

/// Admin login and HS256 session tokens.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, secret: &str, ttl_minutes: i64) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Checks the password against the stored bcrypt hash. Unknown users and
    /// wrong passwords fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CatalogueError::validation("Username and password are required"));
        }

        let Some(user) = self.users.find(username).await? else {
            tracing::warn!(username = %username, "Login attempt for unknown user");
            return Err(unauthorized());
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            tracing::warn!(username = %username, "Login attempt with wrong password");
            return Err(unauthorized());
        }

        tracing::info!(username = %user.username, "🔐 Admin logged in");
        self.issue(&user.username)
    }

    pub fn issue(&self, username: &str) -> Result<IssuedToken> {
        let now = Utc::now();
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            username: claims.username,
            expires_in: format!("{}m", self.ttl.num_minutes()),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                CatalogueError::Forbidden {
                    message: INVALID_TOKEN.to_string(),
                }
            })
    }

    /// Exchanges a still-valid token for a fresh one.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken> {
        let claims = self.verify(token)?;
        self.issue(&claims.username)
    }
}

fn unauthorized() -> CatalogueError {
    CatalogueError::Unauthorized {
        message: INVALID_CREDENTIALS.to_string(),
    }
}

//! Hakai API credential parsing.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{CtdIssuesError, Result};

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Credentials used to authenticate against the Hakai API.
#[derive(Clone, PartialEq, Eq)]
pub struct HakaiCredentials {
    token_type: String,
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl HakaiCredentials {
    /// Parse a credential string.
    ///
    /// Accepts the query-string form issued by the Hakai login page
    /// (`token_type=Bearer&access_token=...&expires_at=...`) or a bare token.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CtdIssuesError::Credentials(
                "credential string is empty".to_string(),
            ));
        }
        if !trimmed.contains('=') {
            return Ok(Self {
                token_type: DEFAULT_TOKEN_TYPE.to_string(),
                access_token: trimmed.to_string(),
                expires_at: None,
            });
        }

        let mut token_type = None;
        let mut access_token = None;
        let mut expires_at = None;
        for pair in trimmed.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode(value)?;
            match key {
                "token_type" => token_type = Some(value),
                "access_token" => access_token = Some(value),
                "expires_at" => expires_at = Some(parse_expiry(&value)?),
                _ => {}
            }
        }

        let access_token = access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| CtdIssuesError::Credentials("access_token is required".to_string()))?;
        let token_type = token_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());

        Ok(Self {
            token_type,
            access_token,
            expires_at,
        })
    }

    /// Value for the HTTP `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Token type, usually `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Expiry instant, if the credential carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the credential expired at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

impl fmt::Debug for HakaiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HakaiCredentials")
            .field("token_type", &self.token_type)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn decode(value: &str) -> Result<String> {
    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| CtdIssuesError::Credentials(format!("invalid encoding: {err}")))
}

fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    let seconds = value
        .trim()
        .parse::<f64>()
        .map_err(|_| CtdIssuesError::Credentials(format!("invalid expires_at: {value}")))?;
    if !seconds.is_finite() {
        return Err(CtdIssuesError::Credentials(format!(
            "invalid expires_at: {value}"
        )));
    }
    DateTime::<Utc>::from_timestamp(seconds.trunc() as i64, 0)
        .ok_or_else(|| CtdIssuesError::Credentials(format!("expires_at out of range: {value}")))
}

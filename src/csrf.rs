//! Request-forgery tokens for the rendered forms.
//!
//! Every browser gets a random session id in a cookie. A token reads
//! `<expires>.<nonce>.<signature>`, where the signature is an
//! HMAC-SHA256 over the session id, the expiry and the nonce. A token
//! copied out of one browser's page is useless without that browser's
//! cookie, and nothing has to be stored on the server.

use std::time::Duration;

use cookie::{Cookie, SameSite};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;

use crate::errors::BackendError;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "registration_session";

const NONCE_LENGTH: usize = 16;
const SESSION_ID_LENGTH: usize = 16;

const MISSING: &str = "The CSRF token is missing.";
const SESSION_MISSING: &str = "The CSRF session token is missing.";
const INVALID: &str = "The CSRF token is invalid.";
const EXPIRED: &str = "The CSRF token has expired.";

/// Why a submitted token was refused. The messages are shown next to
/// the form.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum CsrfError {
    #[error("{}", MISSING)]
    Missing,

    #[error("{}", SESSION_MISSING)]
    SessionMissing,

    #[error("{}", INVALID)]
    Invalid,

    #[error("{}", EXPIRED)]
    Expired,
}

impl CsrfError {
    pub fn message(self) -> &'static str {
        match self {
            CsrfError::Missing => MISSING,
            CsrfError::SessionMissing => SESSION_MISSING,
            CsrfError::Invalid => INVALID,
            CsrfError::Expired => EXPIRED,
        }
    }
}

/// The session id a browser presented, or a new one to hand out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    id: String,
    fresh: bool,
}

impl Session {
    /// Resumes the session named by the cookie if it looks like one we
    /// issued, and starts a new one otherwise.
    pub fn resume_or_start(cookie: Option<&str>) -> Self {
        match cookie.filter(|id| is_session_id(id)) {
            Some(id) => Session {
                id: id.to_owned(),
                fresh: false,
            },
            None => Self::start(),
        }
    }

    pub fn start() -> Self {
        let mut id = [0u8; SESSION_ID_LENGTH];
        rand::thread_rng().fill_bytes(&mut id);

        Session {
            id: hex::encode(id),
            fresh: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `set-cookie` value to send, if the browser does not have
    /// this session yet.
    pub fn set_cookie(&self) -> Option<String> {
        if !self.fresh {
            return None;
        }

        let cookie = Cookie::build((SESSION_COOKIE, self.id.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();

        Some(cookie.to_string())
    }
}

fn is_session_id(value: &str) -> bool {
    value.len() == SESSION_ID_LENGTH * 2 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Issues and verifies tokens with one secret.
pub struct CsrfKey {
    mac: HmacSha256,
    time_limit: Duration,
}

impl CsrfKey {
    pub fn new(secret: impl AsRef<[u8]>, time_limit: Duration) -> Result<Self, BackendError> {
        let secret = secret.as_ref();

        if secret.is_empty() {
            return Err(BackendError::InvalidSecret);
        }

        let mac = HmacSha256::new_from_slice(secret).map_err(|_| BackendError::InvalidSecret)?;

        Ok(Self { mac, time_limit })
    }

    /// Issues a token for `session` that stays valid for the configured
    /// time limit.
    pub fn issue(&self, session: &Session) -> String {
        self.issue_at(session.id(), OffsetDateTime::now_utc())
    }

    /// Checks `token` against the session id from the request's cookie.
    pub fn verify(&self, token: &str, session: Option<&str>) -> Result<(), CsrfError> {
        self.verify_at(token, session, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, session: &str, now: OffsetDateTime) -> String {
        let expires = (now + self.time_limit).unix_timestamp();

        let mut nonce = [0u8; NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce = hex::encode(nonce);

        let signature = self.mac(session, expires, &nonce).finalize().into_bytes();

        format!("{}.{}.{}", expires, nonce, hex::encode(signature))
    }

    fn verify_at(
        &self,
        token: &str,
        session: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<(), CsrfError> {
        if token.is_empty() {
            return Err(CsrfError::Missing);
        }

        let session = session
            .filter(|id| is_session_id(id))
            .ok_or(CsrfError::SessionMissing)?;

        let mut parts = token.splitn(3, '.');

        let (expires, nonce, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(expires), Some(nonce), Some(signature)) => (expires, nonce, signature),
            _ => return Err(CsrfError::Invalid),
        };

        let expires: i64 = expires.parse().map_err(|_| CsrfError::Invalid)?;
        let signature = hex::decode(signature).map_err(|_| CsrfError::Invalid)?;

        self.mac(session, expires, nonce)
            .verify_slice(&signature)
            .map_err(|_| CsrfError::Invalid)?;

        if now.unix_timestamp() > expires {
            return Err(CsrfError::Expired);
        }

        Ok(())
    }

    fn mac(&self, session: &str, expires: i64, nonce: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();

        mac.update(session.as_bytes());
        mac.update(b".");
        mac.update(expires.to_string().as_bytes());
        mac.update(b".");
        mac.update(nonce.as_bytes());

        mac
    }
}

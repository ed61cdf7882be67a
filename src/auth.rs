//! Email/password identity: the provider contract and a local SQLite-backed provider.

use std::cell::RefCell;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

use crate::error::Result;
use crate::validation::{is_valid_email, MIN_PASSWORD_LEN};

const MAX_FAILED_ATTEMPTS: i64 = 5;
const LOCKOUT_MINUTES: i64 = 15;
const UID_LEN: usize = 28;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Bu email ile kayıtlı kullanıcı bulunamadı.")]
    UserNotFound,

    #[error("Yanlış şifre.")]
    WrongPassword,

    #[error("Geçersiz email adresi.")]
    InvalidEmail,

    #[error("Çok fazla başarısız deneme. Lütfen daha sonra tekrar deneyin.")]
    TooManyRequests,

    #[error("Bu email adresi zaten kullanımda.")]
    EmailAlreadyInUse,

    #[error("Şifre çok zayıf. En az 6 karakter olmalıdır.")]
    WeakPassword,

    #[error("Oturum açık değil.")]
    NotSignedIn,

    #[error("Giriş hatası: {0}")]
    Provider(String),

    #[error("Kayıt hatası: {0}")]
    Registration(String),
}

impl AuthError {
    /// Map a provider error code to its localized error. Unknown codes keep the raw message.
    pub fn from_code(code: &str, message: &str) -> Self {
        match code.trim_start_matches("auth/") {
            "user-not-found" => AuthError::UserNotFound,
            "wrong-password" => AuthError::WrongPassword,
            "invalid-email" => AuthError::InvalidEmail,
            "too-many-requests" => AuthError::TooManyRequests,
            "email-already-in-use" => AuthError::EmailAlreadyInUse,
            "weak-password" => AuthError::WeakPassword,
            _ => AuthError::Provider(message.to_string()),
        }
    }

    /// Same mapping, with the registration wording for unknown codes.
    pub fn from_signup_code(code: &str, message: &str) -> Self {
        match Self::from_code(code, message) {
            AuthError::Provider(msg) => AuthError::Registration(msg),
            other => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::TooManyRequests => "auth/too-many-requests",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::NotSignedIn => "auth/no-current-user",
            AuthError::Provider(_) | AuthError::Registration(_) => "auth/internal-error",
        }
    }
}

/// The authenticated principal, as the identity provider knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

pub type SessionListener = Box<dyn Fn(Option<&Identity>)>;

pub trait IdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;
    fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;
    fn sign_out(&self) -> Result<()>;
    fn current_session(&self) -> Result<Option<Identity>>;
    /// Register a callback run on every sign-in and sign-out.
    fn observe(&self, listener: SessionListener);
}

/// Credentials and the active session kept in the same SQLite file as the documents.
pub struct LocalIdentity<'a> {
    conn: &'a Connection,
    listeners: RefCell<Vec<SessionListener>>,
}

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

fn new_uid() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UID_LEN)
        .map(char::from)
        .collect()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

struct CredentialRow {
    uid: String,
    email: String,
    password_hash: String,
    failed_attempts: i64,
    locked_until: Option<String>,
}

impl<'a> LocalIdentity<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn notify(&self, identity: Option<&Identity>) {
        for listener in self.listeners.borrow().iter() {
            listener(identity);
        }
    }

    fn find(&self, email: &str) -> Result<Option<CredentialRow>> {
        Ok(self
            .conn
            .query_row(
                "SELECT uid, email, password_hash, failed_attempts, locked_until \
                 FROM credentials WHERE email = ?1",
                [email],
                |row| {
                    Ok(CredentialRow {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        failed_attempts: row.get(3)?,
                        locked_until: row.get(4)?,
                    })
                },
            )
            .optional()?)
    }

    fn start_session(&self, identity: &Identity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session (slot, uid, signed_in_at) VALUES (1, ?1, ?2)",
            rusqlite::params![identity.uid, Utc::now().to_rfc3339()],
        )?;
        self.notify(Some(identity));
        Ok(())
    }

    fn record_failure(&self, row: &CredentialRow) -> Result<()> {
        let attempts = row.failed_attempts + 1;
        if attempts >= MAX_FAILED_ATTEMPTS {
            let until = Utc::now() + Duration::minutes(LOCKOUT_MINUTES);
            self.conn.execute(
                "UPDATE credentials SET failed_attempts = 0, locked_until = ?2 WHERE uid = ?1",
                rusqlite::params![row.uid, until.to_rfc3339()],
            )?;
            tracing::warn!(email = %row.email, "sign-in locked after repeated failures");
        } else {
            self.conn.execute(
                "UPDATE credentials SET failed_attempts = ?2 WHERE uid = ?1",
                rusqlite::params![row.uid, attempts],
            )?;
        }
        Ok(())
    }
}

fn is_locked(locked_until: Option<&str>, now: DateTime<Utc>) -> bool {
    locked_until
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or(false, |until| until.with_timezone(&Utc) > now)
}

impl IdentityProvider for LocalIdentity<'_> {
    fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail.into());
        }
        let row = self.find(&email)?.ok_or(AuthError::UserNotFound)?;
        if is_locked(row.locked_until.as_deref(), Utc::now()) {
            return Err(AuthError::TooManyRequests.into());
        }
        // an unreadable stored hash counts as a mismatch
        if !bcrypt::verify(password, &row.password_hash).unwrap_or(false) {
            self.record_failure(&row)?;
            return Err(AuthError::WrongPassword.into());
        }
        self.conn.execute(
            "UPDATE credentials SET failed_attempts = 0, locked_until = NULL WHERE uid = ?1",
            [&row.uid],
        )?;
        let identity = Identity {
            uid: row.uid,
            email: row.email,
        };
        self.start_session(&identity)?;
        tracing::info!(uid = %identity.uid, "signed in");
        Ok(identity)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        if self.find(&email)?.is_some() {
            return Err(AuthError::EmailAlreadyInUse.into());
        }
        let password_hash = bcrypt::hash(password, HASH_COST)?;
        let identity = Identity {
            uid: new_uid(),
            email,
        };
        self.conn.execute(
            "INSERT INTO credentials (uid, email, password_hash) VALUES (?1, ?2, ?3)",
            rusqlite::params![identity.uid, identity.email, password_hash],
        )?;
        self.start_session(&identity)?;
        tracing::info!(uid = %identity.uid, "account created");
        Ok(identity)
    }

    fn sign_out(&self) -> Result<()> {
        let n = self.conn.execute("DELETE FROM session", [])?;
        if n > 0 {
            tracing::info!("signed out");
        }
        self.notify(None);
        Ok(())
    }

    fn current_session(&self) -> Result<Option<Identity>> {
        Ok(self
            .conn
            .query_row(
                "SELECT c.uid, c.email FROM session s JOIN credentials c ON c.uid = s.uid",
                [],
                |row| {
                    Ok(Identity {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn observe(&self, listener: SessionListener) {
        self.listeners.borrow_mut().push(listener);
    }
}

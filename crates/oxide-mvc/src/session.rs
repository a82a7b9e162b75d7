//! Cookie-keyed sessions.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::Application;
use crate::context::Context;
use crate::error::{MvcError, Result};
use crate::middleware::Middleware;

/// A session: a random key plus JSON values, valid until `expire_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session key (64 character hex string).
    pub key: String,
    /// Stored values.
    pub data: HashMap<String, serde_json::Value>,
    /// Expiration timestamp.
    pub expire_date: DateTime<Utc>,
    /// Created during this request rather than loaded from a store.
    #[serde(skip)]
    fresh: bool,
}

impl Session {
    /// Creates an empty session expiring after `max_age`.
    pub fn new(max_age: Duration) -> Self {
        Self {
            key: generate_session_key(),
            data: HashMap::new(),
            expire_date: Utc::now() + max_age,
            fresh: true,
        }
    }

    /// Returns whether this session was started by the current request.
    pub const fn is_new(&self) -> bool {
        self.fresh
    }

    /// Returns whether this session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expire_date
    }

    /// Gets a value.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Sets a value.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be converted to JSON.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.data.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Pushes the expiration `max_age` into the future.
    pub fn extend(&mut self, max_age: Duration) {
        self.expire_date = Utc::now() + max_age;
    }
}

/// Session persistence. Implementations handle their own locking.
pub trait SessionStore: Send + Sync {
    /// Loads a live session.
    ///
    /// # Errors
    ///
    /// Fails when the backend is unavailable.
    fn load(&self, key: &str) -> Result<Option<Session>>;

    /// Saves a session, replacing any previous one with the same key.
    ///
    /// # Errors
    ///
    /// Fails when the backend is unavailable.
    fn save(&self, session: &Session) -> Result<()>;

    /// Deletes a session.
    ///
    /// # Errors
    ///
    /// Fails when the backend is unavailable.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-process session store.
///
/// Expired sessions are swept every [`MemoryStore::SWEEP_INTERVAL`] saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
    saves: AtomicU64,
}

impl MemoryStore {
    /// Number of saves between two sweeps of expired sessions.
    pub const SWEEP_INTERVAL: u64 = 64;

    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.read().map_or(0, |s| s.len())
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops expired sessions, returning how many were removed.
    pub fn clear_expired(&self) -> usize {
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }
}

fn poisoned<T>(_: T) -> MvcError {
    MvcError::Session("session store lock poisoned".to_string())
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(key).filter(|s| !s.is_expired()).cloned())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let count = self.saves.fetch_add(1, Ordering::Relaxed) + 1;
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if count % Self::SWEEP_INTERVAL == 0 {
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_expired());
            debug!(removed = before - sessions.len(), "Swept expired sessions");
        }
        sessions.insert(session.key.clone(), session.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(key);
        Ok(())
    }
}

/// Session settings.
#[derive(Clone)]
pub struct SessionConfig {
    /// Cookie carrying the session key.
    pub cookie_name: String,
    /// Session lifetime, also used as the cookie `Max-Age`.
    pub max_age: Duration,
    /// Where sessions are kept.
    pub store: Arc<dyn SessionStore>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Default session lifetime (2 weeks).
    pub const DEFAULT_EXPIRY_DAYS: i64 = 14;

    /// Creates a configuration with a two-week lifetime.
    pub fn new(cookie_name: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            max_age: Duration::days(Self::DEFAULT_EXPIRY_DAYS),
            store,
        }
    }

    /// Sets the session lifetime.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Fails on an empty or malformed cookie name or a non-positive lifetime.
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(MvcError::Session("cookie name must not be empty".into()));
        }
        if self
            .cookie_name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "()<>@,;:\\\"/[]?={}".contains(c))
        {
            return Err(MvcError::Session(format!(
                "invalid cookie name: {:?}",
                self.cookie_name
            )));
        }
        if self.max_age <= Duration::zero() {
            return Err(MvcError::Session("max age must be positive".into()));
        }
        Ok(())
    }
}

/// Loads the session named by the request cookie before the controller runs
/// and saves it afterwards.
///
/// A session started by the request is only saved, and its cookie only set,
/// once something has been written to it.
///
/// Requires [`crate::Config::session`]; building an application that uses
/// this middleware without it fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionMiddleware;

impl SessionMiddleware {
    fn config(app: &Application) -> Result<&SessionConfig> {
        app.config()
            .session
            .as_ref()
            .ok_or_else(|| MvcError::Session("session middleware requires a session config".into()))
    }
}

impl Middleware for SessionMiddleware {
    fn before(&self, app: &Application, ctx: &mut Context<'_>) -> Result<()> {
        let config = Self::config(app)?;
        let existing = match ctx.request.cookie(&config.cookie_name) {
            Some(key) => config.store.load(key)?,
            None => None,
        };
        let session = existing.unwrap_or_else(|| {
            debug!("Starting new session");
            Session::new(config.max_age)
        });
        ctx.session = Some(session);
        Ok(())
    }

    fn after(&self, app: &Application, ctx: &mut Context<'_>) -> Result<()> {
        let config = Self::config(app)?;
        let Some(session) = ctx.session.as_mut() else {
            warn!("No session to save");
            return Ok(());
        };
        if session.fresh && session.data.is_empty() {
            return Ok(());
        }
        session.fresh = false;
        session.extend(config.max_age);
        config.store.save(session)?;

        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            config.cookie_name,
            session.key,
            config.max_age.num_seconds()
        );
        ctx.response.set_header("Set-Cookie", cookie);
        Ok(())
    }

    fn uses_sessions(&self) -> bool {
        true
    }
}

/// Generates a cryptographically secure session key.
fn generate_session_key() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_generation() {
        let key1 = generate_session_key();
        let key2 = generate_session_key();

        assert_eq!(key1.len(), 64);
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_session_values() {
        let mut session = Session::new(Duration::hours(1));

        session.set("user", &"naoina").unwrap();
        assert_eq!(session.get::<String>("user"), Some("naoina".to_string()));

        session.remove("user");
        assert_eq!(session.get::<String>("user"), None);
    }

    #[test]
    fn test_memory_store_skips_expired() {
        let store = MemoryStore::new();
        let mut session = Session::new(Duration::hours(1));
        store.save(&session).unwrap();
        assert!(store.load(&session.key).unwrap().is_some());

        session.expire_date = Utc::now() - Duration::days(1);
        store.save(&session).unwrap();
        assert!(store.load(&session.key).unwrap().is_none());
        assert_eq!(store.clear_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_sweeps_on_save() {
        let store = MemoryStore::new();
        for _ in 0..1000 {
            let mut session = Session::new(Duration::hours(1));
            session.expire_date = Utc::now() - Duration::seconds(1);
            store.save(&session).unwrap();
        }
        assert!(store.len() <= usize::try_from(MemoryStore::SWEEP_INTERVAL).unwrap());

        let live = Session::new(Duration::hours(1));
        store.save(&live).unwrap();
        for _ in 0..MemoryStore::SWEEP_INTERVAL {
            store.save(&live).unwrap();
        }
        assert!(store.load(&live.key).unwrap().is_some());
    }

    #[test]
    fn test_loaded_session_is_not_new() {
        let store = MemoryStore::new();
        let mut session = Session::new(Duration::hours(1));
        assert!(session.is_new());
        session.set("user", &1).unwrap();
        session.fresh = false;
        store.save(&session).unwrap();
        assert!(!store.load(&session.key).unwrap().unwrap().is_new());
    }

    #[test]
    fn test_config_validation() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        assert!(SessionConfig::new("sid", store.clone()).validate().is_ok());
        assert!(SessionConfig::new("", store.clone()).validate().is_err());
        assert!(SessionConfig::new("bad name", store.clone()).validate().is_err());
        assert!(SessionConfig::new("sid", store)
            .max_age(Duration::zero())
            .validate()
            .is_err());
    }
}

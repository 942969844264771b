//! Auth session state.
//!
//! A `Session` is created at start-up (optionally from a token file), set by
//! login, checked before every protected command, and cleared on logout or
//! when the backend rejects the token.

use crate::error::ApiError;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct Session {
    token: Option<String>,
    store: Option<PathBuf>,
}

impl Session {
    /// Session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Session backed by `path`. A missing file means signed out.
    pub fn load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let token = match std::fs::read_to_string(&path) {
            Ok(raw) => normalize(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        debug!("Session loaded from {:?} (signed in: {})", path, token.is_some());
        Ok(Self {
            token,
            store: Some(path),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Guard for protected commands.
    pub fn require_token(&self) -> Result<&str, ApiError> {
        self.token().ok_or(ApiError::NotLoggedIn)
    }

    pub fn sign_in(&mut self, token: String) -> io::Result<()> {
        let Some(token) = normalize(token) else {
            return self.sign_out();
        };
        if let Some(path) = &self.store {
            std::fs::write(path, &token)?;
        }
        self.token = Some(token);
        info!("Signed in");
        Ok(())
    }

    pub fn sign_out(&mut self) -> io::Result<()> {
        self.token = None;
        if let Some(path) = &self.store {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        info!("Signed out");
        Ok(())
    }
}

fn normalize(token: String) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::models::{LoginResponse, User};
use crate::settings::get_xdg_data_path;

const SESSION_FILE_NAME: &str = "session.json";

/// An authenticated session. Handed explicitly to whatever needs the token
/// or the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Option<User>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl From<LoginResponse> for Session {
    fn from(login: LoginResponse) -> Self {
        Session::new(login.token, Some(login.user))
    }
}

/// Keeps the token and cached profile on disk, saved and cleared together.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            path: directory.join(SESSION_FILE_NAME),
        }
    }

    pub fn from_env() -> Result<Self> {
        let directory = get_xdg_data_path()
            .context("cannot locate a data directory, set XDG_DATA_HOME or HOME")?;
        Ok(Self::new(directory))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file {}", self.path.display()))?;

        Ok(Some(session).filter(Session::is_logged_in))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("session saved to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
            info!("session cleared");
        }
        Ok(())
    }
}

//! # Local State
//!
//! Keeps what must survive between invocations as JSON files in the state
//! directory: the signed-in session and the last resume the analysis service
//! extracted, so `lumascan match` can run without uploading again.

use anyhow::Result;
use lumascan::types::Session;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

const SESSION_FILE: &str = "session.json";
/// Mode of state files holding tokens.
#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o600;
const LAST_RESUME_FILE: &str = "last_resume.json";
pub const LOG_FILE: &str = "lumascan-cli.log";

/// The resume currently loaded in the workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LastResume {
    pub resume_text: String,
    pub skills: Vec<String>,
    #[serde(default)]
    pub job_title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StateManager {
    dir: PathBuf,
}

impl StateManager {
    /// Opens the state directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn read_session(&self) -> Result<Option<Session>> {
        self.read(SESSION_FILE)
    }

    pub fn write_session(&self, session: &Session) -> Result<()> {
        self.write(SESSION_FILE, session, true)?;
        info!("Persisted session for user {}", session.user.id);
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_FILE)
    }

    pub fn read_last_resume(&self) -> Result<Option<LastResume>> {
        self.read(LAST_RESUME_FILE)
    }

    pub fn write_last_resume(&self, resume: &LastResume) -> Result<()> {
        self.write(LAST_RESUME_FILE, resume, false)
    }

    pub fn clear_last_resume(&self) -> Result<()> {
        self.remove(LAST_RESUME_FILE)
    }

    /// Reads a state file. A missing file is `Ok(None)`; a corrupt one is logged and
    /// treated as missing.
    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        match serde_json::from_reader(reader) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable state file '{}': {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Writes a state file. A `private` file is readable by its owner only.
    fn write<T: Serialize>(&self, name: &str, value: &T, private: bool) -> Result<()> {
        let path = self.dir.join(name);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        if private {
            restrict_to_owner(&mut options, &path)?;
        }

        let writer = BufWriter::new(options.open(&path)?);
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.dir.join(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

// `mode` only applies when the file is created, so an existing file is tightened too.
#[cfg(unix)]
fn restrict_to_owner(options: &mut OpenOptions, path: &Path) -> Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    options.mode(PRIVATE_FILE_MODE);
    if path.exists() {
        fs::set_permissions(path, fs::Permissions::from_mode(PRIVATE_FILE_MODE))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_options: &mut OpenOptions, _path: &Path) -> Result<()> {
    Ok(())
}

/// Configuration for the letter store.
/// Parsed from command-line flags with environment variable fallbacks.

use crate::error::{AppError, Result};
use clap::Args;
use std::path::PathBuf;

pub const DB_FILE_NAME: &str = "chithi.db";
pub const DEFAULT_ADMIN_EMAIL: &str = "superadmin@chithi.local";
pub const DEFAULT_ADMIN_PASSWORD: &str = "chithi-superadmin";

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Directory holding the state database (default: ~/.chithi)
    #[arg(long, env = "CHITHI_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Email that signs in as the built-in superadmin
    #[arg(long, env = "CHITHI_ADMIN_EMAIL", default_value = DEFAULT_ADMIN_EMAIL, global = true)]
    pub admin_email: String,

    /// Password for the built-in superadmin
    #[arg(
        long,
        env = "CHITHI_ADMIN_PASSWORD",
        default_value = DEFAULT_ADMIN_PASSWORD,
        hide_env_values = true,
        global = true
    )]
    pub admin_password: String,

    /// Enable verbose logging (DEBUG level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            verbose: false,
        }
    }
}

impl Config {
    /// Config rooted at an explicit directory
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: Some(dir.into()),
            ..Config::default()
        }
    }

    /// Resolve the data directory, defaulting to ~/.chithi
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        use directories::BaseDirs;
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| AppError::Config("Failed to get home directory".to_string()))?;
        Ok(base_dirs.home_dir().join(".chithi"))
    }

    /// Path of the SQLite database inside the data directory
    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE_NAME))
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

//! Path utilities for routeline data directories

use std::path::PathBuf;

/// Get the base routeline data directory (~/.routeline)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".routeline"))
        .unwrap_or_else(|| PathBuf::from(".routeline"))
}

/// Get the default database file path (~/.routeline/routeline.db)
pub fn database_path() -> PathBuf {
    data_dir().join("routeline.db")
}

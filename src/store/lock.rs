//! Cross-process exclusive lock over stack operations.
//!
//! Held for the duration of any multi-step operation (amend
//! propagation, refresh, restack) so two invocations never mutate the
//! same stack concurrently.

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A lock older than this, held by a dead process, is cleaned up automatically.
const STALE_LOCK_AGE_SECS: u64 = 300;

/// An exclusive lock on stack operations. Released on drop.
#[derive(Debug)]
pub struct OperationLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl OperationLock {
    /// Acquire the lock under `store_root` (`<git-dir>/stack/`), cleaning up
    /// a stale lock from a crashed process first if one is found.
    pub fn acquire(store_root: &Path) -> Result<Self> {
        if !store_root.exists() {
            fs::create_dir_all(store_root)?;
        }

        let lock_path = store_root.join("operation.lock");

        match Self::try_acquire_lock(&lock_path) {
            Ok(lock) => Ok(lock),
            Err(first_error) => {
                if Self::is_lock_stale(&lock_path)? {
                    eprintln!("Cleaning up stale lock from crashed process...");
                    if let Err(e) = fs::remove_file(&lock_path) {
                        eprintln!("Warning: could not remove stale lock: {}", e);
                    }
                    Self::try_acquire_lock(&lock_path)
                } else {
                    Err(first_error)
                }
            }
        }
    }

    fn try_acquire_lock(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(lock_path)
            .with_context(|| format!("failed to create lock file at {:?}", lock_path))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                let mut file_clone = file.try_clone()?;
                let timestamp = SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                writeln!(file_clone, "{}:{}", std::process::id(), timestamp)?;

                Ok(Self { file, path: lock_path.to_path_buf() })
            }
            Err(_) => {
                let holder_info = fs::read_to_string(lock_path).unwrap_or_default();
                let holder_pid = holder_info.split(':').next().unwrap_or("").trim();

                bail!(
                    "Another stack operation is in progress{}.\n\n\
                     If this is incorrect (e.g. after a crash), delete the lock file:\n  rm {:?}",
                    if !holder_pid.is_empty() { format!(" (PID: {})", holder_pid) } else { String::new() },
                    lock_path
                );
            }
        }
    }

    fn is_lock_stale(lock_path: &Path) -> Result<bool> {
        if !lock_path.exists() {
            return Ok(false);
        }

        let content = fs::read_to_string(lock_path).unwrap_or_default();
        let parts: Vec<&str> = content.trim().split(':').collect();

        let holder_pid: u32 = parts.first().and_then(|s| s.parse().ok()).unwrap_or(0);
        let lock_timestamp: u64 = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);

        if holder_pid == 0 {
            return Ok(false);
        }

        if is_process_running(holder_pid) {
            return Ok(false);
        }

        if lock_timestamp > 0 {
            let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
            let age = now.saturating_sub(lock_timestamp);
            if age < STALE_LOCK_AGE_SECS {
                return Ok(false);
            }
        }

        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn read_content(&self) -> Result<String> {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(0))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_running(_pid: u32) -> bool {
    true
}

impl Drop for OperationLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_lock_file_with_pid() {
        let dir = tempdir().unwrap();
        let lock = OperationLock::acquire(dir.path()).unwrap();
        assert!(lock.read_content().unwrap().starts_with(&std::process::id().to_string()));
    }

    #[test]
    fn drop_removes_lock_file() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join("operation.lock");
        let lock = OperationLock::acquire(dir.path()).unwrap();
        assert!(lock_path.exists());
        drop(lock);
        assert!(!lock_path.exists());
    }
}

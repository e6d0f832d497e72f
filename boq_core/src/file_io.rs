//! # Project Files
//!
//! A `.boq` file is one project serialized as JSON. Estimators add recipes and
//! walls one command at a time, so every edit is a short locked
//! read-modify-write:
//!
//! ```text
//! update_project(path, user, edit)
//!   EditLock::acquire   exclusive OS lock on `<file>.lock`
//!   load_project        parse + schema check
//!   edit(&mut project)
//!   save_project        write `<file>.tmp`, fsync, rename over `<file>`
//!   drop(EditLock)
//! ```
//!
//! Reads never take the lock. A reader sees either the previous or the new
//! file because saves replace it with a rename.
//!
//! ## Example
//!
//! ```rust,no_run
//! use boq_core::file_io::{create_project, update_project};
//! use boq_core::project::Project;
//! use std::path::Path;
//!
//! let path = Path::new("fitout.boq");
//! create_project(&Project::new("Estimator", "FO-001", "Client"), path).unwrap();
//! update_project(path, "estimator@studio.in", |project| {
//!     project.settings.currency = "INR".to_string();
//!     Ok(())
//! })
//! .unwrap();
//! ```

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{EstimateError, EstimateResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Who is saving changes to a project, as recorded in its lock file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockHolder {
    pub user: String,
    pub since: DateTime<Utc>,
}

/// Exclusive edit lock on one project file.
///
/// The lock is the OS lock (`fs2`) on the `<file>.lock` sidecar, so it goes
/// away with the process that held it and there is never a stale lock to
/// clean up. The sidecar itself is left on disk; its holder record is only
/// meaningful while the OS lock is held.
pub struct EditLock {
    file: File,
    path: PathBuf,
    holder: LockHolder,
}

impl EditLock {
    /// Take the edit lock, or fail with `ProjectBusy` naming the current holder.
    ///
    /// Never blocks: a second estimator gets an answer immediately.
    pub fn acquire(project_path: &Path, user: impl Into<String>) -> EstimateResult<Self> {
        let path = sidecar(project_path, "lock");
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(EstimateError::io("open lock", &path))?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_holder(&mut file);
            return Err(busy(project_path, holder));
        }

        let holder = LockHolder {
            user: user.into(),
            since: Utc::now(),
        };
        // The previous holder's record is only overwritten once the lock is ours
        write_holder(&mut file, &holder).map_err(EstimateError::io("write lock", &path))?;

        info!(path = %project_path.display(), user = %holder.user, "acquired edit lock");
        Ok(EditLock { file, path, holder })
    }

    /// Current holder of the edit lock on `project_path`, if it is held
    pub fn holder_of(project_path: &Path) -> Option<LockHolder> {
        let mut file = File::open(sidecar(project_path, "lock")).ok()?;
        if file.try_lock_shared().is_ok() {
            let _ = file.unlock();
            return None;
        }
        Some(read_holder(&mut file).unwrap_or_else(|| LockHolder {
            user: "another session".to_string(),
            since: Utc::now(),
        }))
    }

    pub fn holder(&self) -> &LockHolder {
        &self.holder
    }
}

impl Drop for EditLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %e, "failed to release edit lock");
        }
        debug!(path = %self.path.display(), "released edit lock");
    }
}

fn busy(project_path: &Path, holder: Option<LockHolder>) -> EstimateError {
    let (held_by, since) = match holder {
        Some(h) => (h.user, h.since.to_rfc3339()),
        None => ("another session".to_string(), "unknown".to_string()),
    };
    EstimateError::project_busy(project_path.display().to_string(), held_by, since)
}

fn read_holder(file: &mut File) -> Option<LockHolder> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_holder(file: &mut File, holder: &LockHolder) -> io::Result<()> {
    let json = serde_json::to_vec(holder).map_err(io::Error::other)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&json)?;
    file.sync_data()
}

/// `fitout.boq` → `fitout.boq.<suffix>` in the same directory
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("project"));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Save a project by writing `<file>.tmp`, syncing it and renaming it over
/// `path`. On failure the previous file is untouched and the temp file removed.
pub fn save_project(project: &Project, path: &Path) -> EstimateResult<()> {
    let json = serde_json::to_vec_pretty(project).map_err(EstimateError::serialization)?;
    let tmp = sidecar(path, "tmp");

    if let Err(e) = write_synced(&tmp, &json).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(EstimateError::io("save", path)(e));
    }

    info!(path = %path.display(), items = project.item_count(), "saved project");
    Ok(())
}

/// Write a new project file; fails if `path` already exists.
pub fn create_project(project: &Project, path: &Path) -> EstimateResult<()> {
    // Claim the name first so two `new` commands cannot both succeed
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(EstimateError::io("create", path))?;
    save_project(project, path)
}

/// Load a project and check that its schema version can be read.
pub fn load_project(path: &Path) -> EstimateResult<Project> {
    let contents = fs::read_to_string(path).map_err(EstimateError::io("read", path))?;
    let project: Project = serde_json::from_str(&contents)
        .map_err(|e| EstimateError::serialization(format!("{}: {}", path.display(), e)))?;
    check_schema(&project.meta.version)?;

    debug!(path = %path.display(), items = project.item_count(), "loaded project");
    Ok(project)
}

/// Load a project for reading and report who, if anyone, is editing it.
pub fn load_project_with_holder(path: &Path) -> EstimateResult<(Project, Option<LockHolder>)> {
    let project = load_project(path)?;
    Ok((project, EditLock::holder_of(path)))
}

/// Lock, load, edit and save a project in one step.
///
/// Nothing is written when `edit` fails. The lock is released on return.
pub fn update_project<T>(
    path: &Path,
    user: impl Into<String>,
    edit: impl FnOnce(&mut Project) -> EstimateResult<T>,
) -> EstimateResult<T> {
    let lock = EditLock::acquire(path, user)?;
    let mut project = load_project(path)?;
    let out = edit(&mut project)?;
    project.touch();
    save_project(&project, path)?;
    debug!(path = %path.display(), user = %lock.holder().user, "updated project");
    Ok(out)
}

/// `"0.1.0"` → `(0, 1)`; a missing minor reads as 0
fn major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

/// Majors must match; while on 0.x a newer minor may have breaking changes.
fn check_schema(file_version: &str) -> EstimateResult<()> {
    let readable = match (major_minor(file_version), major_minor(SCHEMA_VERSION)) {
        (Some((file_major, file_minor)), Some((major, minor))) => {
            file_major == major && !(major == 0 && file_minor > minor)
        }
        _ => false,
    };
    if readable {
        Ok(())
    } else {
        Err(EstimateError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{BoqItem, WallItem, WallSpec, WallType};
    use std::env::temp_dir;

    fn temp_project_path(name: &str) -> PathBuf {
        temp_dir().join(format!("boq_test_{}_{}.boq", name, std::process::id()))
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
        let _ = fs::remove_file(sidecar(path, "lock"));
    }

    fn wall(label: &str) -> BoqItem {
        BoqItem::Wall(WallItem {
            label: label.to_string(),
            wall: WallSpec::new(WallType::Plywood, 12.0, 9.0, ""),
        })
    }

    #[test]
    fn test_sidecar_paths() {
        let path = Path::new("/jobs/fitout.boq");
        assert_eq!(sidecar(path, "lock"), Path::new("/jobs/fitout.boq.lock"));
        assert_eq!(sidecar(path, "tmp"), Path::new("/jobs/fitout.boq.tmp"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_project_path("roundtrip");

        let mut project = Project::new("Test Estimator", "TEST-001", "Test Client");
        project.add_item(BoqItem::Wall(WallItem {
            label: "W-1".to_string(),
            wall: WallSpec::new(WallType::Civil, 10.0, 8.0, "9 inch"),
        }));
        save_project(&project, &path).unwrap();
        assert!(!sidecar(&path, "tmp").exists());

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "TEST-001");
        assert_eq!(loaded.item_count(), 1);

        cleanup(&path);
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let path = temp_project_path("create");
        cleanup(&path);

        create_project(&Project::new("A", "JOB-A", "Client"), &path).unwrap();
        let err = create_project(&Project::new("B", "JOB-B", "Client"), &path).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert_eq!(load_project(&path).unwrap().meta.job_id, "JOB-A");

        cleanup(&path);
    }

    #[test]
    fn test_second_editor_is_told_who_holds_the_lock() {
        let path = temp_project_path("busy");
        save_project(&Project::default(), &path).unwrap();

        let lock = EditLock::acquire(&path, "asha@studio.in").unwrap();
        assert_eq!(lock.holder().user, "asha@studio.in");
        assert_eq!(EditLock::holder_of(&path).map(|h| h.user).as_deref(), Some("asha@studio.in"));

        match EditLock::acquire(&path, "ravi@studio.in") {
            Err(EstimateError::ProjectBusy { held_by, .. }) => assert_eq!(held_by, "asha@studio.in"),
            Err(other) => panic!("expected ProjectBusy, got {:?}", other),
            Ok(_) => panic!("second lock should fail"),
        }

        drop(lock);
        assert!(EditLock::holder_of(&path).is_none());
        let relock = EditLock::acquire(&path, "ravi@studio.in").unwrap();
        assert_eq!(relock.holder().user, "ravi@studio.in");

        drop(relock);
        cleanup(&path);
    }

    #[test]
    fn test_leftover_lock_file_does_not_block() {
        let path = temp_project_path("leftover");
        save_project(&Project::default(), &path).unwrap();
        // Left behind by a session that crashed mid-edit
        fs::write(sidecar(&path, "lock"), "not json").unwrap();

        assert!(EditLock::holder_of(&path).is_none());
        let lock = EditLock::acquire(&path, "test@example.com").unwrap();
        assert_eq!(lock.holder().user, "test@example.com");

        drop(lock);
        cleanup(&path);
    }

    #[test]
    fn test_update_project() {
        let path = temp_project_path("update");
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        let id = update_project(&path, "test@example.com", |project| Ok(project.add_item(wall("W-9")))).unwrap();

        let (loaded, holder) = load_project_with_holder(&path).unwrap();
        assert_eq!(loaded.get_item(&id).map(|i| i.label()), Some("W-9"));
        assert!(holder.is_none());

        cleanup(&path);
    }

    #[test]
    fn test_update_while_busy_leaves_file_alone() {
        let path = temp_project_path("update_busy");
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        let lock = EditLock::acquire(&path, "asha@studio.in").unwrap();
        let err = update_project(&path, "ravi@studio.in", |project| Ok(project.add_item(wall("W-1")))).unwrap_err();
        assert_eq!(err.error_code(), "PROJECT_BUSY");
        assert!(err.is_recoverable());
        drop(lock);

        assert_eq!(load_project(&path).unwrap().item_count(), 0);
        cleanup(&path);
    }

    #[test]
    fn test_failed_edit_is_not_saved() {
        let path = temp_project_path("update_fail");
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        let result: EstimateResult<()> = update_project(&path, "test@example.com", |project| {
            project.add_item(wall("W-1"));
            Err(EstimateError::invalid_input("label", "", "Label is required"))
        });
        assert!(result.is_err());
        assert_eq!(load_project(&path).unwrap().item_count(), 0);

        cleanup(&path);
    }

    #[test]
    fn test_schema_check() {
        assert!(check_schema(SCHEMA_VERSION).is_ok());
        assert!(check_schema("0.1.5").is_ok());
        assert!(check_schema("0.1").is_ok());
        assert!(check_schema("0.0.9").is_ok());
        assert!(check_schema("0.2.0").is_err());
        assert!(check_schema("1.0.0").is_err());
        assert!(check_schema("garbage").is_err());
        assert!(check_schema("").is_err());
    }

    #[test]
    fn test_newer_schema_is_rejected_on_load() {
        let path = temp_project_path("newer");
        let mut project = Project::default();
        project.meta.version = "0.9.0".to_string();
        save_project(&project, &path).unwrap();

        assert_eq!(load_project(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
        cleanup(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_project(Path::new("/nonexistent/dir/none.boq")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}

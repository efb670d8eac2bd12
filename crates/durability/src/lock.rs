//! Directory-scoped exclusive lock
//!
//! Every read-modify-write sequence on a model version directory runs under
//! its [`DirLock`]. The lock is:
//!
//! - **Reentrant** for the owning thread, so a locked save can call the
//!   locked metadata update without deadlocking.
//! - **Exclusive** across threads of the process: all `DirLock`s for the same
//!   directory share one state through a global registry.
//! - **Advisory across processes**: the outermost acquisition takes an
//!   exclusive `flock`-style lock on `<dir>/.lock` via `fs2`.
//!
//! There is no timeout; callers that need bounded waiting must wrap it.

use fs2::FileExt;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::trace;

use crate::paths::LOCK_FILE_NAME;

/// Process-wide registry of lock states (directory -> weak reference)
static LOCK_STATES: Lazy<Mutex<HashMap<PathBuf, Weak<LockState>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Default)]
struct Held {
    depth: usize,
    file: Option<File>,
}

struct LockState {
    dir: PathBuf,
    inner: ReentrantMutex<RefCell<Held>>,
}

/// Exclusive lock over one model version directory.
#[derive(Clone)]
pub struct DirLock {
    state: Arc<LockState>,
}

impl std::fmt::Debug for DirLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirLock")
            .field("dir", &self.state.dir)
            .finish()
    }
}

impl DirLock {
    /// Lock handle for `dir`. Cheap; nothing is touched on disk until `acquire`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        // Canonicalize path for consistent registry keys
        let dir = canonical_dir(dir.as_ref());
        let mut registry = LOCK_STATES.lock();

        if let Some(state) = registry.get(&dir).and_then(Weak::upgrade) {
            return Self { state };
        }

        registry.retain(|_, weak| weak.strong_count() > 0);
        let state = Arc::new(LockState {
            dir: dir.clone(),
            inner: ReentrantMutex::new(RefCell::new(Held::default())),
        });
        registry.insert(dir, Arc::downgrade(&state));
        Self { state }
    }

    /// Directory guarded by this lock
    pub fn dir(&self) -> &Path {
        &self.state.dir
    }

    /// Block until the lock is held by the current thread.
    ///
    /// Creates the directory and its `.lock` marker if needed.
    pub fn acquire(&self) -> io::Result<DirLockGuard<'_>> {
        let guard = self.state.inner.lock();
        {
            let mut held = guard.borrow_mut();
            if held.depth == 0 {
                std::fs::create_dir_all(&self.state.dir)?;
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .read(true)
                    .write(true)
                    .open(self.state.dir.join(LOCK_FILE_NAME))?;
                file.lock_exclusive()?;
                trace!(target: "modelstore::lock", dir = %self.state.dir.display(), "Lock acquired");
                held.file = Some(file);
            }
            held.depth += 1;
        }
        Ok(DirLockGuard { guard })
    }

    /// Whether the current thread holds this lock
    pub fn is_held(&self) -> bool {
        let Some(guard) = self.state.inner.try_lock() else {
            return false;
        };
        let depth = guard.borrow().depth;
        depth > 0
    }
}

/// Canonical form of `dir`, which may not exist yet.
///
/// The deepest existing ancestor is canonicalized and the remaining
/// components are appended lexically.
fn canonical_dir(dir: &Path) -> PathBuf {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(dir),
            Err(_) => return dir.to_path_buf(),
        }
    };

    for base in absolute.ancestors() {
        let Ok(canonical) = base.canonicalize() else {
            continue;
        };
        let Ok(rest) = absolute.strip_prefix(base) else {
            continue;
        };
        let mut resolved = canonical;
        for component in rest.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                other => resolved.push(other),
            }
        }
        return resolved;
    }
    absolute
}

/// RAII guard; the lock is released when the outermost guard drops.
pub struct DirLockGuard<'a> {
    guard: ReentrantMutexGuard<'a, RefCell<Held>>,
}

impl Drop for DirLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.guard.borrow_mut();
        held.depth -= 1;
        if held.depth == 0 {
            if let Some(file) = held.file.take() {
                let _ = file.unlock();
                trace!(target: "modelstore::lock", "Lock released");
            }
        }
    }
}

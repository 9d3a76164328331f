//! Everything a command needs, built once at the application root and passed
//! down by reference.

use crate::blobs::{BlobStore, FsBlobStore};
use crate::clock::{Clock, SystemClock};
use crate::db::SqliteStore;
use crate::error::Result;
use crate::kv::{FileKv, KeyValueStore};
use crate::settings::Settings;
use crate::store::DocumentStore;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

pub struct AppContext {
    pub identity: Identity,
    pub settings: Settings,
    pub store: Box<dyn DocumentStore>,
    pub blobs: Box<dyn BlobStore>,
    /// `None` when local storage could not be opened; drafts then live only
    /// for the current process.
    pub kv: Option<Box<dyn KeyValueStore>>,
    pub clock: Box<dyn Clock>,
}

impl AppContext {
    /// Wire the local SQLite/filesystem implementations for `settings`.
    pub fn open(settings: Settings) -> Result<Self> {
        let data_dir = settings.data_path();
        let store = SqliteStore::open(&settings.db_path())?;
        let blobs = FsBlobStore::new(&data_dir.join("blobs"));
        let kv: Option<Box<dyn KeyValueStore>> =
            match FileKv::open(&data_dir.join("local_storage.json")) {
                Ok(kv) => Some(Box::new(kv)),
                Err(e) => {
                    tracing::warn!(error = %e, "local storage unavailable; drafts will not persist");
                    None
                }
            };
        let identity = Identity {
            id: settings.user_id.clone(),
            email: settings.email.clone(),
        };
        Ok(Self {
            identity,
            settings,
            store: Box::new(store),
            blobs: Box::new(blobs),
            kv,
            clock: Box::new(SystemClock),
        })
    }

    pub fn kv(&self) -> Option<&dyn KeyValueStore> {
        self.kv.as_deref()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::test_store;
    use crate::kv::MemoryKv;

    /// A context over a temp SQLite store, temp blobs, memory kv and the given
    /// clock. The returned directory must outlive the context.
    pub fn test_context(clock: &FixedClock) -> (tempfile::TempDir, AppContext) {
        let (dir, store) = test_store();
        let blobs = FsBlobStore::new(&dir.path().join("blobs"));
        let settings = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            user_id: "user-1".into(),
            email: "citizen@example.org".into(),
            ..Settings::default()
        };
        let ctx = AppContext {
            identity: Identity {
                id: "user-1".into(),
                email: "citizen@example.org".into(),
            },
            settings,
            store: Box::new(store),
            blobs: Box::new(blobs),
            kv: Some(Box::new(MemoryKv::new())),
            clock: Box::new(clock.clone()),
        };
        (dir, ctx)
    }
}

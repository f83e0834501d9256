use super::KeyValueStore;
use crate::error::AppError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "timerbox";
const DATA_DIR_ENV_VAR: &str = "TIMERBOX_DATA_DIR";

/// Directory holding the stored collections and, by default, exports.
pub fn data_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(DATA_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self::new(data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::io(format!("{}: {}", path.display(), err))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| AppError::io(err.to_string()))?;

        let path = self.path_for(key);
        tokio::fs::write(&path, value)
            .await
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&path, permissions)
                .await
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use crate::storage::{KeyValueStore, load_collection, save_collection};
    use crate::model::{HistoryEntry, NewHistoryEntry};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("timerbox-{nanos}-{name}"))
    }

    fn entry(id: &str) -> HistoryEntry {
        NewHistoryEntry {
            timer_id: "timer-1".to_string(),
            timer_name: "Pushups".to_string(),
            category: "Workout".to_string(),
            duration: 30,
            completed_at: "2025-12-20T00:00:30Z".to_string(),
        }
        .into_entry(id.to_string())
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let store = FileStore::new(temp_dir("missing"));
        assert_eq!(store.get("timers").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_creates_directory_and_file() {
        let dir = temp_dir("create");
        let store = FileStore::new(&dir);

        store.set("timers", "[]").await.unwrap();
        let content = fs::read_to_string(dir.join("timers.json")).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(content, "[]");
    }

    #[tokio::test]
    async fn history_round_trips_through_files() {
        let dir = temp_dir("history");
        let store = FileStore::new(&dir);
        let entries = vec![entry("h-1"), entry("h-2")];

        assert!(save_collection(&store, "timerHistory", &entries).await);
        let loaded: Vec<HistoryEntry> = load_collection(&store, "timerHistory").await;
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, entries);
    }

    #[tokio::test]
    async fn stored_blob_is_a_json_array_with_camel_case_keys() {
        let dir = temp_dir("shape");
        let store = FileStore::new(&dir);

        save_collection(&store, "timerHistory", &[entry("h-1")]).await;
        let content = fs::read_to_string(store.path_for("timerHistory")).unwrap();
        fs::remove_dir_all(&dir).ok();

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["timerName"], "Pushups");
        assert_eq!(value[0]["completedAt"], "2025-12-20T00:00:30Z");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stored_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("perms");
        let store = FileStore::new(&dir);
        store.set("timers", "[]").await.unwrap();
        let mode = fs::metadata(store.path_for("timers"))
            .unwrap()
            .permissions()
            .mode();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(mode & 0o777, 0o600);
    }
}

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::clusters::{ClusterSnapshot, LabelClusters};
use crate::error::PersistError;

/// Default location of the cluster state file.
pub const DEFAULT_STATE_PATH: &str = "./dsu_state.json";

/// Loads and saves [`LabelClusters`] state.
///
/// `load` on an absent resource must return an empty store, not an error.
/// `save` replaces the whole resource.
pub trait ClusterPersistence: Send + Sync {
    fn load(&self) -> Result<LabelClusters, PersistError>;

    fn save(&self, clusters: &LabelClusters) -> Result<(), PersistError>;
}

/// Serializes the structural tables of `clusters` as JSON.
pub fn encode(clusters: &LabelClusters) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec_pretty(&clusters.snapshot()).map_err(|e| PersistError::WriteFailure {
        path: String::new(),
        message: e.to_string(),
    })
}

/// Parses and validates bytes produced by [`encode`].
pub fn decode(data: &[u8]) -> Result<LabelClusters, PersistError> {
    let snap: ClusterSnapshot =
        serde_json::from_slice(data).map_err(|e| PersistError::CorruptState(e.to_string()))?;
    LabelClusters::from_snapshot(snap)
}

/// JSON file backed [`ClusterPersistence`].
///
/// Saves go to a sibling `.tmp` file that is then renamed over the target,
/// so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn write_err(&self, e: impl ToString) -> PersistError {
        PersistError::WriteFailure {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl Default for FilePersistence {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_PATH)
    }
}

impl ClusterPersistence for FilePersistence {
    fn load(&self) -> Result<LabelClusters, PersistError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("dsu: no state at {}, starting empty", self.path.display());
                return Ok(LabelClusters::new());
            }
            Err(e) => {
                return Err(PersistError::ReadFailure {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };

        let clusters = decode(&data).map_err(|e| match e {
            PersistError::CorruptState(msg) => {
                PersistError::CorruptState(format!("{}: {msg}", self.path.display()))
            }
            other => other,
        })?;
        debug!(
            "dsu: loaded {} labels in {} clusters from {}",
            clusters.len(),
            clusters.count_sets(),
            self.path.display()
        );
        Ok(clusters)
    }

    fn save(&self, clusters: &LabelClusters) -> Result<(), PersistError> {
        let data = encode(clusters).map_err(|e| self.write_err(e))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &data).map_err(|e| self.write_err(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.write_err(e));
        }
        debug!(
            "dsu: saved {} labels to {}",
            clusters.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-process [`ClusterPersistence`] holding the last saved bytes.
/// Data is lost on restart. Suitable for testing or ephemeral use.
#[derive(Default)]
pub struct MemoryPersistence {
    data: Mutex<Option<Vec<u8>>>,
    saves: AtomicUsize,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with previously encoded state, as if it had been saved.
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(Some(data)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved state, decoded.
    pub fn saved(&self) -> Option<ClusterSnapshot> {
        let data = self.data.lock();
        data.as_deref()
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }
}

impl ClusterPersistence for MemoryPersistence {
    fn load(&self) -> Result<LabelClusters, PersistError> {
        match self.data.lock().as_deref() {
            Some(bytes) => decode(bytes),
            None => Ok(LabelClusters::new()),
        }
    }

    fn save(&self, clusters: &LabelClusters) -> Result<(), PersistError> {
        let data = encode(clusters)?;
        *self.data.lock() = Some(data);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LabelClusters {
        let c = LabelClusters::new();
        c.union_labels("technical_question", "tech_question");
        c.union_labels("gratitude", "expressing_gratitude");
        c.union_labels("technical_question", "tech_help");
        c.find_or_create("complaint");
        c
    }

    fn assert_same(a: &LabelClusters, b: &LabelClusters) {
        assert_eq!(a.len(), b.len());
        assert_eq!(a.count_sets(), b.count_sets());
        for i in 0..a.len() {
            for j in 0..a.len() {
                assert_eq!(a.connected(i, j), b.connected(i, j), "pair ({i}, {j})");
            }
        }
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("absent.json"));
        let c = p.load().unwrap();
        assert_eq!(c.len(), 0);
        assert!(c.is_empty());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("state.json"));
        let original = sample();
        p.save(&original).unwrap();

        let loaded = p.load().unwrap();
        assert_same(&original, &loaded);
        assert_eq!(loaded.root_label("tech_help"), original.root_label("tech_help"));
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("state.json"));
        p.save(&sample()).unwrap();

        let smaller = LabelClusters::new();
        smaller.find_or_create("only");
        p.save(&smaller).unwrap();

        let loaded = p.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.labels(), vec!["only"]);
    }

    #[test]
    fn load_malformed_json_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = FilePersistence::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistError::CorruptState(_)), "got {err:?}");
    }

    #[test]
    fn load_structurally_invalid_state_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, br#"{"parent":[0,5],"rank":[0,0],"labels":{"a":0,"b":1}}"#).unwrap();
        let err = FilePersistence::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistError::CorruptState(_)), "got {err:?}");
    }

    #[test]
    fn load_directory_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilePersistence::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, PersistError::ReadFailure { .. }), "got {err:?}");
    }

    #[test]
    fn save_into_missing_directory_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("missing").join("state.json"));
        let err = p.save(&sample()).unwrap_err();
        assert!(matches!(err, PersistError::WriteFailure { .. }), "got {err:?}");
    }

    #[test]
    fn serialized_shape_has_only_structural_tables() {
        let data = encode(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["labels", "parent", "rank"]);
    }

    #[test]
    fn memory_persistence_counts_saves() {
        let p = MemoryPersistence::new();
        assert!(p.load().unwrap().is_empty());
        assert!(p.saved().is_none());

        let original = sample();
        p.save(&original).unwrap();
        p.save(&original).unwrap();
        assert_eq!(p.save_count(), 2);
        assert_eq!(p.saved().unwrap().parent.len(), original.len());
        assert_same(&original, &p.load().unwrap());
    }

    #[test]
    fn memory_persistence_with_corrupt_data() {
        let p = MemoryPersistence::with_data(b"[]".to_vec());
        assert!(matches!(p.load(), Err(PersistError::CorruptState(_))));
    }
}

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Serialized form of [`LabelClusters`].
///
/// Only the structural tables are stored. The reverse `index -> label`
/// table is rebuilt from `labels` on restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub parent: Vec<usize>,
    pub rank: Vec<u32>,
    pub labels: BTreeMap<String, usize>,
}

struct ClustersInner {
    parent: Vec<usize>,
    rank: Vec<u32>,
    index: HashMap<String, usize>,
    labels: Vec<String>,
}

impl ClustersInner {
    fn empty() -> Self {
        Self {
            parent: Vec::new(),
            rank: Vec::new(),
            index: HashMap::new(),
            labels: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.parent.len()
    }

    fn push(&mut self, label: &str) -> usize {
        let idx = self.parent.len();
        self.parent.push(idx);
        self.rank.push(0);
        self.index.insert(label.to_string(), idx);
        self.labels.push(label.to_string());
        idx
    }

    fn find_or_create(&mut self, label: &str) -> usize {
        match self.index.get(label) {
            Some(&idx) => self.find(idx),
            None => self.push(label),
        }
    }

    /// Root lookup without compression, usable under a read lock.
    fn root_of(&self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        root
    }

    /// Two passes: locate the root, then point every node on the path at it.
    fn find(&mut self, x: usize) -> usize {
        let root = self.root_of(x);
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) -> bool {
        if x >= self.len() || y >= self.len() {
            return false;
        }
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            Ordering::Greater => self.parent[root_y] = root_x,
            Ordering::Less => self.parent[root_x] = root_y,
            Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
        true
    }
}

/// Disjoint-set forest over labels.
///
/// Indices are assigned in insertion order and never reused. Every method
/// that may compress paths takes the write lock; pure reads share the read
/// lock. Safe for concurrent use.
pub struct LabelClusters {
    inner: RwLock<ClustersInner>,
}

impl LabelClusters {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ClustersInner::empty()),
        }
    }

    /// Returns the root index of `label`'s set, adding the label as a new
    /// singleton if it has never been seen.
    pub fn find_or_create(&self, label: &str) -> usize {
        self.inner.write().find_or_create(label)
    }

    /// Returns the root index of the set containing `index`, compressing
    /// the path on the way. `None` if the index was never assigned.
    pub fn find(&self, index: usize) -> Option<usize> {
        let mut inner = self.inner.write();
        if index >= inner.len() {
            return None;
        }
        Some(inner.find(index))
    }

    /// Merges the sets containing `i` and `j`.
    ///
    /// The root with strictly greater rank becomes the parent. On equal rank
    /// `i`'s root wins and its rank grows by one. Returns `false` when the
    /// two are already joined or either index is unknown.
    pub fn union(&self, i: usize, j: usize) -> bool {
        self.inner.write().union(i, j)
    }

    /// Finds or creates both labels and merges their sets under a single
    /// lock acquisition. `a` takes the role of `i` in [`union`](Self::union).
    pub fn union_labels(&self, a: &str, b: &str) -> bool {
        let mut inner = self.inner.write();
        let i = inner.find_or_create(a);
        let j = inner.find_or_create(b);
        inner.union(i, j)
    }

    /// Reports whether two indices belong to the same set.
    pub fn connected(&self, i: usize, j: usize) -> bool {
        let inner = self.inner.read();
        if i >= inner.len() || j >= inner.len() {
            return false;
        }
        inner.root_of(i) == inner.root_of(j)
    }

    /// Reverse lookup from index to label.
    pub fn label(&self, index: usize) -> Option<String> {
        self.inner.read().labels.get(index).cloned()
    }

    /// Returns the index assigned to `label`, if any. This is the label's
    /// own index, not its root.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.inner.read().index.get(label).copied()
    }

    /// Returns the canonical label of `label`'s cluster, adding `label` as a
    /// singleton if it is new.
    pub fn root_label(&self, label: &str) -> String {
        let mut inner = self.inner.write();
        let root = inner.find_or_create(label);
        inner
            .labels
            .get(root)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    /// All labels in index order.
    pub fn labels(&self) -> Vec<String> {
        self.inner.read().labels.clone()
    }

    /// Number of distinct labels ever added.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct clusters. O(n) in the number of labels.
    pub fn count_sets(&self) -> usize {
        let inner = self.inner.read();
        inner
            .parent
            .iter()
            .enumerate()
            .filter(|&(i, &p)| i == p)
            .count()
    }

    /// Copies the structural tables out for serialization.
    pub fn snapshot(&self) -> ClusterSnapshot {
        let inner = self.inner.read();
        ClusterSnapshot {
            parent: inner.parent.clone(),
            rank: inner.rank.clone(),
            labels: inner
                .index
                .iter()
                .map(|(label, &idx)| (label.clone(), idx))
                .collect(),
        }
    }

    /// Rebuilds a store from a snapshot, rejecting structurally invalid data.
    pub fn from_snapshot(snap: ClusterSnapshot) -> Result<Self, PersistError> {
        let n = snap.parent.len();
        if snap.rank.len() != n {
            return Err(PersistError::CorruptState(format!(
                "parent has {n} entries but rank has {}",
                snap.rank.len()
            )));
        }
        if snap.labels.len() != n {
            return Err(PersistError::CorruptState(format!(
                "parent has {n} entries but {} labels are mapped",
                snap.labels.len()
            )));
        }

        let mut slots: Vec<Option<String>> = vec![None; n];
        for (label, &idx) in &snap.labels {
            let Some(slot) = slots.get_mut(idx) else {
                return Err(PersistError::CorruptState(format!(
                    "label {label:?} maps to out-of-range index {idx}"
                )));
            };
            if let Some(prev) = slot {
                return Err(PersistError::CorruptState(format!(
                    "labels {prev:?} and {label:?} share index {idx}"
                )));
            }
            *slot = Some(label.clone());
        }
        // Equal counts and no shared slot means every index is filled.
        let labels: Vec<String> = slots.into_iter().flatten().collect();

        if let Some((i, &p)) = snap.parent.iter().enumerate().find(|&(_, &p)| p >= n) {
            return Err(PersistError::CorruptState(format!(
                "parent[{i}] = {p} is out of range"
            )));
        }
        for start in 0..n {
            let mut cur = start;
            let mut steps = 0;
            while snap.parent[cur] != cur {
                cur = snap.parent[cur];
                steps += 1;
                if steps > n {
                    return Err(PersistError::CorruptState(format!(
                        "parent chain from {start} never reaches a root"
                    )));
                }
            }
        }

        let index = snap.labels.into_iter().collect();
        Ok(Self {
            inner: RwLock::new(ClustersInner {
                parent: snap.parent,
                rank: snap.rank,
                index,
                labels,
            }),
        })
    }
}

impl Default for LabelClusters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LabelClusters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelClusters")
            .field("labels", &self.len())
            .field("sets", &self.count_sets())
            .finish()
    }
}

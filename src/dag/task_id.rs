// src/dag/task_id.rs

//! Task identifiers and identifier sets.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Unique identifier of a task within one [`Flow`](crate::dag::Flow).
///
/// Cloning is cheap; the name is shared.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(Arc<str>);

impl TaskId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<&str> for TaskId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TaskId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for TaskId {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&TaskId> for TaskId {
    fn from(id: &TaskId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A set of [`TaskId`]s.
///
/// Only membership matters. Iteration is in lexical order so that log output
/// and snapshots are stable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TaskIds(BTreeSet<TaskId>);

impl TaskIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an id; returns `false` if it was already present.
    pub fn insert(&mut self, id: impl Into<TaskId>) -> bool {
        self.0.insert(id.into())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskId> {
        self.0.iter()
    }

    /// Ids present in `self` but not in `other`.
    pub fn difference(&self, other: &TaskIds) -> TaskIds {
        self.0.difference(&other.0).cloned().collect()
    }

    pub fn is_disjoint(&self, other: &TaskIds) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Ids as plain strings, mostly for assertions and log fields.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(TaskId::as_str).collect()
    }
}

impl fmt::Debug for TaskIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<T: Into<TaskId>> FromIterator<T> for TaskIds {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<TaskId>> Extend<T> for TaskIds {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for TaskIds {
    type Item = TaskId;
    type IntoIter = std::collections::btree_set::IntoIter<TaskId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TaskIds {
    type Item = &'a TaskId;
    type IntoIter = std::collections::btree_set::Iter<'a, TaskId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_inserts_collapse() {
        let mut ids = TaskIds::new();
        assert!(ids.insert("a"));
        assert!(!ids.insert("a"));
        assert!(ids.insert(String::from("b")));
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.names(), vec!["a", "b"]);
    }

    #[test]
    fn difference_and_disjoint() {
        let all: TaskIds = ["a", "b", "c"].into_iter().collect();
        let some: TaskIds = ["b"].into_iter().collect();

        assert_eq!(all.difference(&some).names(), vec!["a", "c"]);
        assert!(!all.is_disjoint(&some));
        assert!(all.difference(&some).is_disjoint(&some));
    }

    #[test]
    fn debug_prints_like_strings() {
        let id = TaskId::from("deploy");
        assert_eq!(format!("{id:?}"), "\"deploy\"");
        assert_eq!(id.to_string(), "deploy");
        assert!(id == "deploy");
    }
}

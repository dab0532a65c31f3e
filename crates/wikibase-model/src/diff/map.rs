//! Keyed diff operations.

use std::collections::BTreeMap;

use tracing::debug;

/// A single change to the value under one key.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOp<T> {
    Add(T),
    Remove(T),
    Change { old: T, new: T },
}

impl<T> DiffOp<T> {
    /// Returns the operation's kind as used in the array format.
    pub fn kind(&self) -> &'static str {
        match self {
            DiffOp::Add(_) => "add",
            DiffOp::Remove(_) => "remove",
            DiffOp::Change { .. } => "change",
        }
    }

    /// Value before the operation; `None` for additions.
    pub fn old_value(&self) -> Option<&T> {
        match self {
            DiffOp::Add(_) => None,
            DiffOp::Remove(old) | DiffOp::Change { old, .. } => Some(old),
        }
    }

    /// Value after the operation; `None` for removals.
    pub fn new_value(&self) -> Option<&T> {
        match self {
            DiffOp::Remove(_) => None,
            DiffOp::Add(new) | DiffOp::Change { new, .. } => Some(new),
        }
    }

    /// The operation that undoes this one.
    pub fn reverse(self) -> Self {
        match self {
            DiffOp::Add(value) => DiffOp::Remove(value),
            DiffOp::Remove(value) => DiffOp::Add(value),
            DiffOp::Change { old, new } => DiffOp::Change { old: new, new: old },
        }
    }
}

/// Diff operations keyed by language code, site id or claim key.
///
/// Keys are kept sorted so that diffs compare and serialize
/// deterministically.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDiff<T> {
    ops: BTreeMap<String, DiffOp<T>>,
}

impl<T> Default for MapDiff<T> {
    fn default() -> Self {
        Self { ops: BTreeMap::new() }
    }
}

impl<T: Clone + PartialEq> MapDiff<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the operations turning `old` into `new`.
    ///
    /// Keys present on both sides with equal values produce no operation.
    pub fn between<'a>(
        old: impl IntoIterator<Item = (&'a str, &'a T)>,
        new: impl IntoIterator<Item = (&'a str, &'a T)>,
    ) -> Self
    where
        T: 'a,
    {
        let old: BTreeMap<&str, &T> = old.into_iter().collect();
        let new: BTreeMap<&str, &T> = new.into_iter().collect();
        let mut diff = Self::new();

        for (key, old_value) in &old {
            match new.get(key) {
                None => diff.insert(*key, DiffOp::Remove((*old_value).clone())),
                Some(new_value) if new_value != old_value => diff.insert(
                    *key,
                    DiffOp::Change {
                        old: (*old_value).clone(),
                        new: (*new_value).clone(),
                    },
                ),
                Some(_) => {}
            }
        }
        for (key, new_value) in &new {
            if !old.contains_key(key) {
                diff.insert(*key, DiffOp::Add((*new_value).clone()));
            }
        }
        diff
    }

    /// Sets the operation for a key, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, op: DiffOp<T>) {
        self.ops.insert(key.into(), op);
    }

    pub fn get(&self, key: &str) -> Option<&DiffOp<T>> {
        self.ops.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<DiffOp<T>> {
        self.ops.remove(key)
    }

    /// Iterates operations sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiffOp<T>)> {
        self.ops.iter().map(|(k, op)| (k.as_str(), op))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    pub fn additions(&self) -> impl Iterator<Item = (&str, &T)> {
        self.iter().filter_map(|(k, op)| match op {
            DiffOp::Add(value) => Some((k, value)),
            _ => None,
        })
    }

    pub fn removals(&self) -> impl Iterator<Item = (&str, &T)> {
        self.iter().filter_map(|(k, op)| match op {
            DiffOp::Remove(value) => Some((k, value)),
            _ => None,
        })
    }

    pub fn changes(&self) -> impl Iterator<Item = (&str, &T, &T)> {
        self.iter().filter_map(|(k, op)| match op {
            DiffOp::Change { old, new } => Some((k, old, new)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the diff that undoes this one.
    pub fn reverse(&self) -> Self {
        Self {
            ops: self
                .ops
                .iter()
                .map(|(k, op)| (k.clone(), op.clone().reverse()))
                .collect(),
        }
    }

    /// Applies the operations to a keyed target.
    ///
    /// Application tolerates stale targets: removing an absent key and
    /// adding an equal value are no-ops, and a change applies whatever the
    /// current value is.
    pub fn apply<P: PatchTarget<T> + ?Sized>(&self, target: &mut P) -> Result<(), P::Error> {
        for (key, op) in &self.ops {
            let current = target.current(key);
            match op {
                DiffOp::Add(value) => match current {
                    Some(existing) if existing == *value => {
                        debug!(key = %key, "add of existing value skipped");
                    }
                    Some(_) => {
                        debug!(key = %key, "add over a different value, overwriting");
                        target.put(key, value.clone())?;
                    }
                    None => target.put(key, value.clone())?,
                },
                DiffOp::Remove(_) => {
                    if current.is_some() {
                        target.take(key);
                    } else {
                        debug!(key = %key, "remove of absent key skipped");
                    }
                }
                DiffOp::Change { new, .. } => {
                    if current.is_none() {
                        debug!(key = %key, "change of absent key, adding");
                    }
                    target.put(key, new.clone())?;
                }
            }
        }
        Ok(())
    }
}

impl<T> FromIterator<(String, DiffOp<T>)> for MapDiff<T> {
    fn from_iter<I: IntoIterator<Item = (String, DiffOp<T>)>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// A keyed structure a [`MapDiff`] can be applied to.
pub trait PatchTarget<T> {
    type Error;

    /// Returns a copy of the current value under `key`.
    fn current(&self, key: &str) -> Option<T>;

    /// Stores `value` under `key`.
    fn put(&mut self, key: &str, value: T) -> Result<(), Self::Error>;

    /// Removes the value under `key`.
    fn take(&mut self, key: &str);
}

impl<T: Clone> PatchTarget<T> for BTreeMap<String, T> {
    type Error = std::convert::Infallible;

    fn current(&self, key: &str) -> Option<T> {
        self.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: T) -> Result<(), Self::Error> {
        self.insert(key.to_string(), value);
        Ok(())
    }

    fn take(&mut self, key: &str) {
        self.remove(key);
    }
}

//! Column handles and column sets.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a constrained column.
///
/// Identity is the `(id, name)` pair; ids are assigned by whoever builds the
/// expression tree (see [`ColumnRegistry`](crate::sql::ColumnRegistry)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    id: u32,
    name: Arc<str>,
}

impl ColumnRef {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: Arc::from(name),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An ordered set of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnSet(BTreeSet<ColumnRef>);

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: ColumnRef) -> bool {
        self.0.insert(column)
    }

    pub fn contains(&self, column: &ColumnRef) -> bool {
        self.0.contains(column)
    }

    pub fn extend_from(&mut self, other: &ColumnSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnRef> {
        self.0.iter()
    }

    /// The only member, if the set has exactly one.
    pub fn single(&self) -> Option<&ColumnRef> {
        if self.0.len() == 1 {
            self.0.iter().next()
        } else {
            None
        }
    }
}

impl FromIterator<ColumnRef> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = ColumnRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a ColumnRef;
    type IntoIter = std::collections::btree_set::Iter<'a, ColumnRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", column)?;
        }
        write!(f, "}}")
    }
}

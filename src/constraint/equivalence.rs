//! Column equivalence classes from `a = b` predicates.

use std::collections::HashMap;

use crate::expr::{ColumnRef, ColumnSet};

/// Union-find over columns known to be equal.
#[derive(Debug, Clone, Default)]
pub struct EquivalenceClasses {
    index: HashMap<ColumnRef, usize>,
    columns: Vec<ColumnRef>,
    parent: Vec<usize>,
}

impl EquivalenceClasses {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, column: &ColumnRef) -> usize {
        if let Some(&i) = self.index.get(column) {
            return i;
        }
        let i = self.columns.len();
        self.index.insert(column.clone(), i);
        self.columns.push(column.clone());
        self.parent.push(i);
        i
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Record that `a` and `b` always hold the same value.
    pub fn union(&mut self, a: &ColumnRef, b: &ColumnRef) {
        let (ia, ib) = (self.slot(a), self.slot(b));
        let (ra, rb) = (self.find(ia), self.find(ib));
        if ra != rb {
            self.parent[rb.max(ra)] = rb.min(ra);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Classes with at least two members, ordered by their smallest column.
    pub fn into_sets(mut self) -> Vec<ColumnSet> {
        let mut by_root: HashMap<usize, ColumnSet> = HashMap::new();
        for i in 0..self.columns.len() {
            let root = self.find(i);
            by_root
                .entry(root)
                .or_default()
                .insert(self.columns[i].clone());
        }
        let mut sets: Vec<ColumnSet> = by_root.into_values().filter(|s| s.len() > 1).collect();
        sets.sort_by(|a, b| a.iter().next().cmp(&b.iter().next()));
        sets
    }
}

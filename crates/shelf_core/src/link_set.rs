use std::collections::HashSet;

use crate::canonicalize_url;

/// Outcome of offering one link to a [`LinkSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    Duplicate,
    /// The set was already full; the link was not stored.
    CapReached,
    /// The link had no canonical form.
    Rejected,
}

/// Capped, deduplicated set of canonical product links in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSet {
    cap: usize,
    seen: HashSet<String>,
    order: Vec<String>,
}

impl LinkSet {
    /// A cap of zero is raised to one; a link set always admits one link.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.cap
    }

    pub fn contains(&self, url: &str) -> bool {
        canonicalize_url(url).is_some_and(|key| self.seen.contains(&key))
    }

    /// Canonicalize `url` and store it unless it is a duplicate or the cap is hit.
    pub fn insert(&mut self, url: &str) -> InsertOutcome {
        let Some(key) = canonicalize_url(url) else {
            return InsertOutcome::Rejected;
        };
        if self.seen.contains(&key) {
            return InsertOutcome::Duplicate;
        }
        if self.is_full() {
            return InsertOutcome::CapReached;
        }
        self.seen.insert(key.clone());
        self.order.push(key);
        InsertOutcome::Added
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

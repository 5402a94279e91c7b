//! Process-wide pool of placeholder names for unsaved documents
//!
//! Names look like `"Untitled 3"`. The lowest free number is always handed
//! out first, so closing "Untitled 1" makes the next new document reuse it.

use std::collections::BTreeSet;

#[derive(Debug)]
pub struct NamePool {
    prefix: String,
    in_use: BTreeSet<usize>,
}

impl NamePool {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            in_use: BTreeSet::new(),
        }
    }

    /// Reserve the lowest free name
    pub fn reserve(&mut self) -> String {
        let number = (1..)
            .find(|n| !self.in_use.contains(n))
            .unwrap_or(usize::MAX);
        self.in_use.insert(number);
        self.format(number)
    }

    /// Return a name to the pool. Unknown names are ignored.
    pub fn release(&mut self, name: &str) -> bool {
        match self.parse(name) {
            Some(number) => self.in_use.remove(&number),
            None => false,
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.parse(name).is_some_and(|n| self.in_use.contains(&n))
    }

    pub fn reserved_count(&self) -> usize {
        self.in_use.len()
    }

    fn format(&self, number: usize) -> String {
        format!("{} {}", self.prefix, number)
    }

    fn parse(&self, name: &str) -> Option<usize> {
        name.strip_prefix(self.prefix.as_str())?
            .strip_prefix(' ')?
            .parse()
            .ok()
    }
}

use std::collections::BTreeSet;

use super::ast::Identifier;

/// Ordered set of identifiers used for dependency tracking between scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    members: BTreeSet<Identifier>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, identifier: impl Into<Identifier>) -> &mut Self {
        self.members.insert(identifier.into());
        self
    }

    pub fn merge(&mut self, other: &IdentifierSet) -> &mut Self {
        self.members.extend(other.members.iter().cloned());
        self
    }

    pub fn remove(&mut self, identifier: &Identifier) -> bool {
        self.members.remove(identifier)
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.members.contains(identifier)
    }

    /// True when every member of `other` is also a member of this set.
    pub fn satisfies(&self, other: &IdentifierSet) -> bool {
        other.members.is_subset(&self.members)
    }

    /// True when both sets hold exactly the same members.
    pub fn matches(&self, other: &IdentifierSet) -> bool {
        self.members == other.members
    }

    /// Members not present in `other`.
    pub fn difference(&self, other: &IdentifierSet) -> IdentifierSet {
        IdentifierSet {
            members: self.members.difference(&other.members).cloned().collect(),
        }
    }

    /// Sorted members concatenated into a single key.
    pub fn combined_key(&self) -> String {
        self.members.iter().map(Identifier::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.members.iter()
    }
}

impl<T: Into<Identifier>> FromIterator<T> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        IdentifierSet {
            members: iter.into_iter().map(Into::into).collect(),
        }
    }
}

//! Ordered statement collection of an entity.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{PropertyId, Rank, Snak, Statement};

/// An ordered list of statements.
///
/// Storage is a flat list; the by-property views group statements without
/// changing the global order, so serialization round-trips exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatementList {
    statements: Vec<Statement>,
}

impl StatementList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    pub fn add(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Inserts a statement at `index`, appending when past the end.
    pub fn insert(&mut self, index: usize, statement: Statement) {
        let index = index.min(self.statements.len());
        self.statements.insert(index, statement);
    }

    pub fn get_by_guid(&self, guid: &str) -> Option<&Statement> {
        self.statements.iter().find(|s| s.guid() == Some(guid))
    }

    pub fn get_by_guid_mut(&mut self, guid: &str) -> Option<&mut Statement> {
        self.statements.iter_mut().find(|s| s.guid() == Some(guid))
    }

    pub fn index_of_guid(&self, guid: &str) -> Option<usize> {
        self.statements.iter().position(|s| s.guid() == Some(guid))
    }

    /// Removes the statement with the given GUID, returning it.
    pub fn remove_by_guid(&mut self, guid: &str) -> Option<Statement> {
        let index = self.index_of_guid(guid)?;
        Some(self.statements.remove(index))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Statement> {
        if index < self.statements.len() {
            Some(self.statements.remove(index))
        } else {
            None
        }
    }

    /// Distinct main-snak properties in first-seen order.
    pub fn property_ids(&self) -> Vec<PropertyId> {
        let mut seen = FxHashSet::default();
        self.statements
            .iter()
            .map(Statement::property_id)
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Statements whose main snak is about `property`, in list order.
    pub fn by_property_id(&self, property: PropertyId) -> StatementList {
        self.filtered(|s| s.property_id() == property)
    }

    /// Statements with the given rank, in list order.
    pub fn by_rank(&self, rank: Rank) -> StatementList {
        self.filtered(|s| s.rank() == rank)
    }

    /// Per property, the preferred statements if any exist, else the normal
    /// ones. Deprecated statements are never returned.
    pub fn best_statements(&self) -> StatementList {
        let mut best: FxHashMap<PropertyId, Rank> = FxHashMap::default();
        for statement in &self.statements {
            let entry = best.entry(statement.property_id()).or_insert(Rank::Deprecated);
            *entry = (*entry).max(statement.rank());
        }
        self.filtered(|s| {
            s.rank() != Rank::Deprecated && best.get(&s.property_id()) == Some(&s.rank())
        })
    }

    /// Groups statements by property. Groups appear in the order their
    /// property first appears; statements keep their relative order.
    pub fn grouped_by_property(&self) -> Vec<(PropertyId, Vec<&Statement>)> {
        let mut groups: Vec<(PropertyId, Vec<&Statement>)> = Vec::new();
        let mut index: FxHashMap<PropertyId, usize> = FxHashMap::default();
        for statement in &self.statements {
            let property = statement.property_id();
            let slot = *index.entry(property).or_insert_with(|| {
                groups.push((property, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(statement);
        }
        groups
    }

    pub fn main_snaks(&self) -> Vec<&Snak> {
        self.statements.iter().map(Statement::main_snak).collect()
    }

    /// Every snak of every statement, including qualifiers and references.
    pub fn all_snaks(&self) -> Vec<&Snak> {
        self.statements.iter().flat_map(Statement::all_snaks).collect()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Statement> {
        self.statements.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn clear(&mut self) {
        self.statements.clear();
    }

    fn filtered(&self, predicate: impl Fn(&Statement) -> bool) -> StatementList {
        self.statements.iter().filter(|s| predicate(s)).cloned().collect()
    }
}

impl FromIterator<Statement> for StatementList {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        Self {
            statements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for StatementList {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a StatementList {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> PropertyId {
        PropertyId::new(n).unwrap()
    }

    fn statement(property: u64, guid: &str, rank: Rank) -> Statement {
        let mut s = Statement::new(Snak::some_value(p(property)));
        s.set_guid(guid);
        s.set_rank(rank);
        s
    }

    fn sample() -> StatementList {
        [
            statement(31, "Q1$a", Rank::Normal),
            statement(17, "Q1$b", Rank::Normal),
            statement(31, "Q1$c", Rank::Preferred),
            statement(17, "Q1$d", Rank::Deprecated),
            statement(5, "Q1$e", Rank::Deprecated),
        ]
        .into_iter()
        .collect()
    }

    fn guids(list: &StatementList) -> Vec<&str> {
        list.iter().filter_map(Statement::guid).collect()
    }

    #[test]
    fn test_guid_lookup_and_removal() {
        let mut list = sample();
        assert_eq!(list.get_by_guid("Q1$c").unwrap().rank(), Rank::Preferred);
        assert!(list.get_by_guid("Q1$zzz").is_none());
        assert_eq!(list.remove_by_guid("Q1$b").unwrap().property_id(), p(17));
        assert!(list.remove_by_guid("Q1$b").is_none());
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_grouping_preserves_order() {
        let list = sample();
        assert_eq!(list.property_ids(), vec![p(31), p(17), p(5)]);

        let groups = list.grouped_by_property();
        let rendered: Vec<(PropertyId, Vec<&str>)> = groups
            .iter()
            .map(|(prop, statements)| (*prop, statements.iter().filter_map(|s| s.guid()).collect()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (p(31), vec!["Q1$a", "Q1$c"]),
                (p(17), vec!["Q1$b", "Q1$d"]),
                (p(5), vec!["Q1$e"]),
            ]
        );
        // The flat list is untouched.
        assert_eq!(guids(&list), ["Q1$a", "Q1$b", "Q1$c", "Q1$d", "Q1$e"]);
    }

    #[test]
    fn test_best_statements() {
        let best = sample().best_statements();
        assert_eq!(guids(&best), ["Q1$b", "Q1$c"]);
    }

    #[test]
    fn test_by_property_and_rank() {
        let list = sample();
        assert_eq!(guids(&list.by_property_id(p(17))), ["Q1$b", "Q1$d"]);
        assert_eq!(guids(&list.by_rank(Rank::Deprecated)), ["Q1$d", "Q1$e"]);
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut list = StatementList::new();
        list.insert(10, statement(1, "Q1$x", Rank::Normal));
        list.insert(0, statement(2, "Q1$y", Rank::Normal));
        assert_eq!(guids(&list), ["Q1$y", "Q1$x"]);
        assert_eq!(list.index_of_guid("Q1$x"), Some(1));
    }
}

//! Statement-level diffing.
//!
//! Statements are matched by GUID. Statements without a GUID (created in the
//! same edit, never saved) are matched by their claim content instead, under
//! a synthetic key `~<claim hash>`; repeats of the same content get a `#n`
//! suffix.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::diff::map::{DiffOp, MapDiff};
use crate::model::{Rank, Reference, Snak, Statement, StatementList};

/// Prefix of synthetic keys for statements without a GUID.
pub const SYNTHETIC_KEY_PREFIX: char = '~';

/// Returns the diff key of every statement, in list order.
pub fn statement_keys(statements: &StatementList) -> Vec<String> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    statements
        .iter()
        .map(|statement| {
            let base = match statement.guid() {
                Some(guid) => guid.to_string(),
                None => format!("{SYNTHETIC_KEY_PREFIX}{}", statement.claim().hash()),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}#{count}")
            }
        })
        .collect()
}

/// Computes the claims diff between two statement lists.
pub fn diff_statements(old: &StatementList, new: &StatementList) -> MapDiff<Statement> {
    let old_keys = statement_keys(old);
    let new_keys = statement_keys(new);
    MapDiff::between(
        old_keys.iter().map(String::as_str).zip(old.iter()),
        new_keys.iter().map(String::as_str).zip(new.iter()),
    )
}

/// Applies a claims diff to a statement list.
///
/// Every key is resolved against the list as it is before any operation
/// runs, since removing one of several content-keyed statements renumbers
/// the `#n` keys of the rest. Changed statements are replaced in place,
/// removed ones dropped, and added ones appended in key occurrence order.
/// Stale operations are tolerated the way [`MapDiff::apply`] tolerates them.
pub fn apply_statement_diff(diff: &MapDiff<Statement>, statements: &mut StatementList) {
    let keys = statement_keys(statements);
    let index: FxHashMap<&str, usize> = keys.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();

    let mut replaced: FxHashMap<usize, Statement> = FxHashMap::default();
    let mut removed = vec![false; keys.len()];
    let mut appended: Vec<(&str, &Statement)> = Vec::new();

    for (key, op) in diff.iter() {
        let position = index.get(key).copied();
        match (op, position) {
            (DiffOp::Remove(_), Some(i)) => removed[i] = true,
            (DiffOp::Remove(_), None) => debug!(key, "remove of absent statement skipped"),
            (DiffOp::Add(value), Some(i)) if statements.statements()[i] == *value => {
                debug!(key, "add of existing statement skipped");
            }
            (DiffOp::Add(value) | DiffOp::Change { new: value, .. }, Some(i)) => {
                replaced.insert(i, value.clone());
            }
            (DiffOp::Change { new, .. }, None) => {
                debug!(key, "change of absent statement, adding");
                appended.push((key, new));
            }
            (DiffOp::Add(value), None) => appended.push((key, value)),
        }
    }
    if removed.iter().all(|r| !r) && replaced.is_empty() && appended.is_empty() {
        return;
    }

    // `#10` sorts before `#2` in the diff, so order repeats numerically.
    appended.sort_by(|(a, _), (b, _)| split_occurrence(a).cmp(&split_occurrence(b)));

    let old = std::mem::take(statements);
    for (i, statement) in old.into_iter().enumerate() {
        if removed[i] {
            continue;
        }
        statements.add(replaced.remove(&i).unwrap_or(statement));
    }
    for (_, statement) in appended {
        statements.add(statement.clone());
    }
}

/// Splits a statement key into its base and occurrence number.
fn split_occurrence(key: &str) -> (&str, usize) {
    if key.starts_with(SYNTHETIC_KEY_PREFIX) {
        if let Some((base, n)) = key.rsplit_once('#') {
            if let Ok(n) = n.parse() {
                return (base, n);
            }
        }
    }
    (key, 1)
}

/// What changed between two versions of one statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatementDifference {
    /// Old and new main snak, when the main snak changed.
    pub main_snak: Option<(Snak, Snak)>,
    pub added_qualifiers: Vec<Snak>,
    pub removed_qualifiers: Vec<Snak>,
    /// Old and new rank, when the rank changed.
    pub rank: Option<(Rank, Rank)>,
    pub added_references: Vec<Reference>,
    pub removed_references: Vec<Reference>,
}

impl StatementDifference {
    pub fn is_empty(&self) -> bool {
        self.main_snak.is_none()
            && self.added_qualifiers.is_empty()
            && self.removed_qualifiers.is_empty()
            && self.rank.is_none()
            && self.added_references.is_empty()
            && self.removed_references.is_empty()
    }
}

/// Compares two versions of a statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementDiffer;

impl StatementDiffer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the differences from `old` to `new`.
    ///
    /// Qualifiers are compared as sets of snaks and references by hash, so
    /// pure reordering yields no difference.
    pub fn compare(&self, old: &Statement, new: &Statement) -> StatementDifference {
        let main_snak = (old.main_snak() != new.main_snak())
            .then(|| (old.main_snak().clone(), new.main_snak().clone()));
        let rank = (old.rank() != new.rank()).then_some((old.rank(), new.rank()));

        let added_qualifiers = new
            .qualifiers()
            .iter()
            .filter(|s| !old.qualifiers().has_snak(s))
            .cloned()
            .collect();
        let removed_qualifiers = old
            .qualifiers()
            .iter()
            .filter(|s| !new.qualifiers().has_snak(s))
            .cloned()
            .collect();

        let added_references = new
            .references()
            .iter()
            .filter(|r| !old.references().has_reference_hash(r.hash()))
            .cloned()
            .collect();
        let removed_references = old
            .references()
            .iter()
            .filter(|r| !new.references().has_reference_hash(r.hash()))
            .cloned()
            .collect();

        let difference = StatementDifference {
            main_snak,
            added_qualifiers,
            removed_qualifiers,
            rank,
            added_references,
            removed_references,
        };
        if old.guid() != new.guid() {
            debug!(old = ?old.guid(), new = ?new.guid(), "comparing statements with different GUIDs");
        }
        difference
    }

    /// Details every change operation of a claims diff, by key.
    pub fn describe<'a>(&self, claims: &'a MapDiff<Statement>) -> Vec<(&'a str, StatementDifference)> {
        claims
            .iter()
            .filter_map(|(key, op)| match op {
                DiffOp::Change { old, new } => Some((key, self.compare(old, new))),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataValue, PropertyId};

    fn p(n: u64) -> PropertyId {
        PropertyId::new(n).unwrap()
    }

    fn with_guid(snak: Snak, guid: &str) -> Statement {
        let mut s = Statement::new(snak);
        s.set_guid(guid);
        s
    }

    #[test]
    fn test_keys_for_guidless_statements() {
        let list: StatementList = [
            Statement::new(Snak::no_value(p(1))),
            with_guid(Snak::no_value(p(1)), "Q1$a"),
            Statement::new(Snak::no_value(p(1))),
        ]
        .into_iter()
        .collect();
        let keys = statement_keys(&list);
        assert!(keys[0].starts_with('~'));
        assert_eq!(keys[1], "Q1$a");
        assert_eq!(keys[2], format!("{}#2", keys[0]));
    }

    #[test]
    fn test_guidless_matched_by_content() {
        let old: StatementList = [Statement::new(Snak::no_value(p(1)))].into_iter().collect();
        let mut new = old.clone();
        new.iter_mut().for_each(|s| s.set_rank(Rank::Preferred));

        let diff = diff_statements(&old, &new);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.changes().count(), 1);
    }

    #[test]
    fn test_apply_replaces_in_place() {
        let mut list: StatementList = [
            with_guid(Snak::no_value(p(1)), "Q1$a"),
            with_guid(Snak::no_value(p(2)), "Q1$b"),
        ]
        .into_iter()
        .collect();
        let mut diff = MapDiff::new();
        diff.insert(
            "Q1$a",
            DiffOp::Change {
                old: with_guid(Snak::no_value(p(1)), "Q1$a"),
                new: with_guid(Snak::some_value(p(1)), "Q1$a"),
            },
        );
        diff.insert("Q1$b", DiffOp::Remove(with_guid(Snak::no_value(p(2)), "Q1$b")));

        apply_statement_diff(&diff, &mut list);
        assert_eq!(list.len(), 1);
        assert_eq!(list.statements()[0].main_snak(), &Snak::some_value(p(1)));

        // Already applied: nothing left to remove
        apply_statement_diff(&diff, &mut list);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_all_guidless_repeats() {
        let mut preferred = Statement::new(Snak::no_value(p(1)));
        preferred.set_rank(Rank::Preferred);
        let old: StatementList = [Statement::new(Snak::no_value(p(1))), preferred]
            .into_iter()
            .collect();
        let new = StatementList::new();

        let diff = diff_statements(&old, &new);
        assert_eq!(diff.removals().count(), 2);

        let mut patched = old.clone();
        apply_statement_diff(&diff, &mut patched);
        assert!(patched.is_empty());

        apply_statement_diff(&diff.reverse(), &mut patched);
        assert_eq!(patched, old);
    }

    #[test]
    fn test_guidless_repeats_past_nine_keep_order() {
        let ranked = |n: usize| {
            let mut s = Statement::new(Snak::some_value(p(5)));
            s.set_rank(if n % 2 == 0 { Rank::Preferred } else { Rank::Deprecated });
            s
        };
        let target: StatementList = (0..12).map(ranked).collect();

        let diff = diff_statements(&StatementList::new(), &target);
        let mut patched = StatementList::new();
        apply_statement_diff(&diff, &mut patched);
        assert_eq!(patched, target);
        assert!(diff_statements(&patched, &target).is_empty());
    }

    #[test]
    fn test_split_occurrence() {
        assert_eq!(split_occurrence("~abc#10"), ("~abc", 10));
        assert_eq!(split_occurrence("~abc"), ("~abc", 1));
        assert_eq!(split_occurrence("Q1$x#2"), ("Q1$x#2", 1));
    }

    #[test]
    fn test_statement_differ() {
        let mut old = with_guid(Snak::no_value(p(42)), "X");
        old.add_reference([Snak::some_value(p(248))].into_iter().collect());
        let mut new = old.clone();
        new.qualifiers_mut().add_snak(Snak::value(p(10), DataValue::string("a kitten!")));
        new.set_rank(Rank::Deprecated);
        new.set_references(Default::default());

        let difference = StatementDiffer::new().compare(&old, &new);
        assert_eq!(difference.main_snak, None);
        assert_eq!(difference.added_qualifiers, [Snak::value(p(10), DataValue::string("a kitten!"))]);
        assert!(difference.removed_qualifiers.is_empty());
        assert_eq!(difference.rank, Some((Rank::Normal, Rank::Deprecated)));
        assert_eq!(difference.removed_references.len(), 1);
        assert!(!difference.is_empty());

        assert!(StatementDiffer::new().compare(&old, &old).is_empty());
    }
}

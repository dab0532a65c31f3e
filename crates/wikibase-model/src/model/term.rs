//! Multilingual terms: labels, descriptions and aliases.
//!
//! Per-language maps are `BTreeMap`s so iteration (and therefore any
//! serialization) is sorted by language code.

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::limits::MAX_TERM_LEN;

/// A text in a given language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub language: String,
    pub text: String,
}

impl Term {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// One text per language.
///
/// An empty string is stored as given: it is distinct from an absent
/// language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TermList {
    terms: BTreeMap<String, String>,
}

impl TermList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text for a language, returning the previous text.
    pub fn set(
        &mut self,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Option<String>, ModelError> {
        let text = text.into();
        check_term_len("term", &text)?;
        Ok(self.terms.insert(language.into(), text))
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.terms.get(language).map(String::as_str)
    }

    pub fn has(&self, language: &str) -> bool {
        self.terms.contains_key(language)
    }

    pub fn remove(&mut self, language: &str) -> Option<String> {
        self.terms.remove(language)
    }

    /// Iterates `(language, text)` pairs sorted by language.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, String> {
        &self.terms
    }
}

/// Aliases per language: an ordered list of distinct strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasGroupList {
    groups: BTreeMap<String, Vec<String>>,
}

impl AliasGroupList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the aliases of a language.
    ///
    /// Duplicates are dropped keeping the first occurrence. An empty list
    /// removes the language.
    pub fn set(
        &mut self,
        language: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), ModelError> {
        let language = language.into();
        let mut deduped: Vec<String> = Vec::new();
        for alias in aliases {
            let alias = alias.into();
            check_term_len("alias", &alias)?;
            if !deduped.contains(&alias) {
                deduped.push(alias);
            }
        }
        if deduped.is_empty() {
            self.groups.remove(&language);
        } else {
            self.groups.insert(language, deduped);
        }
        Ok(())
    }

    /// Appends aliases to a language, skipping ones already present.
    pub fn add(
        &mut self,
        language: &str,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), ModelError> {
        let mut merged = self.get(language).to_vec();
        merged.extend(aliases.into_iter().map(Into::into));
        self.set(language, merged)
    }

    /// Returns the aliases of a language; empty when there are none.
    pub fn get(&self, language: &str) -> &[String] {
        self.groups.get(language).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, language: &str) -> bool {
        self.groups.contains_key(language)
    }

    pub fn remove(&mut self, language: &str) -> Option<Vec<String>> {
        self.groups.remove(language)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(l, a)| (l.as_str(), a.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }
}

/// Labels, descriptions and aliases of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fingerprint {
    labels: TermList,
    descriptions: TermList,
    aliases: AliasGroupList,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(labels: TermList, descriptions: TermList, aliases: AliasGroupList) -> Self {
        Self {
            labels,
            descriptions,
            aliases,
        }
    }

    pub fn set_label(&mut self, language: impl Into<String>, text: impl Into<String>) -> Result<(), ModelError> {
        self.labels.set(language, text).map(drop)
    }

    pub fn label(&self, language: &str) -> Option<&str> {
        self.labels.get(language)
    }

    pub fn remove_label(&mut self, language: &str) -> Option<String> {
        self.labels.remove(language)
    }

    pub fn set_description(
        &mut self,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.descriptions.set(language, text).map(drop)
    }

    pub fn description(&self, language: &str) -> Option<&str> {
        self.descriptions.get(language)
    }

    pub fn remove_description(&mut self, language: &str) -> Option<String> {
        self.descriptions.remove(language)
    }

    pub fn set_aliases(
        &mut self,
        language: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), ModelError> {
        self.aliases.set(language, aliases)
    }

    pub fn aliases(&self, language: &str) -> &[String] {
        self.aliases.get(language)
    }

    pub fn remove_aliases(&mut self, language: &str) -> Option<Vec<String>> {
        self.aliases.remove(language)
    }

    pub fn labels(&self) -> &TermList {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut TermList {
        &mut self.labels
    }

    pub fn descriptions(&self) -> &TermList {
        &self.descriptions
    }

    pub fn descriptions_mut(&mut self) -> &mut TermList {
        &mut self.descriptions
    }

    pub fn alias_groups(&self) -> &AliasGroupList {
        &self.aliases
    }

    pub fn alias_groups_mut(&mut self) -> &mut AliasGroupList {
        &mut self.aliases
    }

    /// True iff there are no labels, descriptions or aliases.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.descriptions.is_empty() && self.aliases.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.descriptions.clear();
        self.aliases.clear();
    }
}

/// An ordered list of languages to try when a term is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFallbackChain {
    languages: Vec<String>,
}

impl LanguageFallbackChain {
    /// Creates a chain; duplicate languages are dropped.
    pub fn new(languages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut chain: Vec<String> = Vec::new();
        for language in languages {
            let language = language.into();
            if !chain.contains(&language) {
                chain.push(language);
            }
        }
        Self { languages: chain }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Returns the first term found along the chain, with the language it
    /// was found in.
    pub fn extract(&self, terms: &TermList) -> Option<Term> {
        self.languages
            .iter()
            .find_map(|language| terms.get(language).map(|text| Term::new(language.as_str(), text)))
    }

    pub fn label(&self, fingerprint: &Fingerprint) -> Option<Term> {
        self.extract(fingerprint.labels())
    }

    pub fn description(&self, fingerprint: &Fingerprint) -> Option<Term> {
        self.extract(fingerprint.descriptions())
    }
}

fn check_term_len(field: &'static str, text: &str) -> Result<(), ModelError> {
    let len = text.chars().count();
    if len > MAX_TERM_LEN {
        return Err(ModelError::LengthExceedsLimit {
            field,
            len,
            max: MAX_TERM_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup_miss_is_none() {
        let mut fingerprint = Fingerprint::new();
        fingerprint.set_label("en", "Berlin").unwrap();
        assert_eq!(fingerprint.label("en"), Some("Berlin"));
        assert_eq!(fingerprint.label("de"), None);
        assert!(fingerprint.aliases("de").is_empty());
    }

    #[test]
    fn test_empty_label_distinct_from_absent() {
        let mut fingerprint = Fingerprint::new();
        fingerprint.set_label("en", "").unwrap();
        assert_eq!(fingerprint.label("en"), Some(""));
        assert!(!fingerprint.is_empty());
        fingerprint.clear();
        assert_eq!(fingerprint.label("en"), None);
        assert!(fingerprint.is_empty());
    }

    #[test]
    fn test_aliases_dedup_and_empty_removes() {
        let mut fingerprint = Fingerprint::new();
        fingerprint.set_aliases("en", ["Bärlin", "Berlin", "Bärlin"]).unwrap();
        assert_eq!(fingerprint.aliases("en"), ["Bärlin", "Berlin"]);

        fingerprint.alias_groups_mut().add("en", ["Berlin", "Spree-Athen"]).unwrap();
        assert_eq!(fingerprint.aliases("en"), ["Bärlin", "Berlin", "Spree-Athen"]);

        fingerprint.set_aliases("en", Vec::<String>::new()).unwrap();
        assert!(!fingerprint.alias_groups().has("en"));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = Fingerprint::new();
        a.set_label("en", "cat").unwrap();
        a.set_label("de", "Katze").unwrap();
        let mut b = Fingerprint::new();
        b.set_label("de", "Katze").unwrap();
        b.set_label("en", "cat").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.labels().languages().collect::<Vec<_>>(), ["de", "en"]);
    }

    #[test]
    fn test_term_length_limit() {
        let mut fingerprint = Fingerprint::new();
        let long = "x".repeat(MAX_TERM_LEN + 1);
        assert!(matches!(
            fingerprint.set_label("en", long),
            Err(ModelError::LengthExceedsLimit { .. })
        ));
        assert!(fingerprint.is_empty());
    }

    #[test]
    fn test_fallback_chain() {
        let mut fingerprint = Fingerprint::new();
        fingerprint.set_label("de", "Katze").unwrap();
        fingerprint.set_label("en", "cat").unwrap();

        let chain = LanguageFallbackChain::new(["de-ch", "de", "en", "de"]);
        assert_eq!(chain.languages().len(), 3);
        assert_eq!(chain.label(&fingerprint), Some(Term::new("de", "Katze")));
        assert_eq!(chain.description(&fingerprint), None);

        let english_first = LanguageFallbackChain::new(["fr", "en"]);
        assert_eq!(english_first.label(&fingerprint), Some(Term::new("en", "cat")));
    }
}

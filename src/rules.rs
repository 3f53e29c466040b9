use std::collections::HashMap;

use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::scanner::fold_case;

/// A single pattern -> replacement rule, with its pattern already in NFC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pattern: String,
    replacement: String,
    folded: String,
    len: usize,
}

impl Rule {
    fn new(pattern: String, replacement: String) -> Self {
        let folded = fold_case(&pattern);
        let len = pattern.chars().count();
        Rule {
            pattern,
            replacement,
            folded,
            len,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Replacement exactly as authored; never normalized.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub(crate) fn folded(&self) -> &str {
        &self.folded
    }

    /// Pattern length in code points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Normalized rule table.
///
/// Rules are kept in match-priority order: descending pattern length, ties
/// in the order each pattern was first seen. The table is immutable once
/// built; reloading a dictionary means building a new one.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    index: HashMap<String, usize>, // pattern -> position in `rules`
}

impl RuleTable {
    /// Builds a table from raw `(pattern, replacement)` pairs.
    ///
    /// Patterns are rewritten to NFC. When two patterns normalize to the same
    /// string the later replacement wins, keeping the earlier position. An
    /// empty pattern fails the whole build with [`Error::InvalidRule`].
    pub fn build<I, P, R>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let mut rules: Vec<Rule> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (i, (pattern, replacement)) in pairs.into_iter().enumerate() {
            let pattern = pattern.as_ref();
            if pattern.is_empty() {
                return Err(Error::InvalidRule { index: i });
            }

            let normalized: String = pattern.nfc().collect();
            let replacement = replacement.into();
            match seen.get(&normalized) {
                Some(&slot) => {
                    debug!(
                        "rule #{} overwrites pattern {:?}: {:?} -> {:?}",
                        i, normalized, rules[slot].replacement, replacement
                    );
                    rules[slot].replacement = replacement;
                }
                None => {
                    seen.insert(normalized.clone(), rules.len());
                    rules.push(Rule::new(normalized, replacement));
                }
            }
        }

        // sort_by is stable, so equal lengths keep first-seen order
        rules.sort_by(|a, b| b.len.cmp(&a.len));

        let index = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.pattern.clone(), i))
            .collect();

        debug!(
            "built rule table: {} rules, longest pattern {} code points",
            rules.len(),
            rules.first().map_or(0, |r| r.len)
        );

        Ok(RuleTable { rules, index })
    }

    /// Rules in match-priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Patterns in match-priority order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.pattern.as_str())
    }

    /// Exact lookup; `pattern` is normalized before the lookup.
    pub fn get(&self, pattern: &str) -> Option<&str> {
        let normalized: String = pattern.nfc().collect();
        self.index
            .get(&normalized)
            .map(|&i| self.rules[i].replacement.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_pattern_last_write_wins() {
        let table = RuleTable::build([("a", "X"), ("a", "Y")]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a"), Some("Y"));
    }

    #[test]
    fn test_canonically_equivalent_patterns_collapse() {
        // decomposed e + combining acute, then precomposed é
        let table = RuleTable::build([("e\u{301}", "first"), ("\u{e9}", "second")]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rules()[0].pattern(), "\u{e9}");
        assert_eq!(table.rules()[0].len(), 1);
        assert_eq!(table.get("e\u{301}"), Some("second"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = RuleTable::build([("a", "X"), ("", "Y")]).unwrap_err();
        assert!(matches!(err, Error::InvalidRule { index: 1 }));
    }

    #[test]
    fn test_sorted_by_length_descending_stable() {
        let table = RuleTable::build([
            ("b", "1"),
            ("sh", "2"),
            ("a", "3"),
            ("shch", "4"),
            ("ch", "5"),
        ])
        .unwrap();
        let patterns: Vec<&str> = table.patterns().collect();
        assert_eq!(patterns, vec!["shch", "sh", "ch", "b", "a"]);
    }

    #[test]
    fn test_overwrite_keeps_first_position() {
        let table = RuleTable::build([("x", "1"), ("y", "2"), ("x", "3")]).unwrap();
        let patterns: Vec<&str> = table.patterns().collect();
        assert_eq!(patterns, vec!["x", "y"]);
        assert_eq!(table.get("x"), Some("3"));
    }

    #[test]
    fn test_replacement_kept_as_authored() {
        let table = RuleTable::build([("e", "e\u{301}")]).unwrap();
        assert_eq!(table.get("e"), Some("e\u{301}"));
    }

    #[test]
    fn test_length_counts_code_points() {
        let table = RuleTable::build([("щ", "shch"), ("zh", "ж")]).unwrap();
        assert_eq!(table.rules()[0].pattern(), "zh");
        assert_eq!(table.rules()[0].len(), 2);
        assert_eq!(table.rules()[1].len(), 1);
    }
}

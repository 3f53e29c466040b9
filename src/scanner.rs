use std::borrow::Cow;

use tracing::{debug, trace};
use unicode_normalization::UnicodeNormalization;

use crate::rules::{Rule, RuleTable};

/// Lowercase mapping applied to both patterns and input before comparing.
pub(crate) fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Letter-case shape of a matched input slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseShape {
    /// Replacement is emitted as stored.
    AsIs,
    Upper,
    Title,
}

impl CaseShape {
    /// Classifies a matched slice. Single code point matches are always
    /// [`CaseShape::AsIs`].
    pub fn of(slice: &[char]) -> Self {
        if slice.len() < 2 {
            return CaseShape::AsIs;
        }

        let has_upper = slice.iter().any(|c| c.is_uppercase());
        let has_lower = slice.iter().any(|c| c.is_lowercase());
        if has_upper && !has_lower {
            return CaseShape::Upper;
        }

        if let Some(first) = slice.iter().position(|c| c.is_alphabetic()) {
            if slice[first].is_uppercase() && !slice[first + 1..].iter().any(|c| c.is_uppercase())
            {
                return CaseShape::Title;
            }
        }

        CaseShape::AsIs
    }

    pub fn apply(self, replacement: &str) -> Cow<'_, str> {
        match self {
            CaseShape::AsIs => Cow::Borrowed(replacement),
            CaseShape::Upper => Cow::Owned(replacement.to_uppercase()),
            CaseShape::Title => match replacement.char_indices().find(|(_, c)| c.is_alphabetic()) {
                Some((at, first)) => {
                    let rest = &replacement[at + first.len_utf8()..];
                    let mut out = String::with_capacity(replacement.len());
                    out.push_str(&replacement[..at]);
                    out.extend(first.to_uppercase());
                    out.push_str(&rest.to_lowercase());
                    Cow::Owned(out)
                }
                None => Cow::Borrowed(replacement),
            },
        }
    }
}

/// One scanner step: a rule matched at the cursor, or a single code point
/// passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<'t> {
    Match {
        rule: &'t Rule,
        shape: CaseShape,
        position: usize,
    },
    NoMatch { ch: char, position: usize },
}

impl Step<'_> {
    /// Code points consumed from the normalized input.
    pub fn len(&self) -> usize {
        match self {
            Step::Match { rule, .. } => rule.len(),
            Step::NoMatch { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Step::Match { rule, shape, .. } => out.push_str(&shape.apply(rule.replacement())),
            Step::NoMatch { ch, .. } => out.push(*ch),
        }
    }
}

/// Left-to-right greedy scan over the NFC form of an input string.
///
/// Each call to `next` consumes at least one code point, so the iterator
/// yields at most as many steps as the normalized input has code points.
pub struct Scanner<'t> {
    table: &'t RuleTable,
    chars: Vec<char>,
    // folded[offsets[i]..offsets[j]] is the case fold of chars[i..j]
    folded: String,
    offsets: Vec<usize>,
    cursor: usize,
}

impl<'t> Scanner<'t> {
    pub fn new(table: &'t RuleTable, text: &str) -> Self {
        let chars: Vec<char> = text.nfc().collect();
        let mut folded = String::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(chars.len() + 1);
        for &c in &chars {
            offsets.push(folded.len());
            folded.extend(c.to_lowercase());
        }
        offsets.push(folded.len());

        Scanner {
            table,
            chars,
            folded,
            offsets,
            cursor: 0,
        }
    }

    /// Code points in the normalized input.
    pub fn input_len(&self) -> usize {
        self.chars.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    fn longest_match(&self) -> Option<&'t Rule> {
        let remaining = self.chars.len() - self.cursor;
        let start = self.offsets[self.cursor];
        self.table
            .rules()
            .iter()
            .filter(|rule| rule.len() <= remaining)
            .find(|rule| {
                let end = self.offsets[self.cursor + rule.len()];
                &self.folded[start..end] == rule.folded()
            })
    }
}

impl<'t> Iterator for Scanner<'t> {
    type Item = Step<'t>;

    fn next(&mut self) -> Option<Step<'t>> {
        if self.is_done() {
            return None;
        }

        let position = self.cursor;
        match self.longest_match() {
            Some(rule) => {
                let shape = CaseShape::of(&self.chars[position..position + rule.len()]);
                trace!(
                    "match {:?} -> {:?} ({:?}) at {}",
                    rule.pattern(),
                    rule.replacement(),
                    shape,
                    position
                );
                self.cursor += rule.len();
                Some(Step::Match {
                    rule,
                    shape,
                    position,
                })
            }
            None => {
                let ch = self.chars[position];
                trace!("no rule for {:?} at {}, kept as is", ch, position);
                self.cursor += 1;
                Some(Step::NoMatch { ch, position })
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chars.len() - self.cursor;
        (usize::from(remaining > 0), Some(remaining))
    }
}

impl RuleTable {
    pub fn scan<'t>(&'t self, text: &str) -> Scanner<'t> {
        Scanner::new(self, text)
    }

    /// Transliterates `text`. Input is normalized to NFC first, so the output
    /// is built from the normalized form rather than the raw string.
    pub fn transliterate(&self, text: &str) -> String {
        debug!("transliterating {} bytes with {} rules", text.len(), self.len());
        let mut out = String::with_capacity(text.len());
        let mut matched = 0usize;
        let mut kept = 0usize;
        for step in self.scan(text) {
            match step {
                Step::Match { .. } => matched += 1,
                Step::NoMatch { .. } => kept += 1,
            }
            step.write_to(&mut out);
        }
        debug!("transliteration done: {} matches, {} kept", matched, kept);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(pairs: &[(&str, &str)]) -> RuleTable {
        RuleTable::build(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_greedy_longest_match() {
        let t = table(&[("a", "X"), ("ab", "Y")]);
        assert_eq!(t.transliterate("ab"), "Y");
        assert_eq!(t.transliterate("aab"), "XY");
    }

    #[test]
    fn test_unknown_characters_pass_through() {
        let t = table(&[("a", "X")]);
        assert_eq!(t.transliterate("ab"), "Xb");
        assert_eq!(t.transliterate("b c!"), "b c!");
    }

    #[test]
    fn test_empty_input() {
        let t = table(&[("a", "X")]);
        assert_eq!(t.transliterate(""), "");
        assert_eq!(t.scan("").count(), 0);
    }

    #[test]
    fn test_case_restoration() {
        let t = table(&[("shch", "щ")]);
        assert_eq!(t.transliterate("shch"), "щ");
        assert_eq!(t.transliterate("SHCH"), "Щ");
        assert_eq!(t.transliterate("Shch"), "Щ");

        let t = table(&[("ya", "йа")]);
        assert_eq!(t.transliterate("ya"), "йа");
        assert_eq!(t.transliterate("YA"), "ЙА");
        assert_eq!(t.transliterate("Ya"), "Йа");
    }

    #[test]
    fn test_mixed_case_uses_replacement_as_stored() {
        let t = table(&[("shch", "щ")]);
        assert_eq!(t.transliterate("sHcH"), "щ");
        assert_eq!(t.transliterate("ShCh"), "щ");
    }

    #[test]
    fn test_single_character_match_is_never_recased() {
        let t = table(&[("a", "а"), ("b", "Б")]);
        assert_eq!(t.transliterate("A"), "а");
        assert_eq!(t.transliterate("b"), "Б");
        // inside an uppercase word each single-letter match still stays as stored
        assert_eq!(t.transliterate("AB"), "аБ");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let t = table(&[("Kh", "х")]);
        assert_eq!(t.transliterate("kh"), "х");
        assert_eq!(t.transliterate("KH"), "Х");
    }

    #[test]
    fn test_decomposed_and_precomposed_both_match() {
        let precomposed = table(&[("\u{e9}", "E")]);
        let decomposed = table(&[("e\u{301}", "E")]);
        for t in [&precomposed, &decomposed] {
            assert_eq!(t.transliterate("\u{e9}"), "E");
            assert_eq!(t.transliterate("e\u{301}"), "E");
        }
    }

    #[test]
    fn test_input_is_normalized_before_pass_through() {
        let t = table(&[("x", "y")]);
        assert_eq!(t.transliterate("e\u{301}x"), "\u{e9}y");
    }

    #[test]
    fn test_title_case_transform() {
        assert_eq!(CaseShape::Title.apply("'ya"), "'Ya");
        assert_eq!(CaseShape::Title.apply("ZH"), "Zh");
        assert_eq!(CaseShape::Title.apply("--"), "--");
        assert_eq!(CaseShape::Upper.apply("straße"), "STRASSE");
    }

    #[test]
    fn test_case_shape_detection() {
        let shape = |s: &str| CaseShape::of(&s.chars().collect::<Vec<_>>());
        assert_eq!(shape("SH"), CaseShape::Upper);
        assert_eq!(shape("S'"), CaseShape::Upper);
        assert_eq!(shape("Sh"), CaseShape::Title);
        assert_eq!(shape("'Ya"), CaseShape::Title);
        assert_eq!(shape("sh"), CaseShape::AsIs);
        assert_eq!(shape("sH"), CaseShape::AsIs);
        assert_eq!(shape("S"), CaseShape::AsIs);
        assert_eq!(shape("12"), CaseShape::AsIs);
    }

    #[test]
    fn test_steps_report_positions() {
        let t = table(&[("ab", "Y")]);
        let steps: Vec<Step<'_>> = t.scan("cab").collect();
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[0], Step::NoMatch { ch: 'c', position: 0 }));
        assert!(matches!(steps[1], Step::Match { position: 1, .. }));
        assert_eq!(steps[1].len(), 2);
    }

    #[test]
    fn test_scanner_state() {
        let t = table(&[("ab", "Y")]);
        let mut scanner = t.scan("abc");
        assert_eq!(scanner.input_len(), 3);
        assert!(!scanner.is_done());
        scanner.next();
        assert_eq!(scanner.cursor(), 2);
        scanner.next();
        assert!(scanner.is_done());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_ukrainian_round() {
        let t = table(&[
            ("shch", "щ"),
            ("sh", "ш"),
            ("ch", "ч"),
            ("zh", "ж"),
            ("s", "с"),
            ("c", "ц"),
            ("h", "г"),
            ("a", "а"),
            ("o", "о"),
            ("k", "к"),
            ("e", "е"),
        ]);
        assert_eq!(t.transliterate("shchoka"), "щока");
        assert_eq!(t.transliterate("Shchoka"), "Щока");
        // only the multi-letter match is recased
        assert_eq!(t.transliterate("SHCHOKA"), "Щока");
    }

    proptest! {
        #[test]
        fn transliteration_is_deterministic(
            rules in proptest::collection::vec(("[a-zA-Zé]{1,3}", "[а-яА-Я]{0,3}"), 0..12),
            text in "[a-zA-Z é\u{301}]{0,40}",
        ) {
            let t = RuleTable::build(rules).unwrap();
            prop_assert_eq!(t.transliterate(&text), t.transliterate(&text));
        }

        #[test]
        fn scan_takes_at_most_one_step_per_code_point(
            rules in proptest::collection::vec(("[a-c]{1,4}", "[x-z]{0,2}"), 0..12),
            text in "[a-dA-D]{0,60}",
        ) {
            let t = RuleTable::build(rules).unwrap();
            let n = text.nfc().count();
            let steps: Vec<Step<'_>> = t.scan(&text).collect();
            prop_assert!(steps.len() <= n);
            prop_assert_eq!(steps.iter().map(Step::len).sum::<usize>(), n);
        }

        #[test]
        fn empty_table_is_nfc_identity(text in "\\PC{0,40}") {
            let t = RuleTable::default();
            prop_assert_eq!(t.transliterate(&text), text.nfc().collect::<String>());
        }

        #[test]
        fn nfc_is_idempotent(text in "\\PC{0,40}") {
            let once: String = text.nfc().collect();
            let twice: String = once.nfc().collect();
            prop_assert_eq!(once, twice);
        }
    }
}

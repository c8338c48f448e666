//! Post-processing for raw eSpeak-NG phonemes
//!
//! eSpeak output is close to what the Kokoro model was trained on but not
//! identical. The rules below correct known mis-phonemizations and map symbols
//! the model vocabulary does not carry. Rules run in order and each one sees
//! the output of the previous rule, so the order of [`STANDARD_RULES`] is part
//! of the contract.
//!
//! The `regex` crate has no look-around, so context-sensitive rules match the
//! bare anchor and check the neighbouring characters themselves. This keeps
//! lookahead characters unconsumed: `" z z."` becomes `"zz."`.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use super::language::LanguageCode;

/// Punctuation (plus space) after which a detached ` z` is glued back on
const Z_TERMINATORS: &[char] = &[
    ';', ':', ',', '.', '!', '?', '¡', '¿', '—', '…', '"', '«', '»', '“', '”', ' ',
];

/// Where a rule is allowed to fire
#[derive(Debug, Clone, Copy)]
pub enum RuleContext {
    /// Every occurrence
    Anywhere,
    /// Only when the character right before the match satisfies the predicate
    PrecededBy(fn(char) -> bool),
    /// Only when the next character satisfies the predicate, or, if
    /// `at_end` is set, when the match ends the string or precedes a final newline
    FollowedBy { accept: fn(char) -> bool, at_end: bool },
}

impl RuleContext {
    fn accepts(&self, input: &str, start: usize, end: usize) -> bool {
        match *self {
            RuleContext::Anywhere => true,
            RuleContext::PrecededBy(accept) => {
                input[..start].chars().next_back().is_some_and(accept)
            }
            // A single trailing newline still counts as the end of the string
            RuleContext::FollowedBy { accept, at_end } => match &input[end..] {
                "" => at_end,
                "\n" => at_end || accept('\n'),
                rest => rest.chars().next().is_some_and(accept),
            },
        }
    }
}

/// A single ordered substitution over a phoneme string
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    context: RuleContext,
    language: Option<LanguageCode>,
}

impl RewriteRule {
    /// Replace every occurrence of `from` with `to`
    pub fn literal(name: &'static str, from: &str, to: &'static str) -> Self {
        Self::contextual(name, from, to, RuleContext::Anywhere)
    }

    /// Replace occurrences of `from` with `to` where `context` holds
    pub fn contextual(
        name: &'static str,
        from: &str,
        to: &'static str,
        context: RuleContext,
    ) -> Self {
        Self {
            name,
            pattern: Regex::new(&regex::escape(from)).expect("escaped literal is a valid regex"),
            replacement: to,
            context,
            language: None,
        }
    }

    /// Restrict the rule to one language
    pub fn only_for(mut self, language: LanguageCode) -> Self {
        self.language = Some(language);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn language(&self) -> Option<LanguageCode> {
        self.language
    }

    /// Whether the rule runs for `language`
    pub fn applies_to(&self, language: LanguageCode) -> bool {
        self.language.is_none_or(|only| only == language)
    }

    /// Apply the rule to `input`
    pub fn apply(&self, input: &str) -> String {
        if let RuleContext::Anywhere = self.context {
            return self
                .pattern
                .replace_all(input, NoExpand(self.replacement))
                .into_owned();
        }

        let mut output = String::with_capacity(input.len() + 8);
        let mut last = 0;
        for m in self.pattern.find_iter(input) {
            if !self.context.accepts(input, m.start(), m.end()) {
                continue;
            }
            output.push_str(&input[last..m.start()]);
            output.push_str(self.replacement);
            last = m.end();
        }
        output.push_str(&input[last..]);
        output
    }
}

/// Rules applied to every eSpeak result, in order
pub static STANDARD_RULES: Lazy<Vec<RewriteRule>> = Lazy::new(|| {
    vec![
        // "Kokoro" as eSpeak reads it, US then GB
        RewriteRule::literal("kokoro-us", "kəkˈoːɹoʊ", "kˈoʊkəɹoʊ"),
        RewriteRule::literal("kokoro-gb", "kəkˈɔːɹəʊ", "kˈəʊkəɹəʊ"),
        // Symbols outside the model vocabulary
        RewriteRule::literal("palatalization", "ʲ", "j"),
        RewriteRule::literal("rhotic", "r", "ɹ"),
        RewriteRule::literal("velar-fricative", "x", "k"),
        RewriteRule::literal("lateral-fricative", "ɬ", "l"),
        RewriteRule::contextual(
            "hundred-boundary",
            "hˈʌndɹɪd",
            " hˈʌndɹɪd",
            RuleContext::PrecededBy(|c| c.is_ascii_lowercase() || c == 'ɹ' || c == 'ː'),
        ),
        RewriteRule::contextual(
            "trailing-z",
            " z",
            "z",
            RuleContext::FollowedBy {
                accept: |c| Z_TERMINATORS.contains(&c),
                at_end: true,
            },
        ),
        // "ninety" is flapped in American English
        RewriteRule::contextual(
            "ninety-flap",
            "nˈaɪnti",
            "nˈaɪndi",
            RuleContext::FollowedBy {
                accept: |c| c != 'ː',
                at_end: true,
            },
        )
        .only_for(LanguageCode::AmericanEnglish),
    ]
});

/// Ordered, language-aware rewrite pipeline
#[derive(Debug, Clone)]
pub struct PhonemeRewriter {
    rules: Vec<RewriteRule>,
}

impl Default for PhonemeRewriter {
    fn default() -> Self {
        Self {
            rules: STANDARD_RULES.clone(),
        }
    }
}

impl PhonemeRewriter {
    /// Build a rewriter from a custom rule list
    pub fn with_rules(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rewrite raw engine output for `language`, then trim surrounding whitespace
    pub fn rewrite(&self, raw: &str, language: LanguageCode) -> String {
        let rewritten = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(language))
            .fold(raw.to_string(), |acc, rule| rule.apply(&acc));

        rewritten.trim().to_string()
    }
}

/// Rewrite with [`STANDARD_RULES`]
pub fn rewrite_phonemes(raw: &str, language: LanguageCode) -> String {
    static DEFAULT: Lazy<PhonemeRewriter> = Lazy::new(PhonemeRewriter::default);
    DEFAULT.rewrite(raw, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    const US: LanguageCode = LanguageCode::AmericanEnglish;
    const GB: LanguageCode = LanguageCode::BritishEnglish;

    #[test]
    fn test_empty_input() {
        assert_eq!(rewrite_phonemes("", US), "");
        assert_eq!(rewrite_phonemes("   ", GB), "");
    }

    #[test]
    fn test_kokoro_pronunciation_fix() {
        let result = rewrite_phonemes("ðə kəkˈoːɹoʊ mˈɑːdəl", US);
        assert_eq!(result, "ðə kˈoʊkəɹoʊ mˈɑːdəl");
        assert_eq!(result.matches("kˈoʊkəɹoʊ").count(), 1);

        let result = rewrite_phonemes("kəkˈɔːɹəʊ", GB);
        assert_eq!(result, "kˈəʊkəɹəʊ");
    }

    #[test]
    fn test_symbol_substitutions() {
        assert_eq!(rewrite_phonemes("aʲe", US), "aje");
        assert_eq!(rewrite_phonemes("rˈɛd", US), "ɹˈɛd");
        assert_eq!(rewrite_phonemes("lˈɒx", GB), "lˈɒk");
        assert_eq!(rewrite_phonemes("ɬˈan", GB), "lˈan");
    }

    #[test]
    fn test_hundred_boundary_insertion() {
        assert_eq!(rewrite_phonemes("wʌnhˈʌndɹɪd", US), "wʌn hˈʌndɹɪd");
        assert_eq!(rewrite_phonemes("fˈɔːɹhˈʌndɹɪd", US), "fˈɔːɹ hˈʌndɹɪd");
        assert_eq!(rewrite_phonemes("θɹˈiːhˈʌndɹɪd", US), "θɹˈiː hˈʌndɹɪd");
    }

    #[test]
    fn test_hundred_not_inserted_after_space_or_stress() {
        assert_eq!(rewrite_phonemes("wʌn hˈʌndɹɪd", US), "wʌn hˈʌndɹɪd");
        assert_eq!(rewrite_phonemes("hˈʌndɹɪd", US), "hˈʌndɹɪd");
        assert_eq!(rewrite_phonemes("ˈhˈʌndɹɪd", US), "ˈhˈʌndɹɪd");
    }

    #[test]
    fn test_hundred_back_to_back() {
        // The preceding character of the second match is the tail of the first
        assert_eq!(
            rewrite_phonemes("hˈʌndɹɪdhˈʌndɹɪd", US),
            "hˈʌndɹɪd hˈʌndɹɪd"
        );
    }

    #[test]
    fn test_substitution_runs_before_boundary_insertion() {
        // ʲ is outside [a-zɹː] until it has been mapped to j
        assert_eq!(rewrite_phonemes("ʲhˈʌndɹɪd", US), "j hˈʌndɹɪd");
        assert_ne!(rewrite_phonemes("ʲhˈʌndɹɪd", US), "jhˈʌndɹɪd");
        assert_eq!(rewrite_phonemes("ɬhˈʌndɹɪd", GB), "l hˈʌndɹɪd");
    }

    #[test]
    fn test_trailing_z_before_punctuation() {
        assert_eq!(rewrite_phonemes("hˈɛloʊ z.", US), "hˈɛloʊz.");
        assert_eq!(rewrite_phonemes("kˈæt z, dˈɔɡ z!", US), "kˈætz, dˈɔɡz!");
        assert_eq!(rewrite_phonemes("ɪt z“", US), "ɪtz“");
    }

    #[test]
    fn test_trailing_z_at_end() {
        assert_eq!(rewrite_phonemes("hˈɛloʊ z", US), "hˈɛloʊz");
    }

    #[test]
    fn test_trailing_z_before_final_newline() {
        assert_eq!(rewrite_phonemes("kˈɑːɹ z\n", US), "kˈɑːɹz");
        // Only one newline is treated as the end
        assert_eq!(rewrite_phonemes("kˈɑːɹ z\n\n", US), "kˈɑːɹ z");
        assert_eq!(rewrite_phonemes("kˈɑːɹ z\nz", US), "kˈɑːɹ z\nz");
    }

    #[test]
    fn test_trailing_z_does_not_consume_lookahead() {
        assert_eq!(rewrite_phonemes("a z z.", US), "azz.");
    }

    #[test]
    fn test_z_followed_by_letter_untouched() {
        assert_eq!(rewrite_phonemes("ɪz zˈiːɹoʊ", US), "ɪz zˈiːɹoʊ");
    }

    #[test]
    fn test_ninety_american_english() {
        assert_eq!(rewrite_phonemes("nˈaɪnti", US), "nˈaɪndi");
        assert_eq!(rewrite_phonemes("nˈaɪnti fˈaɪv", US), "nˈaɪndi fˈaɪv");
        // "nineteen" keeps its t
        assert_eq!(rewrite_phonemes("nˈaɪntiːn", US), "nˈaɪntiːn");
    }

    #[test]
    fn test_ninety_british_english_untouched() {
        assert_eq!(rewrite_phonemes("nˈaɪnti", GB), "nˈaɪnti");
        assert_eq!(rewrite_phonemes("nˈaɪnti fˈaɪv", GB), "nˈaɪnti fˈaɪv");
    }

    #[test]
    fn test_trim() {
        assert_eq!(rewrite_phonemes("  həlˈoʊ wˈɜːld  ", US), "həlˈoʊ wˈɜːld");
    }

    #[test]
    fn test_idempotent_on_clean_output() {
        for raw in [
            "həlˈoʊ wˈɜːld!",
            "ðɪs ɪz ɐ tˈɛst.",
            "wʌn hˈʌndɹɪd nˈaɪndi",
            "kˈoʊkəɹoʊ",
        ] {
            let once = rewrite_phonemes(raw, US);
            assert_eq!(rewrite_phonemes(&once, US), once, "rule re-fired on {raw:?}");
        }
    }

    #[test]
    fn test_language_restricted_rule() {
        let ninety = STANDARD_RULES
            .iter()
            .find(|rule| rule.name() == "ninety-flap")
            .unwrap();
        assert_eq!(ninety.language(), Some(US));
        assert!(ninety.applies_to(US));
        assert!(!ninety.applies_to(GB));
    }

    #[test]
    fn test_standard_rule_order() {
        let names: Vec<_> = STANDARD_RULES.iter().map(RewriteRule::name).collect();
        assert_eq!(
            names,
            vec![
                "kokoro-us",
                "kokoro-gb",
                "palatalization",
                "rhotic",
                "velar-fricative",
                "lateral-fricative",
                "hundred-boundary",
                "trailing-z",
                "ninety-flap",
            ]
        );
    }

    #[test]
    fn test_custom_rules() {
        let rewriter = PhonemeRewriter::with_rules(vec![
            RewriteRule::literal("swap", "ə", "ɐ"),
            RewriteRule::literal("gb-only", "ɐ", "a").only_for(GB),
        ]);
        assert_eq!(rewriter.rewrite("ðə", US), "ðɐ");
        assert_eq!(rewriter.rewrite("ðə", GB), "ða");
    }

    #[test]
    fn test_replacement_is_not_expanded() {
        let rule = RewriteRule::literal("dollar", "a", "$1");
        assert_eq!(rule.apply("bab"), "b$1b");
    }
}

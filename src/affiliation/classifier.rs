//! Academic vs company classification of author affiliations.
//!
//! The classifier is an ordered chain of [`Rule`]s. Every academic rule comes
//! before every company rule and the first matching rule decides, so an
//! affiliation naming both a university and a company is academic.

use super::normalize::{contains_phrase, normalize, tokens};

/// Result returned for empty affiliations and affiliations no rule matches.
pub const ACADEMIC_DEFAULT: ClassificationResult = ClassificationResult {
    is_non_academic: false,
    matched_company_term: None,
    company_name: None,
};

/// Academic terms matched as substrings of the normalized text.
const ACADEMIC_FRAGMENTS: &[&str] = &[
    "universi",
    "hospital",
    "institut",
    "school",
    "college",
    "faculty",
    "department",
    "hochschule",
    "ministry",
    "government",
    ".edu",
    ".ac.",
];

/// Academic terms matched as whole words or word sequences.
const ACADEMIC_WORDS: &[&str] = &[
    "dept",
    "clinic",
    "academy",
    "academic",
    "national lab",
    "national laboratory",
    "medical center",
    "medical centre",
    "research council",
    "food and drug administration",
];

/// Legal-form suffixes, matched as whole words.
const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "ltd",
    "llc",
    "corp",
    "corporation",
    "gmbh",
    "co",
    "plc",
    "ag",
    "limited",
    "company",
];

/// Suffixes that double as abbreviations ("CO" for Colorado). These only
/// count when written in mixed case right after a capitalized name.
const AMBIGUOUS_SUFFIXES: &[&str] = &["co"];

/// Industry keywords, matched as substrings.
const COMPANY_KEYWORDS: &[&str] = &[
    "biotech",
    "pharma",
    "therapeutic",
    "diagnostic",
    "life sciences",
];

/// Words allowed inside a company name run even though they are lowercase.
const NAME_CONNECTORS: &[&str] = &["&", "+", "and", "of", "de", "der", "la", "-"];

/// How a rule's term is compared with the affiliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch {
    /// Whole word, or a contiguous sequence of whole words
    Word,
    /// Substring of the normalized text
    Fragment,
}

/// What a matching rule concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Academic,
    /// Company detected through a legal-form suffix (Inc, GmbH, ...)
    CompanySuffix,
    /// Company detected through an industry keyword (biotech, pharma, ...)
    CompanyKeyword,
}

/// One entry of the classification chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    term: String,
    term_tokens: Vec<String>,
    matcher: TermMatch,
    outcome: Outcome,
}

impl Rule {
    pub fn new(term: &str, matcher: TermMatch, outcome: Outcome) -> Self {
        let term = normalize(term);
        let term_tokens = tokens(&term).into_iter().map(str::to_string).collect();
        Self {
            term,
            term_tokens,
            matcher,
            outcome,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn is_ambiguous_suffix(&self) -> bool {
        self.outcome == Outcome::CompanySuffix && AMBIGUOUS_SUFFIXES.contains(&self.term.as_str())
    }

    /// Test the rule against already normalized text and its tokens.
    pub fn matches(&self, normalized: &str, words: &[&str]) -> bool {
        if self.term.is_empty() {
            return false;
        }
        match self.matcher {
            TermMatch::Fragment => normalized.contains(self.term.as_str()),
            TermMatch::Word => {
                let phrase: Vec<&str> = self.term_tokens.iter().map(String::as_str).collect();
                contains_phrase(words, &phrase)
            }
        }
    }
}

/// Outcome of classifying one affiliation string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassificationResult {
    pub is_non_academic: bool,
    /// The company rule term that matched
    pub matched_company_term: Option<String>,
    /// Best-effort company name; only set when `is_non_academic`
    pub company_name: Option<String>,
}

impl ClassificationResult {
    fn company(term: &str, name: String) -> Self {
        Self {
            is_non_academic: true,
            matched_company_term: Some(term.to_string()),
            company_name: Some(name),
        }
    }
}

/// Rule-chain classifier for author affiliations.
#[derive(Debug, Clone)]
pub struct AffiliationClassifier {
    rules: Vec<Rule>,
}

impl Default for AffiliationClassifier {
    fn default() -> Self {
        Self::with_extra_terms(&[], &[])
    }
}

impl AffiliationClassifier {
    /// Build the default chain, appending user terms to the academic and
    /// company blocks respectively. Extra terms are matched as substrings.
    pub fn with_extra_terms(extra_academic: &[String], extra_company: &[String]) -> Self {
        let mut rules = Vec::new();

        rules.extend(
            ACADEMIC_FRAGMENTS
                .iter()
                .map(|t| Rule::new(t, TermMatch::Fragment, Outcome::Academic)),
        );
        rules.extend(
            ACADEMIC_WORDS
                .iter()
                .map(|t| Rule::new(t, TermMatch::Word, Outcome::Academic)),
        );
        rules.extend(
            extra_academic
                .iter()
                .map(|t| Rule::new(t, TermMatch::Fragment, Outcome::Academic)),
        );
        rules.extend(
            COMPANY_SUFFIXES
                .iter()
                .map(|t| Rule::new(t, TermMatch::Word, Outcome::CompanySuffix)),
        );
        rules.extend(
            COMPANY_KEYWORDS
                .iter()
                .map(|t| Rule::new(t, TermMatch::Fragment, Outcome::CompanyKeyword)),
        );
        rules.extend(
            extra_company
                .iter()
                .map(|t| Rule::new(t, TermMatch::Fragment, Outcome::CompanyKeyword)),
        );

        rules.retain(|r| !r.term.is_empty());
        Self { rules }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify one affiliation string.
    ///
    /// # Examples
    ///
    /// ```
    /// use pubmed_affiliations::affiliation::AffiliationClassifier;
    ///
    /// let classifier = AffiliationClassifier::default();
    ///
    /// let result = classifier.classify("Acme Pharmaceuticals Inc., Boston, MA, USA");
    /// assert!(result.is_non_academic);
    /// assert_eq!(result.company_name.as_deref(), Some("Acme Pharmaceuticals"));
    ///
    /// assert!(!classifier.classify("Department of Pharmacology, University of Oslo").is_non_academic);
    /// ```
    pub fn classify(&self, affiliation: &str) -> ClassificationResult {
        let normalized = normalize(affiliation);
        if normalized.is_empty() {
            return ACADEMIC_DEFAULT;
        }
        let words = tokens(&normalized);

        let Some(rule) = self.rules.iter().find(|r| {
            r.matches(&normalized, &words)
                && (!r.is_ambiguous_suffix()
                    || affiliation
                        .split([',', ';'])
                        .any(|s| written_suffix_run(s, &r.term).is_some()))
        }) else {
            return ACADEMIC_DEFAULT;
        };

        match rule.outcome {
            Outcome::Academic => {
                tracing::trace!(term = %rule.term, "academic term matched");
                ACADEMIC_DEFAULT
            }
            Outcome::CompanySuffix | Outcome::CompanyKeyword => {
                let name = self.company_name(affiliation, rule);
                tracing::trace!(term = %rule.term, company = %name, "company term matched");
                ClassificationResult::company(&rule.term, name)
            }
        }
    }

    /// Derive a display company name from the affiliation text. Never empty.
    fn company_name(&self, text: &str, rule: &Rule) -> String {
        let segments: Vec<&str> = text.split([',', ';']).map(str::trim).collect();

        for (i, segment) in segments.iter().enumerate() {
            let normalized = normalize(segment);
            let words = tokens(&normalized);
            if !rule.matches(&normalized, &words) {
                continue;
            }

            match rule.outcome {
                Outcome::CompanySuffix if rule.is_ambiguous_suffix() => {
                    match written_suffix_run(segment, &rule.term) {
                        Some(run) => return run,
                        None => continue,
                    }
                }
                Outcome::CompanySuffix => {
                    let run = capitalized_run_before(segment, &rule.term);
                    if !run.is_empty() {
                        return run;
                    }
                    // "Merck & Co., Inc." puts the suffix in its own segment
                    if let Some(previous) = segments[..i].iter().rev().find(|s| !s.is_empty()) {
                        let run = trailing_capitalized_run(&self.strip_suffixes(previous));
                        if !run.is_empty() {
                            return run;
                        }
                    }
                }
                Outcome::CompanyKeyword => {
                    let name = segment.trim_end_matches('.').trim();
                    if !name.is_empty() {
                        return name.to_string();
                    }
                }
                Outcome::Academic => {}
            }
            break;
        }

        text.split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| rule.term.clone())
    }

    /// Drop trailing legal-form words ("Takeda Pharmaceutical Co." -> "Takeda Pharmaceutical").
    fn strip_suffixes(&self, segment: &str) -> String {
        let mut words: Vec<&str> = segment.split_whitespace().collect();
        while let Some(last) = words.last() {
            let bare = bare_word(last);
            let is_suffix = self
                .rules
                .iter()
                .any(|r| r.outcome == Outcome::CompanySuffix && r.term == bare);
            if !is_suffix {
                break;
            }
            words.pop();
        }
        words.join(" ")
    }
}

fn bare_word(word: &str) -> String {
    normalize(word)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

fn is_name_word(word: &str) -> bool {
    if NAME_CONNECTORS.contains(&word.to_lowercase().as_str()) {
        return true;
    }
    word.chars()
        .next()
        .map(|c| c.is_uppercase() || c.is_ascii_digit())
        .unwrap_or(false)
}

fn is_connector(word: &str) -> bool {
    NAME_CONNECTORS.contains(&word.to_lowercase().as_str())
}

/// Join a run of name words, trimming connectors at either end.
fn join_run(run: &[&str]) -> String {
    let start = run.iter().position(|w| !is_connector(w));
    let end = run.iter().rposition(|w| !is_connector(w));
    match (start, end) {
        (Some(s), Some(e)) => run[s..=e].join(" ").trim_end_matches('.').to_string(),
        _ => String::new(),
    }
}

/// The capitalized words immediately preceding `suffix` in `segment`.
fn capitalized_run_before(segment: &str, suffix: &str) -> String {
    let words: Vec<&str> = segment.split_whitespace().collect();
    match words.iter().position(|w| bare_word(w) == suffix) {
        Some(end) => run_before(&words, end),
        None => String::new(),
    }
}

/// The name run ending just before `words[end]`.
fn run_before(words: &[&str], end: usize) -> String {
    let start = words[..end]
        .iter()
        .rposition(|w| !is_name_word(w))
        .map(|p| p + 1)
        .unwrap_or(0);
    join_run(&words[start..end])
}

/// Name preceding `suffix` where the suffix is not written in capitals
/// ("Acme Trading Co." but not "Boulder, CO").
fn written_suffix_run(segment: &str, suffix: &str) -> Option<String> {
    let words: Vec<&str> = segment.split_whitespace().collect();
    words
        .iter()
        .enumerate()
        .filter(|(_, w)| {
            bare_word(w) == suffix
                && w.trim_matches(|c: char| !c.is_alphanumeric())
                    .chars()
                    .any(char::is_lowercase)
        })
        .map(|(end, _)| run_before(&words, end))
        .find(|run| !run.is_empty())
}

/// The capitalized words at the end of `segment`.
fn trailing_capitalized_run(segment: &str) -> String {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let start = words
        .iter()
        .rposition(|w| !is_name_word(w))
        .map(|p| p + 1)
        .unwrap_or(0);
    join_run(&words[start..])
}

//! Keyword / regex rules evaluated against post text.

use std::fmt;

use regex::{Regex, RegexBuilder};

/// A single reply trigger.
#[derive(Clone, Debug)]
pub enum MatchRule {
    /// Case-insensitive substring containment.
    Keyword { keyword: String, lowered: String },
    /// Case-insensitive, unanchored search.
    Pattern(Regex),
}

impl MatchRule {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        let lowered = keyword.to_lowercase();
        MatchRule::Keyword { keyword, lowered }
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(MatchRule::Pattern)
    }

    /// `lowered_text` must already be lower-cased.
    fn matches(&self, text: &str, lowered_text: &str) -> bool {
        match self {
            MatchRule::Keyword { lowered, .. } => lowered_text.contains(lowered.as_str()),
            MatchRule::Pattern(re) => re.is_match(text),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Keyword { keyword, .. } => write!(f, "keyword '{keyword}'"),
            MatchRule::Pattern(re) => write!(f, "regex '{}'", re.as_str()),
        }
    }
}

impl PartialEq for MatchRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MatchRule::Keyword { keyword: a, .. }, MatchRule::Keyword { keyword: b, .. }) => {
                a == b
            }
            (MatchRule::Pattern(a), MatchRule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// A rule that could not be compiled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRule {
    pub source: String,
    pub reason: String,
}

/// Immutable set of active rules, built once at startup.
///
/// Keywords are evaluated before regex patterns, each in configuration order.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<MatchRule>,
    rejected: Vec<RejectedRule>,
}

impl RuleSet {
    /// Compile keywords and patterns. Invalid entries are logged and left out;
    /// this never fails.
    ///
    /// Patterns use the `regex` crate syntax, which has no lookaround or
    /// backreferences: a pattern such as `(?<!not )good` is rejected here.
    pub fn compile<K, P>(keywords: K, patterns: P) -> Self
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut rules = Vec::new();
        let mut rejected = Vec::new();

        for kw in keywords {
            let kw = kw.as_ref();
            if kw.trim().is_empty() {
                tracing::warn!("ignoring blank keyword");
                rejected.push(RejectedRule {
                    source: kw.to_string(),
                    reason: "blank keyword".to_string(),
                });
                continue;
            }
            rules.push(MatchRule::keyword(kw));
        }

        for pat in patterns {
            let pat = pat.as_ref();
            match MatchRule::pattern(pat) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    tracing::warn!(pattern = pat, error = %e, "invalid regex pattern");
                    rejected.push(RejectedRule {
                        source: pat.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            active = rules.len(),
            rejected = rejected.len(),
            "compiled reply rules"
        );
        Self { rules, rejected }
    }

    /// First rule matching `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&MatchRule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|r| r.matches(text, &lowered))
    }

    pub fn rejected(&self) -> &[RejectedRule] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

//! Decides whether a timeline entry qualifies for a reply.

use crate::{
    domain::TimelineEntry,
    matcher::{MatchRule, RuleSet},
};

/// Why an entry was passed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    OwnPost,
    AlreadyThreaded,
    NoMatch,
}

/// Outcome of evaluating one entry. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyDecision {
    Reply { rule: MatchRule },
    Skip(SkipReason),
}

impl ReplyDecision {
    pub fn should_reply(&self) -> bool {
        matches!(self, ReplyDecision::Reply { .. })
    }

    pub fn matched_rule(&self) -> Option<&MatchRule> {
        match self {
            ReplyDecision::Reply { rule } => Some(rule),
            ReplyDecision::Skip(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReplyPolicy {
    rules: RuleSet,
}

impl ReplyPolicy {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Evaluate `entry` for the account `own_handle`.
    ///
    /// Rules short-circuit in order: own post, already part of a thread, rule match.
    /// An entry that is itself a reply is skipped even if it matches; this does not
    /// stop a second reply to the same top-level post in a later cycle.
    pub fn decide(&self, entry: &TimelineEntry, own_handle: &str) -> ReplyDecision {
        if entry.author_handle.eq_ignore_ascii_case(own_handle) {
            return ReplyDecision::Skip(SkipReason::OwnPost);
        }

        if entry.is_reply() {
            return ReplyDecision::Skip(SkipReason::AlreadyThreaded);
        }

        match self.rules.first_match(&entry.text) {
            Some(rule) => {
                tracing::debug!(author = %entry.author_handle, %rule, "rule matched");
                ReplyDecision::Reply { rule: rule.clone() }
            }
            None => ReplyDecision::Skip(SkipReason::NoMatch),
        }
    }

    pub fn should_reply(&self, entry: &TimelineEntry, own_handle: &str) -> bool {
        self.decide(entry, own_handle).should_reply()
    }
}

//! Graphite-style node patterns.
//!
//! Only a strictly leading `*` is treated as a Graphite wildcard and rewritten
//! to `(.*)`. Everything else is handed to the regex engine untouched, so a
//! `*` further in the expression acts as a regex quantifier.
//!
//! See: http://graphite.readthedocs.io/en/latest/render_api.html

use finder_common::{FinderError, Node, Result};
use regex::Regex;

const GRAPHITE_WILDCARD: &str = "*";
const REGEX_WILDCARD: &str = "(.*)";

/// A compiled node pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    expr: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a plain regular expression
    pub fn new(expr: &str) -> Result<Self> {
        let regex = Regex::new(expr).map_err(|e| FinderError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            expr: expr.to_string(),
            regex,
        })
    }

    /// Compile a Graphite expression, rewriting a leading wildcard
    pub fn graphite(expr: &str) -> Result<Self> {
        match expr.strip_prefix(GRAPHITE_WILDCARD) {
            Some(rest) => Self::new(&format!("{}{}", REGEX_WILDCARD, rest)),
            None => Self::new(expr),
        }
    }

    /// Expression after wildcard rewriting
    pub fn as_str(&self) -> &str {
        &self.expr
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns true if the pattern selects the node's host or address
    pub fn match_node(&self, node: &Node) -> bool {
        self.match_str(node.host()) || self.match_str(&node.address_string())
    }

    /// Substitute the node into a leading wildcard.
    ///
    /// Expressions without a leading wildcard come back unchanged. Returns
    /// `None` when the node has neither host nor address.
    pub fn expand_node(&self, node: &Node) -> Option<String> {
        if let Some(expanded) = self.expand_str(node.host()) {
            return Some(expanded);
        }
        self.expand_str(&node.address_string())
    }

    fn match_str(&self, subject: &str) -> bool {
        if subject.is_empty() {
            return false;
        }

        if self.expr.starts_with(REGEX_WILDCARD) {
            return true;
        }

        // Typed-ahead queries such as "node0" select "node01.metrics"
        if self.expr.starts_with(subject) {
            return true;
        }

        self.regex.is_match(subject)
    }

    fn expand_str(&self, subject: &str) -> Option<String> {
        if subject.is_empty() {
            return None;
        }

        if self.expr.starts_with(REGEX_WILDCARD) {
            return Some(self.expr.replacen(REGEX_WILDCARD, subject, 1));
        }

        Some(self.expr.clone())
    }
}

impl std::str::FromStr for Pattern {
    type Err = FinderError;

    fn from_str(expr: &str) -> Result<Self> {
        Self::graphite(expr)
    }
}

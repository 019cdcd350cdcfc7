//! Include/exclude rules for a source
//!
//! Rules are written as `"+ pattern"` (include) or `"- pattern"` (exclude)
//! using gitignore glob syntax, and are evaluated top to bottom: the first
//! rule matching a path decides. A path matched by no rule is included.
//! An excluded directory is not descended into, so including something
//! inside it needs an earlier include for the directory as well.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use sk_core::{Error, FilterRule, Result};
use std::path::Path;

/// Compiled filter rules for one source tree
pub struct FilterRules {
    /// `None` when there are no rules, so everything passes
    matcher: Option<Gitignore>,
}

impl FilterRules {
    /// Compile `rules` relative to `root`
    pub fn new(root: &Path, rules: &[FilterRule]) -> Result<Self> {
        if rules.is_empty() {
            return Ok(Self { matcher: None });
        }

        // Gitignore lets the last matching line win; feeding the rules in
        // reverse gives first-match-wins.
        let mut builder = GitignoreBuilder::new(root);
        for rule in rules.iter().rev() {
            let line = match rule {
                FilterRule::Exclude(pattern) => pattern.clone(),
                FilterRule::Include(pattern) => format!("!{}", pattern),
            };
            builder.add_line(None, &line).map_err(|e| {
                Error::InvalidConfiguration(format!("invalid filter '{}': {}", rule, e))
            })?;
        }

        let matcher = builder
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("invalid filters: {}", e)))?;
        Ok(Self {
            matcher: Some(matcher),
        })
    }

    /// Whether `path` (relative to the root) is filtered out
    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.matched(path, is_dir).is_ignore(),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_none()
    }
}

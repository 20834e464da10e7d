//! Export projection
//!
//! Decides which field names a record exposes when iterated or serialized:
//! the stored fields, plus names added with `+name`, minus names removed with
//! `-name`.

use indexmap::IndexSet;
use std::fmt;
use std::str::FromStr;

use crate::core::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectionRule {
    /// Expose a name beyond the stored fields, usually a computed accessor
    Include(String),
    /// Hide a stored field
    Exclude(String),
}

impl ProjectionRule {
    /// Parses a signed directive. Unsigned or empty directives yield `None`.
    pub fn parse(directive: &str) -> Option<Self> {
        let directive = directive.trim();
        let mut chars = directive.chars();
        let marker = chars.next()?;
        let name = chars.as_str().trim();
        if name.is_empty() {
            return None;
        }

        match marker {
            '+' => Some(Self::Include(name.to_string())),
            '-' => Some(Self::Exclude(name.to_string())),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Include(name) | Self::Exclude(name) => name,
        }
    }
}

impl FromStr for ProjectionRule {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            DbError::ParseError(format!("invalid projection directive '{}'", s))
        })
    }
}

impl fmt::Display for ProjectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include(name) => write!(f, "+{}", name),
            Self::Exclude(name) => write!(f, "-{}", name),
        }
    }
}

/// `(stored ∪ included) \ excluded`, deduplicated, in first-seen order.
pub fn project<'a, I>(stored: I, rules: &[ProjectionRule]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: IndexSet<&str> = stored.into_iter().collect();
    let mut excluded: IndexSet<&str> = IndexSet::new();

    for rule in rules {
        match rule {
            ProjectionRule::Include(name) => {
                names.insert(name);
            }
            ProjectionRule::Exclude(name) => {
                excluded.insert(name);
            }
        }
    }

    names
        .into_iter()
        .filter(|name| !excluded.contains(name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(directives: &[&str]) -> Vec<ProjectionRule> {
        directives.iter().filter_map(|d| ProjectionRule::parse(d)).collect()
    }

    #[test]
    fn test_include_and_exclude() {
        let projected = project(["a", "b", "c"], &rules(&["+d", "-b"]));
        assert_eq!(projected, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_no_rules_keeps_stored_order() {
        let projected = project(["z", "a", "m"], &[]);
        assert_eq!(projected, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_duplicates_removed() {
        let projected = project(["a", "b"], &rules(&["+a", "+c", "+c"]));
        assert_eq!(projected, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let projected = project(["a"], &rules(&["+b", "-b", "-a"]));
        assert!(projected.is_empty());
    }

    #[test]
    fn test_directive_whitespace_is_trimmed() {
        assert_eq!(
            ProjectionRule::parse("+  full_name "),
            Some(ProjectionRule::Include("full_name".into()))
        );
        assert_eq!(ProjectionRule::parse("-"), None);
        assert_eq!(ProjectionRule::parse("name"), None);
        assert!("name".parse::<ProjectionRule>().is_err());
        assert_eq!("-password".parse::<ProjectionRule>().unwrap().to_string(), "-password");
    }
}

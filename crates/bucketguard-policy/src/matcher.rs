//! String match rules used for principals and object keys.

/// A compiled match pattern.
///
/// Only two wildcard shapes are supported: `*` alone, which matches anything,
/// and a single trailing `*`, which matches by prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Matches every value.
    Any,
    /// Matches exactly this value.
    Exact(String),
    /// Matches values starting with this prefix.
    Prefix(String),
}

impl MatchRule {
    /// Compile a pattern. Returns `None` if `*` appears anywhere but the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketguard_policy::MatchRule;
    ///
    /// assert_eq!(MatchRule::from_pattern("*"), Some(MatchRule::Any));
    /// assert_eq!(MatchRule::from_pattern("logs/*"), Some(MatchRule::Prefix("logs/".into())));
    /// assert_eq!(MatchRule::from_pattern("a*b"), None);
    /// ```
    #[must_use]
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        if pattern == "*" {
            return Some(Self::Any);
        }
        match pattern.strip_suffix('*') {
            Some(prefix) if !prefix.contains('*') => Some(Self::Prefix(prefix.to_owned())),
            Some(_) => None,
            None if pattern.contains('*') => None,
            None => Some(Self::Exact(pattern.to_owned())),
        }
    }

    /// Whether `value` satisfies the rule.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == value,
            Self::Prefix(prefix) => value.starts_with(prefix.as_str()),
        }
    }
}

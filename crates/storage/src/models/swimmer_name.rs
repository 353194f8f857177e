use crate::error::{Result, StorageError};

/// A validated first/last name pair.
///
/// Both parts are trimmed and inner whitespace is collapsed, so "  Anna   Maria "
/// and "Anna Maria" refer to the same swimmer. Neither part may be empty, which is
/// what lets the store treat `(first_name, last_name)` as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwimmerName {
    first: String,
    last: String,
}

impl SwimmerName {
    /// Builds a name from separately supplied parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage::models::SwimmerName;
    ///
    /// let name = SwimmerName::new(" Lotte ", "van  Dijk").unwrap();
    /// assert_eq!(name.full_name(), "Lotte van Dijk");
    /// assert!(SwimmerName::new("", "Dijk").is_err());
    /// ```
    pub fn new(first: impl AsRef<str>, last: impl AsRef<str>) -> Result<Self> {
        let first = collapse_whitespace(first.as_ref());
        let last = collapse_whitespace(last.as_ref());

        if first.is_empty() {
            return Err(StorageError::InvalidName(
                "first name must not be empty".to_string(),
            ));
        }
        if last.is_empty() {
            return Err(StorageError::InvalidName(
                "last name must not be empty".to_string(),
            ));
        }

        Ok(Self { first, last })
    }

    /// Splits a full name on whitespace: the first token is the first name and
    /// everything after it the last name ("Lotte van Dijk" -> "Lotte", "van Dijk").
    pub fn parse_full(full_name: &str) -> Result<Self> {
        let mut parts = full_name.split_whitespace();
        let first = parts.next().unwrap_or_default();
        let last = parts.collect::<Vec<_>>().join(" ");

        if last.is_empty() {
            return Err(StorageError::InvalidName(format!(
                "'{}' is not of the form 'First Last'",
                full_name.trim()
            )));
        }

        Self::new(first, last)
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }

    /// Case-insensitive comparison against a display name scraped from a page.
    pub fn matches_exactly(&self, candidate: &str) -> bool {
        collapse_whitespace(candidate).to_lowercase() == self.full_name().to_lowercase()
    }

    /// Looser comparison: the candidate contains both name parts, in any order.
    pub fn matches_loosely(&self, candidate: &str) -> bool {
        let candidate = collapse_whitespace(candidate).to_lowercase();
        candidate.contains(&self.first.to_lowercase())
            && candidate.contains(&self.last.to_lowercase())
    }

    pub fn as_database_tuple(&self) -> (&str, &str) {
        (&self.first, &self.last)
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_are_trimmed() {
        let name = SwimmerName::new("  Alice ", " Smith").unwrap();
        assert_eq!(name.first(), "Alice");
        assert_eq!(name.last(), "Smith");
    }

    #[test]
    fn test_parse_full_keeps_multi_word_last_name() {
        let name = SwimmerName::parse_full("Lotte van   der Berg").unwrap();
        assert_eq!(name.first(), "Lotte");
        assert_eq!(name.last(), "van der Berg");
    }

    #[test]
    fn test_parse_full_rejects_single_token() {
        assert!(matches!(
            SwimmerName::parse_full("Cher"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(SwimmerName::parse_full("   ").is_err());
    }

    #[test]
    fn test_empty_parts_rejected() {
        assert!(SwimmerName::new("", "Smith").is_err());
        assert!(SwimmerName::new("Alice", "   ").is_err());
    }

    #[test]
    fn test_matching() {
        let name = SwimmerName::new("Jane", "Smith").unwrap();
        assert!(name.matches_exactly("JANE  smith"));
        assert!(!name.matches_exactly("Smith Jane"));
        assert!(name.matches_loosely("Smith, Jane"));
        assert!(!name.matches_loosely("Jane Doe"));
    }
}

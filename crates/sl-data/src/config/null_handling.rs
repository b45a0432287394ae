//! Null value handling for data loading

use serde::{Serialize, Deserialize};

/// Null value configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullConfig {
    /// Patterns to treat as null
    pub patterns: Vec<String>,
    
    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,
    
    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                String::new(),      // Empty string
                "NA".to_string(),
                "N/A".to_string(),
                "#N/A".to_string(),
                "NULL".to_string(),
                "null".to_string(),
                "NaN".to_string(),
                "nan".to_string(),
                "None".to_string(),
            ],
            trim_whitespace: true,
            case_sensitive: true,
        }
    }
}

impl NullConfig {
    /// Check if a value should be treated as null
    pub fn is_null(&self, value: &str) -> bool {
        let test_value = if self.trim_whitespace {
            value.trim()
        } else {
            value
        };
        
        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                test_value == pattern
            } else {
                test_value.eq_ignore_ascii_case(pattern)
            }
        })
    }
    
    /// Add a null pattern
    pub fn add_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let config = NullConfig::default();

        assert!(config.is_null(""));
        assert!(config.is_null("   "));
        assert!(config.is_null(" NA "));
        assert!(config.is_null("#N/A"));
        assert!(!config.is_null("na"));
        assert!(!config.is_null("0"));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let mut config = NullConfig::default();
        config.case_sensitive = false;
        config.add_pattern("missing".to_string());

        assert!(config.is_null("MISSING"));
        assert!(config.is_null("na"));
    }
}

//! Bridge API version comparison.
//!
//! Entertainment streaming needs bridge API 1.22 or newer.  Versions are
//! dotted numeric strings (`"1.48.0"`) and are compared component by
//! component, so `1.100` is newer than `1.22`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Oldest bridge API version that supports entertainment streaming.
pub const MIN_API_VERSION: &str = "1.22";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid API version {0:?}")]
pub struct ApiVersionError(String);

/// A dotted numeric version.  Missing trailing components compare as zero.
#[derive(Debug, Clone, Eq)]
pub struct ApiVersion(Vec<u32>);

impl ApiVersion {
    /// Returns `true` if `self >= minimum`.
    pub fn supports(&self, minimum: &ApiVersion) -> bool {
        self >= minimum
    }
}

impl FromStr for ApiVersion {
    type Err = ApiVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ApiVersionError(s.to_string()))?;
        Ok(Self(parts))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ApiVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_numeric_not_lexical_comparison() {
        assert!(v("1.100.0") > v("1.22"));
        assert!(v("1.9") < v("1.22"));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(v("1.22"), v("1.22.0"));
        assert!(v("1.22.0").supports(&v(MIN_API_VERSION)));
    }

    #[test]
    fn test_supports_minimum() {
        let min = v(MIN_API_VERSION);
        assert!(v("1.48.0").supports(&min));
        assert!(!v("1.21.9").supports(&min));
    }

    #[test]
    fn test_invalid_versions_are_rejected() {
        assert!("".parse::<ApiVersion>().is_err());
        assert!("1.x".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_display_round_trips_components() {
        assert_eq!(v("1.48.0").to_string(), "1.48.0");
    }
}

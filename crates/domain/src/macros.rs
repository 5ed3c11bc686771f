//! Macro for implementing Display and FromStr for string-keyed enums
//!
//! Used for enums that appear in configuration files and log fields, such as
//! [`crate::Strategy`]. Parsing is case-insensitive; display is the canonical
//! lowercase form.
//!
//! # Example
//!
//! ```rust
//! use tidepool_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SweepKind {
//!     Version,
//!     Expiry,
//! }
//!
//! impl_domain_status_conversions!(SweepKind {
//!     Version => "version",
//!     Expiry => "expiry",
//! });
//!
//! assert_eq!(SweepKind::Expiry.to_string(), "expiry");
//! ```

/// Implements Display and FromStr traits for string-keyed enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestKind {
        Version,
        Expiry,
    }

    impl_domain_status_conversions!(TestKind {
        Version => "version",
        Expiry => "expiry",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestKind::Version.to_string(), "version");
        assert_eq!(TestKind::Expiry.to_string(), "expiry");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(TestKind::from_str("VeRsIoN").unwrap(), TestKind::Version);
        assert_eq!(TestKind::from_str("EXPIRY").unwrap(), TestKind::Expiry);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestKind::from_str("invalid");
        assert!(result.unwrap_err().contains("Invalid TestKind: invalid"));
        assert!(TestKind::from_str("").is_err());
    }
}

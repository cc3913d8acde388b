//! Macro for implementing Display and FromStr for closed string enums
//!
//! Field kinds, validation codes, operations and session states all travel as
//! lowercase strings (CLI arguments, logs, JSON). One macro keeps the two
//! directions in sync.
//!
//! # Example
//!
//! ```rust
//! use sfsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Inbound,
//!     Outbound,
//! }
//!
//! impl_domain_status_conversions!(Direction {
//!     Inbound => "inbound",
//!     Outbound => "outbound",
//! });
//! ```

/// Implements `Display` (lowercase string) and `FromStr` (case-insensitive)
/// for an enum from a `Variant => "string"` table
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

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
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
    enum Direction {
        Inbound,
        Outbound,
    }

    impl_domain_status_conversions!(Direction {
        Inbound => "inbound",
        Outbound => "outbound",
    });

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Direction::Inbound.to_string(), "inbound");
        assert_eq!(Direction::Outbound.to_string(), "outbound");
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!(Direction::from_str("OutBound").unwrap(), Direction::Outbound);
        assert_eq!(Direction::from_str("INBOUND").unwrap(), Direction::Inbound);
    }

    #[test]
    fn unknown_values_name_the_enum() {
        let err = Direction::from_str("sideways").unwrap_err();
        assert_eq!(err, "Invalid Direction: sideways");
        assert!(Direction::from_str("").is_err());
    }
}

//! Macro for implementing Display and FromStr for configuration enums
//!
//! Config knobs such as the results path or the log format are read from
//! environment variables as plain strings. This macro keeps the textual
//! form and the parser in one place.
//!
//! # Example
//!
//! ```rust
//! use bqstream_domain::impl_config_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Mode {
//!     Fast,
//!     Safe,
//! }
//!
//! impl_config_enum_conversions!(Mode {
//!     Fast => "fast",
//!     Safe => "safe",
//! });
//! ```

/// Implements Display and case-insensitive FromStr for unit enums
#[macro_export]
macro_rules! impl_config_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::errors::BqError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::errors::BqError::Config(format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}

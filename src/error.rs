//! Error types for ipfilter.

use std::fmt;
use thiserror::Error;

/// Error type for ipfilter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A subnet in the filter list could not be parsed
    #[error(transparent)]
    InvalidSubnet(#[from] InvalidSubnetError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV/TSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for ipfilter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a subnet literal was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetErrorKind {
    /// Not an `address/prefix` literal, or the prefix is out of range
    Malformed,
    /// Host bits are set beyond the prefix (strict parsing only)
    HostBitsSet,
}

impl fmt::Display for SubnetErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetErrorKind::Malformed => write!(f, "not a CIDR network literal"),
            SubnetErrorKind::HostBitsSet => write!(f, "host bits set"),
        }
    }
}

/// Error returned when a subnet list cannot be turned into a filter.
///
/// Carries the offending entry, its position, and the full list that was
/// supplied so callers can report exactly what went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid subnet {subnet:?} at position {position} ({reason}) in list {subnets:?}")]
pub struct InvalidSubnetError {
    /// The subnet text that failed to parse
    pub subnet: String,
    /// Index of the subnet in the input list
    pub position: usize,
    /// Every subnet that was supplied
    pub subnets: Vec<String>,
    /// Failure reason
    pub reason: SubnetErrorKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_subnet_display() {
        let err = InvalidSubnetError {
            subnet: "10.0.0.0/33".to_string(),
            position: 1,
            subnets: vec!["192.168.0.0/16".to_string(), "10.0.0.0/33".to_string()],
            reason: SubnetErrorKind::Malformed,
        };

        let msg = err.to_string();
        assert!(msg.contains("\"10.0.0.0/33\""));
        assert!(msg.contains("position 1"));
        assert!(msg.contains("192.168.0.0/16"));
    }

    #[test]
    fn test_error_from_invalid_subnet() {
        let err: Error = InvalidSubnetError {
            subnet: "x".to_string(),
            position: 0,
            subnets: vec!["x".to_string()],
            reason: SubnetErrorKind::Malformed,
        }
        .into();

        assert!(matches!(err, Error::InvalidSubnet(_)));
        assert!(err.to_string().starts_with("invalid subnet"));
    }

    #[test]
    fn test_host_bits_reason_display() {
        assert_eq!(SubnetErrorKind::HostBitsSet.to_string(), "host bits set");
    }
}

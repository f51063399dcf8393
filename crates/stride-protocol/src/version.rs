//! Protocol versions understood by the server.

use thiserror::Error;

/// Protocol versions the server can negotiate.
///
/// The version decides the shape of scenario payloads: version 20 sends a
/// plain scenario file, version 21 may attach pre-computed cache data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    /// Plain scenario transfer.
    V20,
    /// Scenario transfer with optional cache data.
    V21,
}

impl ProtocolVersion {
    /// Version the server runs.
    pub const CURRENT: Self = Self::V21;

    /// Parses a version number announced by a client.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedVersion`] for any number other than 20 or 21.
    pub const fn from_number(number: u32) -> Result<Self, UnsupportedVersion> {
        match number {
            20 => Ok(Self::V20),
            21 => Ok(Self::V21),
            other => Err(UnsupportedVersion(other)),
        }
    }

    /// Returns the wire number.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::V20 => 20,
            Self::V21 => 21,
        }
    }
}

/// Error returned for an unknown protocol version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported protocol version {0}")]
pub struct UnsupportedVersion(pub u32);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(20, ProtocolVersion::V20)]
    #[case(21, ProtocolVersion::V21)]
    fn parses_known_versions(#[case] number: u32, #[case] expected: ProtocolVersion) {
        assert_eq!(ProtocolVersion::from_number(number), Ok(expected));
        assert_eq!(expected.number(), number);
    }

    #[rstest]
    #[case(0)]
    #[case(19)]
    #[case(22)]
    fn rejects_unknown_versions(#[case] number: u32) {
        let error = ProtocolVersion::from_number(number).expect_err("unknown version");
        assert_eq!(error.to_string(), format!("unsupported protocol version {number}"));
    }
}

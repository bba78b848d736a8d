//! Store version parsing and ordering
//!
//! Versions arrive as `major.minor[.patch]`, possibly with a build suffix
//! glued onto the last component (`0.9.0a757326`). Comparison is
//! component-wise: major, then minor, then patch.

use std::fmt;
use std::str::FromStr;

use super::errors::{CapabilityError, CapabilityResult};

/// A resolved document store version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl StoreVersion {
    /// Creates a version from its components
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `major.minor[.patch]`.
    ///
    /// Each component is read up to its first non-digit, so vendor suffixes
    /// are ignored. Major and minor are mandatory.
    pub fn parse(input: &str) -> CapabilityResult<Self> {
        let trimmed = input.trim();
        let mut parts = trimmed.split('.');

        let major = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(|| CapabilityError::invalid_version(trimmed))?;
        let minor = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(|| CapabilityError::invalid_version(trimmed))?;
        let patch = match parts.next() {
            Some(part) => leading_number(part).unwrap_or(0),
            None => 0,
        };

        Ok(Self::new(major, minor, patch))
    }

    /// Returns true if this version is at least `other`
    pub fn at_least(&self, other: StoreVersion) -> bool {
        *self >= other
    }
}

/// Reads the leading run of ASCII digits, None if there is none
fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl FromStr for StoreVersion {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

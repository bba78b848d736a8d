//! Version-gated behaviour of the document store
//!
//! Three questions are answered here and nowhere else:
//! - can a view's reduce step be toggled per query (so counting can share
//!   the finder's view instead of fetching every row)
//! - what the row limit parameter is called
//! - can several exact keys be fetched in one request

use super::errors::{CapabilityError, CapabilityResult};
use super::version::StoreVersion;

/// Newest store version this layer knows about
pub const LATEST_STORE_VERSION: StoreVersion = StoreVersion::new(0, 9, 0);

const REDUCE_COUNTING_SINCE: StoreVersion = StoreVersion::new(0, 9, 0);
const MULTI_KEY_SINCE: StoreVersion = StoreVersion::new(0, 9, 0);
const LIMIT_RENAMED_SINCE: StoreVersion = StoreVersion::new(0, 9, 0);

/// Name of the row limit parameter on view queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitParam {
    /// Current name
    Limit,
    /// Legacy name used before the rename
    Count,
}

impl LimitParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitParam::Limit => "limit",
            LimitParam::Count => "count",
        }
    }
}

/// Store features that are gated on version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Reduce can be switched off per query, so one view serves find and count
    ReduceCounting,
    /// `keys` lookups fetching several exact keys in one request
    MultiKey,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ReduceCounting => "reduce counting",
            Feature::MultiKey => "multi-key retrieval",
        }
    }
}

/// Immutable capability answers for one resolved store version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProfile {
    version: StoreVersion,
    reduce_counting: bool,
    multi_key: bool,
    limit_param: LimitParam,
}

impl CapabilityProfile {
    /// Derives the profile for a version
    pub fn from_version(version: StoreVersion) -> Self {
        let limit_param = if version.at_least(LIMIT_RENAMED_SINCE) {
            LimitParam::Limit
        } else {
            LimitParam::Count
        };

        Self {
            version,
            reduce_counting: version.at_least(REDUCE_COUNTING_SINCE),
            multi_key: version.at_least(MULTI_KEY_SINCE),
            limit_param,
        }
    }

    /// Parses a version string and derives the profile
    pub fn resolve(version: &str) -> CapabilityResult<Self> {
        StoreVersion::parse(version).map(Self::from_version)
    }

    /// Profile for the newest known store
    pub fn latest() -> Self {
        Self::from_version(LATEST_STORE_VERSION)
    }

    pub fn version(&self) -> StoreVersion {
        self.version
    }

    pub fn reduce_counting(&self) -> bool {
        self.reduce_counting
    }

    pub fn multi_key(&self) -> bool {
        self.multi_key
    }

    pub fn limit_param(&self) -> LimitParam {
        self.limit_param
    }

    /// Returns true if the feature is available
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::ReduceCounting => self.reduce_counting,
            Feature::MultiKey => self.multi_key,
        }
    }

    /// Fails with a capability mismatch if the feature is unavailable
    pub fn require(&self, feature: Feature) -> CapabilityResult<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(CapabilityError::Unsupported {
                feature,
                version: self.version,
            })
        }
    }
}

impl Default for CapabilityProfile {
    fn default() -> Self {
        Self::latest()
    }
}

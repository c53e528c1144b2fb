//! Maven-compatible version handling
//!
//! This crate provides version parsing and ordering following Maven's
//! `ComparableVersion` rules, and matching against Maven version ranges
//! such as `[1.0,2.0)`.

mod comparator;
mod range;
mod version;

pub use comparator::VersionComparator;
pub use range::{Bound, Restriction, VersionError, VersionRange};
pub use version::{Version, SNAPSHOT_SUFFIX};

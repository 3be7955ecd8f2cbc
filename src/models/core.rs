//! Core types used across models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Generation stamp attached to every document value.
///
/// Each construction or copy-on-write edit draws a fresh version from a
/// process-wide counter, so two values share a version only when one is a
/// plain clone of the other. Caches key on versions instead of object identity.
///
/// # Examples
///
/// ```
/// use tileview::models::Version;
///
/// let a = Version::next();
/// let b = Version::next();
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(u64);

impl Version {
    /// Draw a new, never-before-seen version.
    pub fn next() -> Self {
        Version(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::next()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A non-fatal diagnostic produced while rendering or converting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

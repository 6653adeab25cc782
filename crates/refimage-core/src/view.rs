//! View identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a host view (a window or viewport).
///
/// Every cache is partitioned per view. Ids are assigned by the host and
/// must not be reused for a new view until the old one has been torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

pub type Point3 = glam::Vec3;

/// Opaque handle for a participant owned by the host.
///
/// Effects store this key instead of a live reference and resolve the
/// actor's position through the host on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    num::ParseIntError,
    str::FromStr,
};

/// The server-assigned identifier for a [`Plan`](crate::Plan).
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Hash,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlanId(u64);

impl PlanId {
    pub const fn new(id: u64) -> Self { PlanId(id) }

    pub const fn get(self) -> u64 { self.0 }
}

impl From<u64> for PlanId {
    fn from(other: u64) -> PlanId { PlanId(other) }
}

impl Display for PlanId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for PlanId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<PlanId, Self::Err> {
        s.trim().parse().map(PlanId)
    }
}

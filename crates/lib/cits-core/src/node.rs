use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A unique ID that is a property of every node in the network, RSU and OBU alike.
#[derive(
    Serialize, Deserialize, Default, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash,
)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.parse::<u32>()?;
        Ok(Self(id))
    }
}

impl From<u32> for NodeId {
    fn from(f: u32) -> Self {
        Self(f)
    }
}

impl NodeId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// The role a node plays in the network. An RSU is fixed infrastructure that
/// coordinates the vehicles in its range, an OBU runs aboard a vehicle.
#[derive(Serialize, Deserialize, Debug, Hash, Copy, Default, Clone, PartialEq, Eq)]
pub enum NodeRole {
    Rsu,
    #[default]
    Obu,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Rsu => write!(f, "RSU"),
            NodeRole::Obu => write!(f, "OBU"),
        }
    }
}

/// Identity of the running node. Immutable for the process lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub role: NodeRole,
}

impl NodeInfo {
    pub fn new(id: NodeId, role: NodeRole) -> Self {
        Self { id, role }
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role, self.id)
    }
}

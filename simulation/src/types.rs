//! Core types for NetSim
//!
//! Models a small network as devices and structural nodes joined by cables,
//! each of which can be switched off to represent a hardware failure.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Identifier of a node, stable within one generated topology
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a link, derived from its ordered endpoint pair
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub String);

impl LinkId {
    /// The id of the link created from `source` to `target`
    pub fn between(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("{}-{}", source, target))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LinkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The four canonical network shapes
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    #[display("BUS")]
    Bus,
    #[display("RING")]
    Ring,
    #[display("STAR")]
    Star,
    #[display("MESH")]
    Mesh,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 4] = [Self::Bus, Self::Ring, Self::Star, Self::Mesh];

    /// Whether every station on the medium sees every frame
    pub fn is_broadcast(self) -> bool {
        matches!(self, Self::Bus)
    }
}

impl FromStr for TopologyKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bus" => Ok(Self::Bus),
            "ring" => Ok(Self::Ring),
            "star" => Ok(Self::Star),
            "mesh" => Ok(Self::Mesh),
            _ => Err(ParseError {
                what: "topology",
                value: s.to_string(),
            }),
        }
    }
}

/// What a node is for; fixed at creation
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// A PC; the only valid sender or receiver
    #[display("device")]
    Device,
    /// Central switch of a star
    #[display("switch")]
    Switch,
    /// Joint on the bus cable
    #[display("backbone")]
    Backbone,
    /// Cap at either end of the bus
    #[display("terminator")]
    Terminator,
}

impl NodeRole {
    pub fn is_endpoint(self) -> bool {
        matches!(self, Self::Device)
    }
}

/// 2D coordinate in abstract layout units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The drawing area a topology is laid out in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Layout {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// Radius used by the circular layouts
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) / 3.0
    }
}

/// A vertex of the topology graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    /// Display name, empty for backbone joints
    pub label: String,
    pub role: NodeRole,
    /// False once the user has broken the node
    pub active: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, position: Position, label: impl Into<String>, role: NodeRole) -> Self {
        Self {
            id: NodeId::new(id),
            position,
            label: label.into(),
            role,
            active: true,
        }
    }

    pub fn is_device(&self) -> bool {
        self.role.is_endpoint()
    }
}

/// An undirected cable between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    /// False once the user has cut the cable
    pub active: bool,
}

impl Link {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: LinkId::between(&source, &target),
            source,
            target,
            active: true,
        }
    }

    /// Whether `node` is one of the endpoints
    pub fn touches(&self, node: &NodeId) -> bool {
        self.source == *node || self.target == *node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if self.source == *node {
            Some(&self.target)
        } else if self.target == *node {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Terminal status shown on a node once a run completes
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// The designated receiver got the frame
    #[display("accepted")]
    Accepted,
    /// A station got a frame not addressed to it and discarded it
    #[display("rejected")]
    Rejected,
}

/// A packet drawn at one tick of the animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketState {
    /// Stable per concurrent path: `p-{index}`
    pub id: String,
    pub position: Position,
}

/// Outcome of one transmission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Whether the designated receiver was reached
    pub success: bool,
    /// Sender to receiver, empty when the receiver was not reached
    pub path: Vec<NodeId>,
    /// Human-readable cause
    pub log: String,
}

/// Language of the human-readable strings the engine emits
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[display("en")]
    En,
    #[display("fr")]
    Fr,
}

impl Language {
    pub fn arrived(self) -> &'static str {
        match self {
            Self::En => "Packet arrived successfully!",
            Self::Fr => "Paquet arrivé avec succès !",
        }
    }

    pub fn dropped(self) -> &'static str {
        match self {
            Self::En => "Packet dropped. No path found.",
            Self::Fr => "Paquet perdu. Aucun chemin trouvé.",
        }
    }

    /// Language name as written in an explanation prompt
    pub fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Fr => "French",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "fr" | "french" => Ok(Self::Fr),
            _ => Err(ParseError {
                what: "language",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_id_from_endpoints() {
        let link = Link::new(NodeId::from("b0"), NodeId::from("b1"));
        assert_eq!(link.id.as_str(), "b0-b1");
        assert!(link.active);
    }

    #[test]
    fn test_link_other_end() {
        let link = Link::new(NodeId::from("switch"), NodeId::from("n2"));
        assert_eq!(link.other_end(&NodeId::from("n2")), Some(&NodeId::from("switch")));
        assert_eq!(link.other_end(&NodeId::from("switch")), Some(&NodeId::from("n2")));
        assert_eq!(link.other_end(&NodeId::from("n3")), None);
        assert!(link.touches(&NodeId::from("n2")));
    }

    #[test]
    fn test_topology_kind_parsing() {
        assert_eq!("bus".parse::<TopologyKind>().unwrap(), TopologyKind::Bus);
        assert_eq!("MESH".parse::<TopologyKind>().unwrap(), TopologyKind::Mesh);
        assert!("tree".parse::<TopologyKind>().is_err());
        assert_eq!(TopologyKind::Star.to_string(), "STAR");
    }

    #[test]
    fn test_only_devices_are_endpoints() {
        assert!(NodeRole::Device.is_endpoint());
        assert!(!NodeRole::Switch.is_endpoint());
        assert!(!NodeRole::Backbone.is_endpoint());
        assert!(!NodeRole::Terminator.is_endpoint());
    }

    #[test]
    fn test_layout_geometry() {
        let layout = Layout::new(900.0, 600.0);
        assert_eq!(layout.center(), Position::new(450.0, 300.0));
        assert_eq!(layout.radius(), 200.0);
    }

    #[test]
    fn test_language_messages() {
        assert_eq!(Language::default(), Language::En);
        assert_eq!("fr".parse::<Language>().unwrap(), Language::Fr);
        assert_ne!(Language::En.dropped(), Language::Fr.dropped());
    }
}

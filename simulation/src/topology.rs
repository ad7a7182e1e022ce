//! Topology generation for NetSim
//!
//! Builds the four canonical shapes deterministically from a layout area:
//! - Bus: backbone joints on a line, drop cables to devices, terminators at both ends
//! - Ring: devices on a circle, each cabled to its clockwise neighbour
//! - Star: devices around a central switch
//! - Mesh: four devices, every pair cabled

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::types::{Layout, Link, LinkId, Node, NodeId, NodeRole, Position, TopologyKind};

/// Devices on the bus
pub const BUS_STATIONS: usize = 6;
/// Devices on the ring
pub const RING_STATIONS: usize = 6;
/// Devices around the switch
pub const STAR_STATIONS: usize = 6;
/// Devices in the full mesh; edge count grows quadratically
pub const MESH_STATIONS: usize = 4;

/// Vertical distance between the bus cable and a device
const DROP_CABLE_LENGTH: f64 = 90.0;
/// Horizontal distance between an end joint and its terminator
const TERMINATOR_OFFSET: f64 = 30.0;

/// A generated network: nodes, cables and their failure flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    kind: TopologyKind,
    layout: Layout,
    nodes: Vec<Node>,
    links: Vec<Link>,
}

/// Generate the topology of `kind` laid out in `layout`
///
/// Same inputs always give the same ids, roles and positions.
pub fn generate(kind: TopologyKind, layout: Layout) -> Topology {
    let builder = TopologyBuilder::new(layout);
    match kind {
        TopologyKind::Bus => builder.bus(),
        TopologyKind::Ring => builder.ring(),
        TopologyKind::Star => builder.star(),
        TopologyKind::Mesh => builder.mesh(),
    }
}

/// Builder for the canonical topologies
pub struct TopologyBuilder {
    layout: Layout,
}

impl TopologyBuilder {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Build a bus: a backbone cable capped by terminators, devices alternating above and below
    ///
    /// ```text
    ///        n0        n2        n4
    ///        |         |         |
    /// T --- b0 - b1 - b2 - b3 - b4 - b5 --- T
    ///             |         |         |
    ///             n1        n3        n5
    /// ```
    pub fn bus(self) -> Topology {
        let mut topology = Topology::empty(TopologyKind::Bus, self.layout);
        let spacing = self.layout.width / (BUS_STATIONS as f64 + 1.0);
        let cable_y = self.layout.center().y;

        for i in 0..BUS_STATIONS {
            let x = spacing * (i as f64 + 1.0);
            topology.add_node(Node::new(
                format!("b{}", i),
                Position::new(x, cable_y),
                "",
                NodeRole::Backbone,
            ));
        }

        for i in 0..BUS_STATIONS {
            let x = spacing * (i as f64 + 1.0);
            let y = if i % 2 == 0 {
                cable_y - DROP_CABLE_LENGTH
            } else {
                cable_y + DROP_CABLE_LENGTH
            };
            topology.add_node(Node::new(
                format!("n{}", i),
                Position::new(x, y),
                format!("PC {}", i + 1),
                NodeRole::Device,
            ));
        }

        topology.add_node(Node::new(
            "t_left",
            Position::new(spacing - TERMINATOR_OFFSET, cable_y),
            "Term",
            NodeRole::Terminator,
        ));
        topology.add_node(Node::new(
            "t_right",
            Position::new(spacing * BUS_STATIONS as f64 + TERMINATOR_OFFSET, cable_y),
            "Term",
            NodeRole::Terminator,
        ));

        for i in 0..BUS_STATIONS - 1 {
            topology.connect(&format!("b{}", i), &format!("b{}", i + 1));
        }
        topology.connect("t_left", "b0");
        topology.connect(&format!("b{}", BUS_STATIONS - 1), "t_right");
        for i in 0..BUS_STATIONS {
            topology.connect(&format!("n{}", i), &format!("b{}", i));
        }

        topology
    }

    /// Build a ring: n0 - n1 - ... - n5 - n0, no chords
    pub fn ring(self) -> Topology {
        let mut topology = Topology::empty(TopologyKind::Ring, self.layout);
        topology.add_devices_on_circle(RING_STATIONS, -PI / 2.0);

        for i in 0..RING_STATIONS {
            topology.connect(&format!("n{}", i), &format!("n{}", (i + 1) % RING_STATIONS));
        }

        topology
    }

    /// Build a star: the switch in the centre, one spoke per device
    pub fn star(self) -> Topology {
        let mut topology = Topology::empty(TopologyKind::Star, self.layout);
        topology.add_node(Node::new(
            "switch",
            self.layout.center(),
            "Switch",
            NodeRole::Switch,
        ));
        topology.add_devices_on_circle(STAR_STATIONS, 0.0);

        for i in 0..STAR_STATIONS {
            topology.connect("switch", &format!("n{}", i));
        }

        topology
    }

    /// Build a full mesh (K4): every device cabled to every other
    pub fn mesh(self) -> Topology {
        let mut topology = Topology::empty(TopologyKind::Mesh, self.layout);
        topology.add_devices_on_circle(MESH_STATIONS, -PI / 2.0);

        for i in 0..MESH_STATIONS {
            for j in (i + 1)..MESH_STATIONS {
                topology.connect(&format!("n{}", i), &format!("n{}", j));
            }
        }

        topology
    }
}

impl Topology {
    fn empty(kind: TopologyKind, layout: Layout) -> Self {
        Self {
            kind,
            layout,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Place `count` devices `n0..` evenly on the layout circle
    fn add_devices_on_circle(&mut self, count: usize, start_angle: f64) {
        let center = self.layout.center();
        let radius = self.layout.radius();
        for i in 0..count {
            let angle = (i as f64 / count as f64) * 2.0 * PI + start_angle;
            self.add_node(Node::new(
                format!("n{}", i),
                Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()),
                format!("PC {}", i + 1),
                NodeRole::Device,
            ));
        }
    }

    fn connect(&mut self, source: &str, target: &str) {
        self.links.push(Link::new(NodeId::from(source), NodeId::from(target)));
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// All nodes, in creation order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links, in creation order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == *id)
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == *id)
    }

    /// The cable joining `a` and `b`, whichever direction it was created in
    pub fn link_between(&self, a: &NodeId, b: &NodeId) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| (l.source == *a && l.target == *b) || (l.source == *b && l.target == *a))
    }

    /// Devices (valid senders and receivers), in creation order
    pub fn devices(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_device())
    }

    pub fn device_ids(&self) -> Vec<NodeId> {
        self.devices().map(|n| n.id.clone()).collect()
    }

    /// First two devices, the default sender and receiver
    pub fn default_endpoints(&self) -> Option<(NodeId, NodeId)> {
        let mut devices = self.devices();
        let sender = devices.next()?.id.clone();
        let receiver = devices.next()?.id.clone();
        Some((sender, receiver))
    }

    /// Nodes cabled to `id`, ignoring failures
    pub fn neighbors(&self, id: &NodeId) -> Vec<&NodeId> {
        self.links.iter().filter_map(|l| l.other_end(id)).collect()
    }

    /// Number of cables attached to `id`, ignoring failures
    pub fn degree(&self, id: &NodeId) -> usize {
        self.links.iter().filter(|l| l.touches(id)).count()
    }

    /// Flip a node between working and broken; returns the new state
    pub fn toggle_node(&mut self, id: &NodeId) -> Result<bool, TopologyError> {
        let node = self.node_mut(id)?;
        node.active = !node.active;
        Ok(node.active)
    }

    /// Flip a cable between working and cut; returns the new state
    pub fn toggle_link(&mut self, id: &LinkId) -> Result<bool, TopologyError> {
        let link = self.link_mut(id)?;
        link.active = !link.active;
        Ok(link.active)
    }

    pub fn set_node_active(&mut self, id: &NodeId, active: bool) -> Result<(), TopologyError> {
        self.node_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_link_active(&mut self, id: &LinkId, active: bool) -> Result<(), TopologyError> {
        self.link_mut(id)?.active = active;
        Ok(())
    }

    /// Repair every node and cable
    pub fn reset(&mut self) {
        self.nodes.iter_mut().for_each(|n| n.active = true);
        self.links.iter_mut().for_each(|l| l.active = true);
    }

    pub fn inactive_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.active)
    }

    pub fn inactive_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| !l.active)
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, TopologyError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == *id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()))
    }

    fn link_mut(&mut self, id: &LinkId) -> Result<&mut Link, TopologyError> {
        self.links
            .iter_mut()
            .find(|l| l.id == *id)
            .ok_or_else(|| TopologyError::UnknownLink(id.clone()))
    }

    /// Print a simple ASCII description of the topology
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("{} Topology:\n", self.kind));
        output.push_str(&format!("  Nodes: {}\n", self.nodes.len()));
        output.push_str(&format!("  Links: {}\n\n", self.links.len()));

        for node in &self.nodes {
            let neighbors: Vec<String> = self.neighbors(&node.id).iter().map(|n| n.to_string()).collect();
            let state = if node.active { "" } else { " [broken]" };
            output.push_str(&format!(
                "  {:<8} {:<10} ({:>6.1}, {:>6.1}){} -> [{}]\n",
                node.id,
                node.role,
                node.position.x,
                node.position.y,
                state,
                neighbors.join(", ")
            ));
        }

        let cut: Vec<String> = self.inactive_links().map(|l| l.id.to_string()).collect();
        if !cut.is_empty() {
            output.push_str(&format!("\n  Cut cables: {}\n", cut.join(", ")));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_bus_topology() {
        let topology = generate(TopologyKind::Bus, Layout::default());
        // 6 joints, 6 devices, 2 terminators
        assert_eq!(topology.nodes().len(), 14);
        // 5 backbone segments, 2 terminator caps, 6 drop cables
        assert_eq!(topology.links().len(), 13);
        assert_eq!(topology.devices().count(), BUS_STATIONS);

        assert!(topology.link_between(&id("b2"), &id("b3")).is_some());
        assert!(topology.link_between(&id("n4"), &id("b4")).is_some());
        assert!(topology.link_between(&id("n0"), &id("n1")).is_none());

        assert_eq!(topology.degree(&id("t_left")), 1);
        assert_eq!(topology.degree(&id("t_right")), 1);
        assert_eq!(topology.node(&id("t_left")).unwrap().role, NodeRole::Terminator);
        assert_eq!(topology.node(&id("b0")).unwrap().label, "");
    }

    #[test]
    fn test_bus_layout() {
        let topology = generate(TopologyKind::Bus, Layout::new(700.0, 600.0));
        // spacing = 700 / 7
        let b0 = topology.node(&id("b0")).unwrap();
        assert_eq!(b0.position, Position::new(100.0, 300.0));
        let n0 = topology.node(&id("n0")).unwrap();
        assert_eq!(n0.position, Position::new(100.0, 210.0));
        let n1 = topology.node(&id("n1")).unwrap();
        assert_eq!(n1.position, Position::new(200.0, 390.0));
        assert_eq!(topology.node(&id("t_left")).unwrap().position.x, 70.0);
        assert_eq!(topology.node(&id("t_right")).unwrap().position.x, 630.0);
    }

    #[test]
    fn test_ring_topology() {
        let topology = generate(TopologyKind::Ring, Layout::default());
        assert_eq!(topology.nodes().len(), RING_STATIONS);
        assert_eq!(topology.links().len(), RING_STATIONS);

        assert!(topology.link_between(&id("n0"), &id("n1")).is_some());
        assert!(topology.link(&LinkId::from("n5-n0")).is_some()); // Wrap around
        assert!(topology.link_between(&id("n0"), &id("n3")).is_none()); // No chords
        for node in topology.nodes() {
            assert_eq!(topology.degree(&node.id), 2);
        }
    }

    #[test]
    fn test_ring_starts_at_top() {
        let layout = Layout::new(600.0, 600.0);
        let topology = generate(TopologyKind::Ring, layout);
        let n0 = topology.node(&id("n0")).unwrap();
        assert!((n0.position.x - 300.0).abs() < 1e-9);
        assert!((n0.position.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_star_topology() {
        let layout = Layout::default();
        let topology = generate(TopologyKind::Star, layout);
        assert_eq!(topology.nodes().len(), STAR_STATIONS + 1);
        assert_eq!(topology.links().len(), STAR_STATIONS);

        let switch = topology.node(&id("switch")).unwrap();
        assert_eq!(switch.role, NodeRole::Switch);
        assert_eq!(switch.position, layout.center());
        assert_eq!(topology.degree(&id("switch")), STAR_STATIONS);
        for device in topology.devices() {
            assert_eq!(topology.neighbors(&device.id), vec![&id("switch")]);
        }
    }

    #[test]
    fn test_full_mesh() {
        let topology = generate(TopologyKind::Mesh, Layout::default());
        assert_eq!(topology.nodes().len(), MESH_STATIONS);
        assert_eq!(topology.links().len(), 6); // C(4,2) = 6

        let devices = topology.device_ids();
        for a in &devices {
            for b in &devices {
                if a != b {
                    assert!(topology.link_between(a, b).is_some());
                }
            }
        }
    }

    #[test]
    fn test_every_device_is_cabled() {
        for kind in TopologyKind::ALL {
            let topology = generate(kind, Layout::default());
            assert!(topology.devices().count() >= 2, "{} has fewer than two devices", kind);
            for device in topology.devices() {
                assert!(topology.degree(&device.id) >= 1, "{} in {} is isolated", device.id, kind);
            }
        }
    }

    #[test]
    fn test_links_reference_existing_nodes() {
        for kind in TopologyKind::ALL {
            let topology = generate(kind, Layout::default());
            for link in topology.links() {
                assert!(topology.node(&link.source).is_some());
                assert!(topology.node(&link.target).is_some());
            }
            let mut ids: Vec<&LinkId> = topology.links().iter().map(|l| &l.id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), topology.links().len());
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let layout = Layout::new(1024.0, 768.0);
        for kind in TopologyKind::ALL {
            let a = generate(kind, layout);
            let b = generate(kind, layout);
            assert_eq!(a.nodes(), b.nodes());
            assert_eq!(a.links(), b.links());
        }
    }

    #[test]
    fn test_default_endpoints_are_devices() {
        let topology = generate(TopologyKind::Star, Layout::default());
        let (sender, receiver) = topology.default_endpoints().unwrap();
        assert_eq!(sender, id("n0"));
        assert_eq!(receiver, id("n1"));
    }

    #[test]
    fn test_toggle_and_reset() {
        let mut topology = generate(TopologyKind::Ring, Layout::default());
        assert!(!topology.toggle_node(&id("n2")).unwrap());
        assert!(!topology.toggle_link(&LinkId::from("n3-n4")).unwrap());
        assert_eq!(topology.inactive_nodes().count(), 1);
        assert_eq!(topology.inactive_links().count(), 1);

        topology.reset();
        assert_eq!(topology.inactive_nodes().count(), 0);
        assert_eq!(topology.inactive_links().count(), 0);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut topology = generate(TopologyKind::Mesh, Layout::default());
        assert_eq!(
            topology.toggle_node(&id("switch")),
            Err(TopologyError::UnknownNode(id("switch")))
        );
        assert_eq!(
            topology.set_link_active(&LinkId::from("n0-n9"), false),
            Err(TopologyError::UnknownLink(LinkId::from("n0-n9")))
        );
    }

    #[test]
    fn test_visualize_marks_failures() {
        let mut topology = generate(TopologyKind::Star, Layout::default());
        topology.set_node_active(&id("switch"), false).unwrap();
        let text = topology.visualize();
        assert!(text.starts_with("STAR Topology:"));
        assert!(text.contains("[broken]"));
    }
}

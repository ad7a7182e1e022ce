//! Transmission sequencer for NetSim
//!
//! Turns one send request into a tick-by-tick packet schedule:
//! - Target selection: bus broadcasts to every other device, the rest unicast
//! - One shortest path per reached target, all advancing on a shared tick
//! - Terminal classification (accepted / rejected) once the last tick has played
//!
//! The schedule is never precomputed for playback. [`Transmission::step`]
//! advances one tick and [`frame_at`] derives the visible packets for it, so
//! callers choose the clock (a timer, a test loop, a CLI).

use std::collections::BTreeMap;

use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::error::{SessionError, TopologyError};
use crate::reachability::{ActiveAdjacency, find_path};
use crate::topology::Topology;
use crate::types::{DeliveryStatus, Language, NodeId, PacketState, SimulationResult, TopologyKind};

/// Packets visible at one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub tick: usize,
    pub packets: Vec<PacketState>,
}

/// Everything a finished run hands to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub result: SimulationResult,
    /// Terminal status per node; nodes without an entry are unset
    pub statuses: BTreeMap<NodeId, DeliveryStatus>,
    /// Targets an active path was found to, in target order
    pub reached: Vec<NodeId>,
}

/// Result of advancing a transmission by one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Packets to draw for this tick
    Frame(Frame),
    /// The schedule ran out: packets are cleared and the run is classified
    Complete(Outcome),
    /// Stepping after completion; nothing changes
    Finished,
}

/// Check that a send request names two distinct devices
pub fn validate_endpoints(topology: &Topology, sender: &NodeId, receiver: &NodeId) -> Result<(), SessionError> {
    for id in [sender, receiver] {
        let node = topology
            .node(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()))?;
        if !node.is_device() {
            return Err(SessionError::NotADevice(id.clone()));
        }
    }
    if sender == receiver {
        return Err(SessionError::IdenticalEndpoints(sender.clone()));
    }
    Ok(())
}

/// Nodes the sender tries to reach
///
/// A bus is a shared medium, so every other station sees the frame. Every
/// other shape only targets the receiver.
pub fn select_targets(topology: &Topology, sender: &NodeId, receiver: &NodeId) -> Vec<NodeId> {
    if topology.kind().is_broadcast() {
        topology
            .devices()
            .filter(|n| n.id != *sender)
            .map(|n| n.id.clone())
            .collect()
    } else {
        vec![receiver.clone()]
    }
}

/// Packets visible at `tick`
///
/// A path contributes a packet only while it is longer than `tick`; a
/// finished path stops rendering rather than lingering on its last node.
pub fn frame_at(tick: usize, paths: &[Vec<NodeId>], topology: &Topology) -> Vec<PacketState> {
    paths
        .iter()
        .enumerate()
        .filter_map(|(idx, path)| {
            let node = topology.node(path.get(tick)?)?;
            Some(PacketState {
                id: format!("p-{}", idx),
                position: node.position,
            })
        })
        .collect()
}

/// Terminal status of every reached target
///
/// Bus bystanders stay unset: a broadcast seen by every station is not
/// flagged as a rejection.
pub fn classify(kind: TopologyKind, receiver: &NodeId, reached: &[NodeId]) -> BTreeMap<NodeId, DeliveryStatus> {
    reached
        .iter()
        .filter_map(|target| {
            if target == receiver {
                Some((target.clone(), DeliveryStatus::Accepted))
            } else if kind.is_broadcast() {
                None
            } else {
                Some((target.clone(), DeliveryStatus::Rejected))
            }
        })
        .collect()
}

/// One send attempt, from path computation to final classification
///
/// Owns a snapshot of the topology taken when the run was planned, so
/// failure toggles made elsewhere cannot leak into a run in progress.
#[derive(Debug, Clone)]
pub struct Transmission {
    run_id: Uuid,
    snapshot: Topology,
    sender: NodeId,
    receiver: NodeId,
    language: Language,
    paths: Vec<Vec<NodeId>>,
    reached: Vec<NodeId>,
    success: bool,
    tick: usize,
    finished: bool,
}

impl Transmission {
    /// Compute every path for a send from `sender` to `receiver`
    ///
    /// Refuses requests that do not name two distinct devices.
    pub fn plan(topology: &Topology, sender: &NodeId, receiver: &NodeId, language: Language) -> Result<Self, SessionError> {
        validate_endpoints(topology, sender, receiver)?;

        let run_id = Uuid::new_v4();
        let targets = select_targets(topology, sender, receiver);
        info!(
            %run_id,
            kind = %topology.kind(),
            %sender,
            %receiver,
            targets = targets.len(),
            "Planning transmission"
        );

        let adjacency = ActiveAdjacency::build(topology);
        let mut paths = Vec::new();
        let mut reached = Vec::new();

        for target in targets {
            match find_path(sender, &target, topology, &adjacency) {
                Some(path) => {
                    debug!(%run_id, %target, hops = path.len() - 1, "Target reachable");
                    paths.push(path);
                    reached.push(target);
                }
                None => {
                    debug!(%run_id, %target, "Target unreachable");
                }
            }
        }

        let success = reached.contains(receiver);

        // Nothing reachable: show the packet appearing and dying at the sender
        if paths.is_empty() {
            debug!(%run_id, %sender, "No target reachable, packet dies at sender");
            paths.push(vec![sender.clone()]);
        }

        Ok(Self {
            run_id,
            snapshot: topology.clone(),
            sender: sender.clone(),
            receiver: receiver.clone(),
            language,
            paths,
            reached,
            success,
            tick: 0,
            finished: false,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn kind(&self) -> TopologyKind {
        self.snapshot.kind()
    }

    pub fn sender(&self) -> &NodeId {
        &self.sender
    }

    pub fn receiver(&self) -> &NodeId {
        &self.receiver
    }

    /// Every animated path, including the degenerate sender-only one
    pub fn paths(&self) -> &[Vec<NodeId>] {
        &self.paths
    }

    /// Targets a path was found to
    pub fn reached(&self) -> &[NodeId] {
        &self.reached
    }

    /// Whether the receiver is reachable; known as soon as the run is planned
    pub fn success(&self) -> bool {
        self.success
    }

    /// Number of ticks in the schedule: the longest path length
    pub fn total_ticks(&self) -> usize {
        self.paths.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Index of the next tick `step` will play
    pub fn current_tick(&self) -> usize {
        self.tick
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance the shared tick counter by one
    pub fn step(&mut self) -> TickOutcome {
        if self.finished {
            return TickOutcome::Finished;
        }

        if self.tick >= self.total_ticks() {
            self.finished = true;
            let outcome = self.outcome();
            info!(
                run_id = %self.run_id,
                success = outcome.result.success,
                reached = outcome.reached.len(),
                "Transmission complete"
            );
            return TickOutcome::Complete(outcome);
        }

        let packets = frame_at(self.tick, &self.paths, &self.snapshot);
        trace!(run_id = %self.run_id, tick = self.tick, packets = packets.len(), "Tick");
        let frame = Frame {
            tick: self.tick,
            packets,
        };
        self.tick += 1;
        TickOutcome::Frame(frame)
    }

    /// Play every remaining tick without a clock
    pub fn run_to_completion(mut self) -> (Vec<Frame>, Outcome) {
        let mut frames = Vec::new();
        loop {
            match self.step() {
                TickOutcome::Frame(frame) => frames.push(frame),
                TickOutcome::Complete(outcome) => return (frames, outcome),
                // Only reachable when called on an already finished run
                TickOutcome::Finished => return (frames, self.outcome()),
            }
        }
    }

    fn outcome(&self) -> Outcome {
        let path = self
            .paths
            .iter()
            .find(|p| p.last() == Some(&self.receiver))
            .cloned()
            .unwrap_or_default();

        let log = if self.success {
            self.language.arrived()
        } else {
            self.language.dropped()
        };

        Outcome {
            result: SimulationResult {
                success: self.success,
                path,
                log: log.to_string(),
            },
            statuses: classify(self.kind(), &self.receiver, &self.reached),
            reached: self.reached.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::generate;
    use crate::types::{Layout, LinkId, Position};

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn ids(path: &[&str]) -> Vec<NodeId> {
        path.iter().map(|s| id(s)).collect()
    }

    fn plan(topology: &Topology, from: &str, to: &str) -> Transmission {
        Transmission::plan(topology, &id(from), &id(to), Language::En).unwrap()
    }

    #[test]
    fn test_bus_broadcast_reaches_every_station() {
        let topology = generate(TopologyKind::Bus, Layout::default());
        let transmission = plan(&topology, "n0", "n3");
        assert!(transmission.success());
        assert_eq!(transmission.reached(), ids(&["n1", "n2", "n3", "n4", "n5"]).as_slice());
        assert_eq!(transmission.paths().len(), 5);

        let (_, outcome) = transmission.run_to_completion();
        assert!(outcome.result.success);
        assert_eq!(outcome.result.path, ids(&["n0", "b0", "b1", "b2", "b3", "n3"]));
        assert_eq!(outcome.result.log, "Packet arrived successfully!");
        assert_eq!(outcome.statuses.get(&id("n3")), Some(&DeliveryStatus::Accepted));
        // Bystanders on the bus are left unset
        assert_eq!(outcome.statuses.len(), 1);
    }

    #[test]
    fn test_bus_schedule_length_is_longest_path() {
        let topology = generate(TopologyKind::Bus, Layout::default());
        let transmission = plan(&topology, "n0", "n3");
        // n0 -> b0..b5 -> n5 is 8 nodes long
        assert_eq!(transmission.total_ticks(), 8);

        let (frames, _) = transmission.run_to_completion();
        assert_eq!(frames.len(), 8);
        // All five paths start together at the sender
        assert_eq!(frames[0].packets.len(), 5);
        // Only the path to n5 is still moving on the last tick
        assert_eq!(frames[7].packets.len(), 1);
        assert_eq!(frames[7].packets[0].id, "p-4");
    }

    #[test]
    fn test_paths_advance_in_lockstep() {
        let topology = generate(TopologyKind::Bus, Layout::default());
        let transmission = plan(&topology, "n2", "n3");
        let paths = transmission.paths().to_vec();
        let (frames, _) = transmission.run_to_completion();

        for frame in &frames {
            for packet in &frame.packets {
                let idx: usize = packet.id.trim_start_matches("p-").parse().unwrap();
                let expected = topology.node(&paths[idx][frame.tick]).unwrap().position;
                assert_eq!(packet.position, expected);
            }
            let live = paths.iter().filter(|p| p.len() > frame.tick).count();
            assert_eq!(frame.packets.len(), live);
        }
    }

    #[test]
    fn test_unicast_targets_only_receiver() {
        let topology = generate(TopologyKind::Star, Layout::default());
        assert_eq!(select_targets(&topology, &id("n0"), &id("n3")), vec![id("n3")]);

        let (frames, outcome) = plan(&topology, "n0", "n3").run_to_completion();
        assert_eq!(frames.len(), 3);
        assert_eq!(outcome.result.path, ids(&["n0", "switch", "n3"]));
        assert_eq!(outcome.statuses.get(&id("n3")), Some(&DeliveryStatus::Accepted));
    }

    #[test]
    fn test_star_switch_down_drops_packet() {
        let mut topology = generate(TopologyKind::Star, Layout::default());
        topology.set_node_active(&id("switch"), false).unwrap();

        let transmission = plan(&topology, "n1", "n4");
        assert!(!transmission.success());
        assert_eq!(transmission.paths(), &[ids(&["n1"])]);

        let (frames, outcome) = transmission.run_to_completion();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].packets[0].position, topology.node(&id("n1")).unwrap().position);
        assert!(!outcome.result.success);
        assert!(outcome.result.path.is_empty());
        assert_eq!(outcome.result.log, "Packet dropped. No path found.");
        assert!(outcome.statuses.is_empty());
    }

    #[test]
    fn test_broken_sender_dies_at_origin() {
        let mut topology = generate(TopologyKind::Bus, Layout::default());
        topology.set_node_active(&id("n2"), false).unwrap();

        let transmission = plan(&topology, "n2", "n5");
        assert!(transmission.reached().is_empty());
        assert_eq!(transmission.total_ticks(), 1);
        let (_, outcome) = transmission.run_to_completion();
        assert!(!outcome.result.success);
    }

    #[test]
    fn test_bus_partial_broadcast_without_receiver() {
        let mut topology = generate(TopologyKind::Bus, Layout::default());
        topology.set_link_active(&LinkId::from("b2-b3"), false).unwrap();

        let transmission = plan(&topology, "n0", "n4");
        assert!(!transmission.success());
        assert_eq!(transmission.reached(), ids(&["n1", "n2"]).as_slice());

        let (_, outcome) = transmission.run_to_completion();
        assert!(outcome.result.path.is_empty());
        assert!(outcome.statuses.is_empty());
    }

    #[test]
    fn test_unicast_classification_rejects_non_receivers() {
        let reached = ids(&["n1", "n2"]);
        let statuses = classify(TopologyKind::Ring, &id("n2"), &reached);
        assert_eq!(statuses.get(&id("n1")), Some(&DeliveryStatus::Rejected));
        assert_eq!(statuses.get(&id("n2")), Some(&DeliveryStatus::Accepted));

        let statuses = classify(TopologyKind::Bus, &id("n2"), &reached);
        assert_eq!(statuses.get(&id("n1")), None);
        assert_eq!(statuses.get(&id("n2")), Some(&DeliveryStatus::Accepted));
    }

    #[test]
    fn test_frame_at_drops_finished_paths() {
        let topology = generate(TopologyKind::Ring, Layout::default());
        let paths = vec![ids(&["n0", "n1"]), ids(&["n0", "n5", "n4"])];

        assert_eq!(frame_at(0, &paths, &topology).len(), 2);
        let last = frame_at(2, &paths, &topology);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, "p-1");
        assert_eq!(last[0].position, topology.node(&id("n4")).unwrap().position);
        assert!(frame_at(3, &paths, &topology).is_empty());
    }

    #[test]
    fn test_step_after_completion_is_inert() {
        let topology = generate(TopologyKind::Mesh, Layout::default());
        let mut transmission = plan(&topology, "n0", "n2");
        assert!(matches!(transmission.step(), TickOutcome::Frame(Frame { tick: 0, .. })));
        assert!(matches!(transmission.step(), TickOutcome::Frame(Frame { tick: 1, .. })));
        assert!(matches!(transmission.step(), TickOutcome::Complete(_)));
        assert!(transmission.is_finished());
        assert_eq!(transmission.step(), TickOutcome::Finished);
    }

    #[test]
    fn test_snapshot_ignores_later_toggles() {
        let mut topology = generate(TopologyKind::Ring, Layout::default());
        let transmission = plan(&topology, "n0", "n2");
        topology.set_node_active(&id("n1"), false).unwrap();

        let (frames, outcome) = transmission.run_to_completion();
        assert_eq!(frames.len(), 3);
        assert!(outcome.result.success);
        assert_eq!(outcome.result.path, ids(&["n0", "n1", "n2"]));
    }

    #[test]
    fn test_french_log() {
        let mut topology = generate(TopologyKind::Mesh, Layout::default());
        topology.set_node_active(&id("n3"), false).unwrap();
        let transmission = Transmission::plan(&topology, &id("n0"), &id("n3"), Language::Fr).unwrap();
        let (_, outcome) = transmission.run_to_completion();
        assert_eq!(outcome.result.log, "Paquet perdu. Aucun chemin trouvé.");
    }

    #[test]
    fn test_invalid_requests_are_refused() {
        let topology = generate(TopologyKind::Bus, Layout::default());
        let refuse = |from: &str, to: &str| Transmission::plan(&topology, &id(from), &id(to), Language::En).unwrap_err();

        assert_eq!(refuse("n1", "n1"), SessionError::IdenticalEndpoints(id("n1")));
        assert_eq!(refuse("b1", "n1"), SessionError::NotADevice(id("b1")));
        assert_eq!(refuse("n1", "t_right"), SessionError::NotADevice(id("t_right")));
        assert_eq!(
            refuse("n1", "n9"),
            SessionError::Topology(TopologyError::UnknownNode(id("n9")))
        );
    }

    #[test]
    fn test_packet_ids_are_stable_per_path() {
        let topology = generate(TopologyKind::Bus, Layout::default());
        let (frames, _) = plan(&topology, "n5", "n0").run_to_completion();
        let first: Vec<&str> = frames[0].packets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(first, vec!["p-0", "p-1", "p-2", "p-3", "p-4"]);
        assert_ne!(frames[1].packets[0].position, Position::default());
    }
}

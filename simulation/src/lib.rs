//! # NetSim
//!
//! An educational network topology simulator with failure-aware packet delivery.
//!
//! ## Overview
//!
//! A small network is modelled as devices and structural nodes joined by
//! cables. Any node or cable can be broken, and a send from one device to
//! another then shows whether the frame still gets through:
//!
//! - **Four canonical shapes**: bus, ring, star and full mesh, generated deterministically
//! - **Failure-aware reachability**: shortest paths over the active graph only
//! - **Shared-medium broadcast**: on a bus every station sees the frame
//! - **Discrete ticks**: every path advances one hop per tick, in lockstep
//!
//! ## Architecture
//!
//! - **Types** (`types.rs`): Node and link ids, roles, positions, results
//! - **Topology** (`topology.rs`): Generation of the four shapes and failure toggles
//! - **Reachability** (`reachability.rs`): Active adjacency and breadth-first search
//! - **Sequencer** (`sequencer.rs`): Target selection, tick schedule, classification
//! - **Session** (`session.rs`): One topology, its endpoints and at most one run in flight
//! - **Pacing** (`pacing.rs`): Timer-driven playback with cancellation
//! - **Explain** (`explain.rs`): Boundary to an optional explanatory-text service
//! - **Scenarios** (`scenarios.rs`): Pre-built failure walkthroughs
//!
//! ## Example: star with a broken switch
//!
//! ```rust
//! use netsim_simulation::*;
//!
//! let mut session = Session::new(TopologyKind::Star, Layout::default());
//! session.set_sender(&NodeId::from("n1")).unwrap();
//! session.set_receiver(&NodeId::from("n4")).unwrap();
//!
//! // Healthy switch: n1 -> switch -> n4
//! let (_, result) = session.run_to_completion().unwrap();
//! assert!(result.success);
//!
//! // Switch down: every device is isolated
//! session.toggle_node(&NodeId::from("switch")).unwrap();
//! let (frames, result) = session.run_to_completion().unwrap();
//! assert!(!result.success);
//! assert_eq!(frames.len(), 1);
//! assert_eq!(result.log, "Packet dropped. No path found.");
//! ```

pub mod config;
pub mod error;
pub mod explain;
pub mod pacing;
pub mod reachability;
pub mod scenarios;
pub mod sequencer;
pub mod session;
pub mod topology;
pub mod types;

// Re-export main types
pub use types::{
    DeliveryStatus,
    Language,
    Layout,
    Link,
    LinkId,
    Node,
    NodeId,
    NodeRole,
    PacketState,
    Position,
    SimulationResult,
    TopologyKind,
};

pub use topology::{Topology, TopologyBuilder, generate};

pub use reachability::{ActiveAdjacency, find_path};

pub use sequencer::{Frame, Outcome, TickOutcome, Transmission, classify, frame_at, select_targets};

pub use session::Session;

pub use pacing::{Playback, play};

pub use explain::{Explainer, ExplanationRequest, UnavailableExplainer, explain_with_fallback};

pub use config::SimConfig;

pub use error::{ConfigError, ExplainError, NetSimError, ParseError, SessionError, TopologyError};

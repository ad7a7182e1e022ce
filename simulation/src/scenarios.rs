//! Pre-defined failure scenarios for NetSim
//!
//! Each one walks a topology through a few failures, printing the graph and
//! the outcome of every send along the way.

use tracing::info;

use crate::session::Session;
use crate::types::{Layout, LinkId, NodeId, SimulationResult, TopologyKind};

/// Send from the session's current endpoints and print the outcome
fn send_and_report(session: &mut Session) -> Option<SimulationResult> {
    let (sender, receiver) = (session.sender()?.clone(), session.receiver()?.clone());
    match session.run_to_completion() {
        Ok((frames, result)) => {
            println!("  {} -> {}: {} ({} ticks)", sender, receiver, result.log, frames.len());
            if !result.path.is_empty() {
                let hops: Vec<String> = result.path.iter().map(|n| n.to_string()).collect();
                println!("  Path: {}", hops.join(" -> "));
            }
            for (node, status) in session.statuses() {
                println!("    {} {}", node, status);
            }
            Some(result)
        }
        Err(e) => {
            println!("  Send refused: {}", e);
            None
        }
    }
}

fn select(session: &mut Session, from: &str, to: &str) {
    if let Err(e) = session
        .set_sender(&NodeId::from(from))
        .and_then(|_| session.set_receiver(&NodeId::from(to)))
    {
        println!("  Could not select {} -> {}: {}", from, to, e);
    }
}

fn break_node(session: &mut Session, id: &str) {
    if let Err(e) = session.toggle_node(&NodeId::from(id)) {
        println!("  Could not break {}: {}", id, e);
    }
}

fn cut_link(session: &mut Session, id: &str) {
    if let Err(e) = session.toggle_link(&LinkId::from(id)) {
        println!("  Could not cut {}: {}", id, e);
    }
}

/// Scenario: broadcast on an intact bus, then with the backbone cut
///
/// ```text
/// n0 sends to n3; every other station sees the frame.
/// Cutting b2-b3 splits the bus: n1 and n2 still hear it, n3 does not.
/// ```
pub fn run_bus_broadcast_scenario() -> Session {
    info!("=== Running Bus Broadcast Scenario ===");

    let mut session = Session::new(TopologyKind::Bus, Layout::default());
    println!("{}", session.topology().visualize());

    println!("\n--- Step 1: n0 broadcasts, addressed to n3 ---");
    select(&mut session, "n0", "n3");
    send_and_report(&mut session);

    println!("\n--- Step 2: backbone cut between b2 and b3 ---");
    cut_link(&mut session, "b2-b3");
    send_and_report(&mut session);

    session
}

/// Scenario: the star's switch fails
///
/// ```text
/// n1 reaches n4 through the switch.
/// With the switch down every device is isolated.
/// Repairing it restores delivery.
/// ```
pub fn run_star_switch_down_scenario() -> Session {
    info!("=== Running Star Switch Down Scenario ===");

    let mut session = Session::new(TopologyKind::Star, Layout::default());
    println!("{}", session.topology().visualize());
    select(&mut session, "n1", "n4");

    println!("\n--- Step 1: switch healthy ---");
    send_and_report(&mut session);

    println!("\n--- Step 2: switch goes down ---");
    break_node(&mut session, "switch");
    send_and_report(&mut session);

    println!("\n--- Step 3: single spoke cut, switch repaired ---");
    break_node(&mut session, "switch");
    cut_link(&mut session, "switch-n2");
    send_and_report(&mut session);
    select(&mut session, "n1", "n2");
    send_and_report(&mut session);

    session
}

/// Scenario: one cable cut on the ring; traffic goes the other way round
pub fn run_ring_single_cut_scenario() -> Session {
    info!("=== Running Ring Single Cut Scenario ===");

    let mut session = Session::new(TopologyKind::Ring, Layout::default());
    select(&mut session, "n0", "n2");

    println!("\n--- Step 1: intact ring, short way round ---");
    send_and_report(&mut session);

    println!("\n--- Step 2: n0-n1 cut, long way round ---");
    cut_link(&mut session, "n0-n1");
    println!("{}", session.topology().visualize());
    send_and_report(&mut session);

    session
}

/// Scenario: two cables cut on the ring split it in two
pub fn run_ring_double_cut_scenario() -> Session {
    info!("=== Running Ring Double Cut Scenario ===");

    let mut session = Session::new(TopologyKind::Ring, Layout::default());
    cut_link(&mut session, "n0-n1");
    cut_link(&mut session, "n3-n4");
    println!("{}", session.topology().visualize());

    println!("\n--- Across the split: n0 to n2 ---");
    select(&mut session, "n0", "n2");
    send_and_report(&mut session);

    println!("\n--- Same side: n1 to n3 ---");
    select(&mut session, "n1", "n3");
    send_and_report(&mut session);

    session
}

/// Scenario: the full mesh keeps delivering through single failures
pub fn run_mesh_redundancy_scenario() -> Session {
    info!("=== Running Mesh Redundancy Scenario ===");

    let mut session = Session::new(TopologyKind::Mesh, Layout::default());
    println!("{}", session.topology().visualize());
    select(&mut session, "n0", "n2");

    println!("\n--- Step 1: direct cable ---");
    send_and_report(&mut session);

    println!("\n--- Step 2: n0-n2 cut, detour via a neighbour ---");
    cut_link(&mut session, "n0-n2");
    send_and_report(&mut session);

    println!("\n--- Step 3: n1 also down ---");
    break_node(&mut session, "n1");
    send_and_report(&mut session);

    println!("\n=== Failures ===");
    let broken: Vec<String> = session.topology().inactive_nodes().map(|n| n.id.to_string()).collect();
    let cut: Vec<String> = session.topology().inactive_links().map(|l| l.id.to_string()).collect();
    println!("  Broken nodes: [{}]", broken.join(", "));
    println!("  Cut cables: [{}]", cut.join(", "));

    session
}

//! Interactive simulation session
//!
//! Holds what a front-end would otherwise keep as UI state: the current
//! topology, the chosen sender and receiver, at most one in-flight
//! transmission and the results of the last one.
//!
//! While a run is in flight, endpoint changes, failure toggles and reset are
//! refused. Switching topology or resizing the layout regenerates the graph
//! and cancels the run instead.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::error::{NetSimResult, SessionError, TopologyError};
use crate::explain::ExplanationRequest;
use crate::sequencer::{Frame, Outcome, TickOutcome, Transmission};
use crate::topology::{Topology, generate};
use crate::types::{DeliveryStatus, Language, Layout, LinkId, NodeId, PacketState, SimulationResult, TopologyKind};

/// Stateful owner of one topology and its transmissions
#[derive(Debug)]
pub struct Session {
    topology: Topology,
    language: Language,
    sender: Option<NodeId>,
    receiver: Option<NodeId>,
    in_flight: Option<Transmission>,
    packets: Vec<PacketState>,
    statuses: BTreeMap<NodeId, DeliveryStatus>,
    last_result: Option<SimulationResult>,
    /// Sender and receiver of the run behind `last_result`
    last_endpoints: Option<(NodeId, NodeId)>,
}

impl Session {
    /// Start on a freshly generated topology with the first two devices selected
    pub fn new(kind: TopologyKind, layout: Layout) -> Self {
        let topology = generate(kind, layout);
        let (sender, receiver) = endpoints_of(&topology);
        Self {
            topology,
            language: Language::default(),
            sender,
            receiver,
            in_flight: None,
            packets: Vec::new(),
            statuses: BTreeMap::new(),
            last_result: None,
            last_endpoints: None,
        }
    }

    /// Start with the layout and language from `config`
    pub fn with_config(kind: TopologyKind, config: &SimConfig) -> Self {
        let mut session = Self::new(kind, config.layout);
        session.language = config.language;
        session
    }

    /// A session with endpoints chosen and failures already applied
    pub fn prepare(
        kind: TopologyKind,
        config: &SimConfig,
        sender: &NodeId,
        receiver: &NodeId,
        broken_nodes: &[NodeId],
        cut_links: &[LinkId],
    ) -> NetSimResult<Self> {
        let mut session = Self::with_config(kind, config);
        session.set_sender(sender)?;
        session.set_receiver(receiver)?;
        for node in broken_nodes {
            session.topology.set_node_active(node, false)?;
        }
        for link in cut_links {
            session.topology.set_link_active(link, false)?;
        }
        Ok(session)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn kind(&self) -> TopologyKind {
        self.topology.kind()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn sender(&self) -> Option<&NodeId> {
        self.sender.as_ref()
    }

    pub fn receiver(&self) -> Option<&NodeId> {
        self.receiver.as_ref()
    }

    /// Packets to draw right now; empty when nothing is in flight
    pub fn packets(&self) -> &[PacketState] {
        &self.packets
    }

    /// Terminal statuses from the last completed run
    pub fn statuses(&self) -> &BTreeMap<NodeId, DeliveryStatus> {
        &self.statuses
    }

    pub fn status_of(&self, node: &NodeId) -> Option<DeliveryStatus> {
        self.statuses.get(node).copied()
    }

    pub fn last_result(&self) -> Option<&SimulationResult> {
        self.last_result.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The run being played, if any
    pub fn in_flight(&self) -> Option<&Transmission> {
        self.in_flight.as_ref()
    }

    /// Switch to another shape; failures and results are discarded
    pub fn select_topology(&mut self, kind: TopologyKind) {
        info!(from = %self.kind(), to = %kind, "Switching topology");
        self.regenerate(kind, self.topology.layout());
    }

    /// Lay the current shape out in a new area
    ///
    /// Same as switching topology: failures are discarded and the first two
    /// devices become the endpoints again.
    pub fn resize(&mut self, layout: Layout) {
        debug!(width = layout.width, height = layout.height, "Resizing layout");
        self.regenerate(self.kind(), layout);
    }

    pub fn set_sender(&mut self, id: &NodeId) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.ensure_device(id)?;
        self.sender = Some(id.clone());
        Ok(())
    }

    pub fn set_receiver(&mut self, id: &NodeId) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.ensure_device(id)?;
        self.receiver = Some(id.clone());
        Ok(())
    }

    /// Break or repair a node; returns its new state
    pub fn toggle_node(&mut self, id: &NodeId) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let active = self.topology.toggle_node(id)?;
        debug!(node = %id, active, "Toggled node");
        Ok(active)
    }

    /// Cut or repair a cable; returns its new state
    pub fn toggle_link(&mut self, id: &LinkId) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let active = self.topology.toggle_link(id)?;
        debug!(link = %id, active, "Toggled link");
        Ok(active)
    }

    /// Repair everything and forget the last run
    pub fn reset_failures(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.topology.reset();
        self.statuses.clear();
        self.last_result = None;
        self.last_endpoints = None;
        Ok(())
    }

    /// Plan a transmission between the selected endpoints
    ///
    /// Statuses and the previous result are cleared; the run then plays one
    /// tick per [`Session::advance`].
    pub fn start_run(&mut self) -> Result<Uuid, SessionError> {
        let transmission = self.plan_run()?;
        let run_id = transmission.run_id();
        self.in_flight = Some(transmission);
        Ok(run_id)
    }

    /// Play the next tick of the in-flight run
    ///
    /// Returns `None` when nothing is in flight. On completion the run is
    /// retired and its statuses and result become visible.
    pub fn advance(&mut self) -> Option<TickOutcome> {
        let transmission = self.in_flight.as_mut()?;
        let outcome = transmission.step();

        match &outcome {
            TickOutcome::Frame(frame) => {
                self.packets = frame.packets.clone();
            }
            TickOutcome::Complete(done) => {
                if let Some(finished) = self.in_flight.take() {
                    self.publish(finished.sender(), finished.receiver(), done);
                }
            }
            TickOutcome::Finished => {
                self.in_flight = None;
            }
        }
        Some(outcome)
    }

    /// Drop the in-flight run, if any; returns whether one was dropped
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(transmission) => {
                info!(
                    run_id = %transmission.run_id(),
                    tick = transmission.current_tick(),
                    "Transmission cancelled"
                );
                self.packets.clear();
                true
            }
            None => false,
        }
    }

    /// Start a run and play it out without a clock
    pub fn run_to_completion(&mut self) -> Result<(Vec<Frame>, SimulationResult), SessionError> {
        let transmission = self.plan_run()?;
        let (sender, receiver) = (transmission.sender().clone(), transmission.receiver().clone());
        let (frames, outcome) = transmission.run_to_completion();
        self.publish(&sender, &receiver, &outcome);
        Ok((frames, outcome.result))
    }

    /// Describe the last completed run for the explanation service
    pub fn explanation_request(&self) -> Option<ExplanationRequest> {
        let result = self.last_result.as_ref()?;
        let (sender, receiver) = self.last_endpoints.clone()?;
        Some(ExplanationRequest {
            kind: self.kind(),
            sender,
            receiver,
            success: result.success,
            path: result.path.clone(),
            inactive_nodes: self.topology.inactive_nodes().map(|n| node_name(&n.label, &n.id)).collect(),
            inactive_links: self.topology.inactive_links().map(|l| l.id.clone()).collect(),
            language: self.language,
        })
    }

    fn plan_run(&mut self) -> Result<Transmission, SessionError> {
        self.ensure_idle()?;
        let (Some(sender), Some(receiver)) = (&self.sender, &self.receiver) else {
            warn!("Send requested without both endpoints selected");
            return Err(SessionError::MissingEndpoint);
        };

        let transmission = Transmission::plan(&self.topology, sender, receiver, self.language)
            .inspect_err(|e| warn!(error = %e, "Send request refused"))?;

        self.statuses.clear();
        self.last_result = None;
        self.last_endpoints = None;
        self.packets.clear();
        Ok(transmission)
    }

    fn publish(&mut self, sender: &NodeId, receiver: &NodeId, outcome: &Outcome) {
        self.packets.clear();
        self.statuses = outcome.statuses.clone();
        self.last_result = Some(outcome.result.clone());
        self.last_endpoints = Some((sender.clone(), receiver.clone()));
    }

    fn regenerate(&mut self, kind: TopologyKind, layout: Layout) {
        self.cancel();
        self.topology = generate(kind, layout);
        let (sender, receiver) = endpoints_of(&self.topology);
        self.sender = sender;
        self.receiver = receiver;
        self.statuses.clear();
        self.last_result = None;
        self.last_endpoints = None;
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            warn!("Request refused while a transmission is in flight");
            return Err(SessionError::SimulationInFlight);
        }
        Ok(())
    }

    fn ensure_device(&self, id: &NodeId) -> Result<(), SessionError> {
        let node = self
            .topology
            .node(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()))?;
        if !node.is_device() {
            return Err(SessionError::NotADevice(id.clone()));
        }
        Ok(())
    }
}

fn endpoints_of(topology: &Topology) -> (Option<NodeId>, Option<NodeId>) {
    match topology.default_endpoints() {
        Some((sender, receiver)) => (Some(sender), Some(receiver)),
        None => (None, None),
    }
}

/// Backbone joints have no label; fall back to the id
fn node_name(label: &str, id: &NodeId) -> String {
    if label.is_empty() {
        id.to_string()
    } else {
        label.to_string()
    }
}

//! Error types for NetSim
//!
//! None of these are fatal: every variant describes a request the engine
//! refused while leaving its state untouched.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{LinkId, NodeId};

/// Top-level error type for NetSim
#[derive(Debug, Error)]
pub enum NetSimError {
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Explanation error: {0}")]
    Explain(#[from] ExplainError),
}

/// Lookups against a generated topology
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown link: {0}")]
    UnknownLink(LinkId),
}

/// Requests the session refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A simulation is already in flight")]
    SimulationInFlight,

    #[error("Sender or receiver not selected")]
    MissingEndpoint,

    #[error("Sender and receiver are the same node: {0}")]
    IdenticalEndpoints(NodeId),

    #[error("Node {0} is not a device and cannot send or receive")]
    NotADevice(NodeId),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Loading the simulator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures of the explanatory-text collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplainError {
    #[error("No credential configured for the explanation service")]
    MissingCredential,

    #[error("Explanation service transport error: {0}")]
    Transport(String),

    #[error("Explanation service timed out")]
    Timeout,

    #[error("Explanation service returned an empty answer")]
    EmptyResponse,
}

/// Unrecognised enum value on the command line or in a config file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {what}: {value}")]
pub struct ParseError {
    pub what: &'static str,
    pub value: String,
}

/// Convenience alias for results using [`NetSimError`]
pub type NetSimResult<T> = Result<T, NetSimError>;

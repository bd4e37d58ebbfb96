//! Compiled output types for the ACL compiler
//!
//! This module defines the object set the compiler hands to an external
//! provisioning collaborator: group declarations, endpoint resource
//! declarations, and access policy declarations, each named by its canonical
//! key. For emission, use [`PolicyEmitter`] or the
//! [`crate::compiler::AclCompiler`] facade.
//!
//! Everything here is keyed and iterated in canonical key order, so
//! serializing the same compiled output twice yields byte-identical bytes -
//! the property that keeps an infrastructure-as-code pipeline from replacing
//! objects that did not change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::acl::{Action, Protocol};
use crate::endpoint::EndpointKind;
use crate::error::{Error, Result};
use crate::graph::{NodeKind, RuleGraph, RuleNode};

// =============================================================================
// Output Object Types
// =============================================================================

/// A declared group and its members
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GroupDeclaration {
    /// Canonical key (external identifier)
    pub key: String,
    /// Group name
    pub name: String,
    /// Member names, sorted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// A declared endpoint resource (host or network)
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ResourceDeclaration {
    /// Canonical key (external identifier)
    pub key: String,
    /// Generated resource name
    pub name: String,
    /// Address in CIDR form
    pub address: String,
    /// Whether this is a single host or a network block
    pub kind: EndpointKind,
}

/// A single rule inside a policy declaration
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PolicyRule {
    /// Traffic action
    pub action: Action,
    /// Whether the rule applies in both directions (always one-directional)
    pub bidirectional: bool,
    /// Whether the rule is active
    pub enabled: bool,
    /// Network protocol
    pub protocol: Protocol,
    /// Port restriction; empty means all ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Canonical keys of source objects, sorted
    pub sources: Vec<String>,
    /// Canonical keys of destination objects, sorted
    pub destinations: Vec<String>,
}

/// A declared access policy
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PolicyDeclaration {
    /// Canonical key (external identifier)
    pub key: String,
    /// Policy name (reuses the key)
    pub name: String,
    /// Whether the policy is active
    pub enabled: bool,
    /// The policy's rules
    pub rules: Vec<PolicyRule>,
}

/// The compiler's final artifact
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CompiledOutput {
    /// Group declarations by canonical key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, GroupDeclaration>,

    /// Endpoint resource declarations by canonical key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceDeclaration>,

    /// Policy declarations by canonical key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, PolicyDeclaration>,
}

impl CompiledOutput {
    /// Create an empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if anything was compiled
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.resources.is_empty() && self.policies.is_empty()
    }

    /// Total count of all compiled objects
    pub fn total_count(&self) -> usize {
        self.groups.len() + self.resources.len() + self.policies.len()
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::serialization(e.to_string()))
    }
}

// =============================================================================
// Policy Emitter
// =============================================================================

/// Emitter producing the final object set from an assembled rule graph
///
/// Walks the graph's arena in key order and declares every group, endpoint
/// resource, and policy edge. The protocol default is applied here, at the
/// emission boundary, never earlier - the graph keeps "unspecified" distinct
/// from "tcp" so a future default change cannot silently rewrite history.
pub struct PolicyEmitter<'a> {
    graph: &'a RuleGraph,
}

impl<'a> PolicyEmitter<'a> {
    /// Create a new emitter over an assembled graph
    pub fn new(graph: &'a RuleGraph) -> Self {
        Self { graph }
    }

    /// Emit the compiled object set
    pub fn emit(&self, default_protocol: Protocol) -> CompiledOutput {
        let mut output = CompiledOutput::new();

        for (key, node) in self.graph.nodes() {
            match node.kind {
                NodeKind::Group | NodeKind::NetResToGroup => {
                    output.groups.insert(
                        key.clone(),
                        GroupDeclaration {
                            key: key.clone(),
                            name: node.name.clone(),
                            members: self.members_of(key),
                        },
                    );
                }
                NodeKind::Host | NodeKind::Network => {
                    output.resources.insert(
                        key.clone(),
                        ResourceDeclaration {
                            key: key.clone(),
                            name: node.name.clone(),
                            address: node
                                .endpoint
                                .as_ref()
                                .and_then(|e| e.address())
                                .unwrap_or_default()
                                .to_string(),
                            kind: if node.kind == NodeKind::Host {
                                EndpointKind::Host
                            } else {
                                EndpointKind::Network
                            },
                        },
                    );
                }
                NodeKind::PolicyGroupToGroup | NodeKind::PolicyGroupToNetRes => {
                    output
                        .policies
                        .insert(key.clone(), emit_policy(node, default_protocol));
                }
            }
        }

        output
    }

    /// Names of all nodes holding a membership edge to the given group
    fn members_of(&self, group_key: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .graph
            .nodes()
            .values()
            .filter(|node| !node.kind.is_policy() && node.destinations.contains_key(group_key))
            .map(|node| node.name.clone())
            .collect();
        members.sort_unstable();
        members
    }
}

/// Declare a single policy node
fn emit_policy(node: &RuleNode, default_protocol: Protocol) -> PolicyDeclaration {
    let rule = PolicyRule {
        // Policy nodes always carry an action; fail closed if one ever
        // does not
        action: node.action.unwrap_or(Action::Drop),
        bidirectional: false,
        enabled: true,
        protocol: node.protocol.unwrap_or(default_protocol),
        ports: node.ports.clone().unwrap_or_default(),
        sources: node.sources.keys().cloned().collect(),
        destinations: node.destinations.keys().cloned().collect(),
    };

    PolicyDeclaration {
        key: node.key.clone(),
        name: node.name.clone(),
        enabled: true,
        rules: vec![rule],
    }
}

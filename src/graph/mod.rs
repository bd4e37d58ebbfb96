//! Rule graph assembly for the ACL compiler
//!
//! This module turns a validated [`AclDocument`] into a canonical
//! [`RuleGraph`]: a flat, key-indexed arena of deduplicated nodes. Groups,
//! hosts and networks referenced by many rules collapse into a single node
//! each; every rule contributes policy nodes keyed by content digest over
//! their member keys.
//!
//! The arena is ordinary function state threaded through assembly, not a
//! global - the compiler stays reentrant and each compilation starts from an
//! empty map. A `BTreeMap` keyed by canonical key makes iteration order
//! deterministic, which the emitter relies on for byte-stable output.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::acl::{AccessRule, AclDocument, Action, Protocol};
use crate::endpoint::{ClassifyError, Endpoint, EndpointKind};
use crate::error::{Error, Result};
use crate::key;

/// Kind of a node in the rule graph
///
/// The string forms are part of the canonical-key contract: they prefix
/// every emitted identifier and must not change across versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    /// A named group
    Group,
    /// A single host resource
    Host,
    /// A CIDR network resource
    Network,
    /// A host/network acting as a traffic source, converted to a group
    NetResToGroup,
    /// A many-to-many policy between groups
    PolicyGroupToGroup,
    /// A many-to-one policy from groups to a single resource
    PolicyGroupToNetRes,
}

impl NodeKind {
    /// The kind's canonical name segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Host => "host",
            Self::Network => "network",
            Self::NetResToGroup => "net-res-to-group",
            Self::PolicyGroupToGroup => "policy-gtg",
            Self::PolicyGroupToNetRes => "policy-gtn",
        }
    }

    /// Whether this kind is a policy edge rather than an endpoint object
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::PolicyGroupToGroup | Self::PolicyGroupToNetRes)
    }
}

impl From<EndpointKind> for NodeKind {
    fn from(kind: EndpointKind) -> Self {
        match kind {
            EndpointKind::Group => Self::Group,
            EndpointKind::Host => Self::Host,
            EndpointKind::Network => Self::Network,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the rule graph
///
/// One struct covers both endpoint objects and policy edges, discriminated
/// by [`NodeKind`]. Only policy nodes populate `sources`; policy nodes and
/// membership edges populate `destinations`. Nodes stored inside those maps
/// carry empty maps themselves - the graph is a depth-1 bipartite map, not a
/// general graph, so cycles cannot form.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleNode {
    /// Canonical key, unique within the graph
    pub key: String,
    /// Node kind
    pub kind: NodeKind,
    /// Generated name (policy nodes reuse their key)
    pub name: String,
    /// The classified endpoint, for endpoint-kind nodes
    pub endpoint: Option<Endpoint>,
    /// Port restriction (policy nodes inherit their destination's ports)
    pub ports: Option<Vec<String>>,
    /// Protocol restriction, for policy nodes
    pub protocol: Option<Protocol>,
    /// Traffic action, for policy nodes
    pub action: Option<Action>,
    /// Source nodes by canonical key, for policy nodes
    pub sources: BTreeMap<String, RuleNode>,
    /// Destination nodes by canonical key
    pub destinations: BTreeMap<String, RuleNode>,
}

impl RuleNode {
    /// Create an endpoint node from a classified endpoint
    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        let kind = NodeKind::from(endpoint.kind());
        let name = endpoint.name().to_string();
        Self {
            key: key::simple_key(kind.as_str(), &name),
            kind,
            name,
            ports: endpoint.ports().map(<[String]>::to_vec),
            endpoint: Some(endpoint.clone()),
            protocol: None,
            action: None,
            sources: BTreeMap::new(),
            destinations: BTreeMap::new(),
        }
    }

    /// Create a group node from a normalized group name
    pub fn group(name: &str) -> Self {
        Self::from_endpoint(&Endpoint::Group {
            name: name.to_string(),
            ports: None,
        })
    }

    /// Retag a host/network node as a group-acting source
    fn into_net_res_to_group(mut self) -> Self {
        self.kind = NodeKind::NetResToGroup;
        self.key = key::simple_key(self.kind.as_str(), &self.name);
        self
    }
}

/// Immediate-membership index over the document's groups table
///
/// Built once per compilation. Group names and member entries are both
/// normalized through the endpoint classifier (leading `group:`/`tag:`
/// stripped, `*` replaced), since the membership table's bare-name format is
/// the rule-endpoint format without the prefix.
#[derive(Clone, Debug, Default)]
pub struct GroupIndex {
    children: BTreeMap<String, Vec<String>>,
}

impl GroupIndex {
    /// Build the index from a document's groups table
    pub fn from_document(doc: &AclDocument) -> Result<Self> {
        let mut children = BTreeMap::new();
        for (raw_name, members) in &doc.groups {
            let name = classify_member(raw_name).map_err(|err| Error::InvalidMember {
                group: raw_name.clone(),
                token: raw_name.clone(),
                reason: err.to_string(),
            })?;

            let mut kids = Vec::with_capacity(members.len());
            for member in members {
                let kid = classify_member(member).map_err(|err| Error::InvalidMember {
                    group: raw_name.clone(),
                    token: member.clone(),
                    reason: err.to_string(),
                })?;
                kids.push(kid);
            }
            children.insert(name, kids);
        }
        Ok(Self { children })
    }

    /// Whether a normalized group name exists in the table
    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Normalized immediate members of a group, in document order
    pub fn members(&self, name: &str) -> Option<&[String]> {
        self.children.get(name).map(Vec::as_slice)
    }

    /// All groups and their normalized members
    pub fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.children
    }

    /// Expand a group to itself plus its child groups
    ///
    /// `depth` bounds how many membership levels are walked: 1 reaches the
    /// immediate children ("group of groups"), 2 their children, and so on.
    /// A visited set guards against cyclic membership, so any depth
    /// terminates. Expanding a group with no children returns exactly the
    /// group's own node.
    pub fn expand(&self, name: &str, depth: usize) -> BTreeMap<String, RuleNode> {
        let mut out = BTreeMap::new();
        let mut visited = BTreeSet::new();

        let root = RuleNode::group(name);
        visited.insert(name.to_string());
        out.insert(root.key.clone(), root);

        let mut frontier = vec![name.to_string()];
        for _ in 0..depth {
            let mut next = Vec::new();
            for group in &frontier {
                let Some(kids) = self.children.get(group) else {
                    continue;
                };
                for kid in kids {
                    if visited.insert(kid.clone()) {
                        let node = RuleNode::group(kid);
                        out.insert(node.key.clone(), node);
                        next.push(kid.clone());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out
    }
}

/// Normalize a membership-table entry through the endpoint classifier
fn classify_member(raw: &str) -> std::result::Result<String, ClassifyError> {
    let bare = raw
        .strip_prefix("group:")
        .or_else(|| raw.strip_prefix("tag:"))
        .unwrap_or(raw);
    let endpoint = Endpoint::classify(&format!("group:{}", bare))?;
    Ok(endpoint.name().to_string())
}

/// Canonical rule graph assembled from an ACL document
#[derive(Debug, Default)]
pub struct RuleGraph {
    nodes: BTreeMap<String, RuleNode>,
}

impl RuleGraph {
    /// Assemble the graph from a document
    ///
    /// Walks the groups table first (membership edges), then every rule in
    /// document order. Aborts on the first classification error or dangling
    /// `group:` reference - a partially assembled graph would compile to a
    /// policy set narrower than the author wrote.
    pub fn assemble(doc: &AclDocument, expansion_depth: usize) -> Result<Self> {
        let index = GroupIndex::from_document(doc)?;
        let mut graph = Self::default();

        graph.membership_pass(&index);
        for (rule_index, rule) in doc.acls.iter().enumerate() {
            graph.assemble_rule(rule_index, rule, &index, expansion_depth)?;
        }

        debug!(nodes = graph.nodes.len(), "rule graph assembled");
        Ok(graph)
    }

    /// All nodes, keyed and iterated in canonical key order
    pub fn nodes(&self) -> &BTreeMap<String, RuleNode> {
        &self.nodes
    }

    /// Look up a node by canonical key
    pub fn get(&self, key: &str) -> Option<&RuleNode> {
        self.nodes.get(key)
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fold the groups table into the arena: every group and member becomes
    /// a group node, and each member gets a destination edge to its parent -
    /// "who belongs to group X" expressed alongside the ACL-derived edges.
    fn membership_pass(&mut self, index: &GroupIndex) {
        for (parent, members) in index.entries() {
            let parent_node = RuleNode::group(parent);
            let parent_key = parent_node.key.clone();
            self.intern(&parent_node);

            for member in members {
                let member_node = RuleNode::group(member);
                let member_key = member_node.key.clone();
                if member_key == parent_key {
                    continue;
                }
                self.intern(&member_node);
                if let Some(node) = self.nodes.get_mut(&member_key) {
                    node.destinations
                        .insert(parent_key.clone(), RuleNode::group(parent));
                }
            }
        }
    }

    /// Assemble one rule into source/destination sets and policy nodes
    fn assemble_rule(
        &mut self,
        rule_index: usize,
        rule: &AccessRule,
        index: &GroupIndex,
        expansion_depth: usize,
    ) -> Result<()> {
        let mut sources = classify_side(rule_index, &rule.sources, index, expansion_depth)?;
        let destinations = classify_side(rule_index, &rule.destinations, index, expansion_depth)?;

        // A host/network listed as a source originates traffic: it acts as
        // a group endpoint in the emitted policy, not as a plain resource.
        // The conversion applies on the source side only.
        let resource_keys: Vec<String> = sources
            .iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Host | NodeKind::Network))
            .map(|(key, _)| key.clone())
            .collect();
        for old_key in resource_keys {
            if let Some(node) = sources.remove(&old_key) {
                let converted = node.into_net_res_to_group();
                sources.insert(converted.key.clone(), converted);
            }
        }

        for node in sources.values() {
            self.intern(node);
        }
        for node in destinations.values() {
            self.intern(node);
        }

        let group_destinations: BTreeMap<String, RuleNode> = destinations
            .iter()
            .filter(|(_, node)| node.kind == NodeKind::Group)
            .map(|(key, node)| (key.clone(), node.clone()))
            .collect();
        let resource_destinations: BTreeMap<String, RuleNode> = destinations
            .iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Host | NodeKind::Network))
            .map(|(key, node)| (key.clone(), node.clone()))
            .collect();

        // Group destinations collapse into one many-to-many policy edge
        if !group_destinations.is_empty() {
            let kind = NodeKind::PolicyGroupToGroup;
            let policy_key = key::composite_key(
                kind.as_str(),
                &key::side_digest(sources.keys()),
                &key::side_digest(group_destinations.keys()),
            );
            let node = RuleNode {
                key: policy_key.clone(),
                kind,
                name: policy_key,
                endpoint: None,
                ports: None,
                protocol: rule.protocol,
                action: Some(rule.action),
                sources: sources.clone(),
                destinations: group_destinations,
            };
            self.insert_policy(node, rule_index);
        }

        // Each resource destination gets its own many-to-one policy edge,
        // inheriting that destination's port restriction
        for (dst_key, dst) in &resource_destinations {
            let kind = NodeKind::PolicyGroupToNetRes;
            let policy_key = key::composite_key(
                kind.as_str(),
                &key::side_digest(sources.keys()),
                dst_key,
            );
            let mut single = BTreeMap::new();
            single.insert(dst_key.clone(), dst.clone());
            let node = RuleNode {
                key: policy_key.clone(),
                kind,
                name: policy_key,
                endpoint: None,
                ports: dst.ports.clone(),
                protocol: rule.protocol,
                action: Some(rule.action),
                sources: sources.clone(),
                destinations: single,
            };
            self.insert_policy(node, rule_index);
        }

        Ok(())
    }

    /// Insert an endpoint node, keeping any earlier node under the same key
    fn intern(&mut self, node: &RuleNode) {
        self.nodes
            .entry(node.key.clone())
            .or_insert_with(|| node.clone());
    }

    /// Insert a policy node; on key collision with an earlier rule, append
    /// the originating rule index instead of overwriting
    fn insert_policy(&mut self, mut node: RuleNode, rule_index: usize) {
        if self.nodes.contains_key(&node.key) {
            let disambiguated = format!("{}-{}", node.key, rule_index);
            warn!(
                key = %node.key,
                rule = rule_index,
                "canonical key collision, appending rule index"
            );
            node.key = disambiguated.clone();
            node.name = disambiguated;
        }
        self.nodes.insert(node.key.clone(), node);
    }
}

/// Classify one side of a rule into a deduplicated node set
///
/// Group references are merged together with their expansion, so a rule
/// naming a parent group implicitly also covers its listed child groups.
/// Explicit `group:` references must exist in the groups table; `tag:`
/// references are registered out of band and exempt from the check.
fn classify_side(
    rule_index: usize,
    tokens: &[String],
    index: &GroupIndex,
    expansion_depth: usize,
) -> Result<BTreeMap<String, RuleNode>> {
    let mut side = BTreeMap::new();
    for token in tokens {
        let endpoint = Endpoint::classify(token).map_err(|err| Error::InvalidEndpoint {
            rule: rule_index,
            token: token.clone(),
            reason: err.to_string(),
        })?;

        match &endpoint {
            Endpoint::Group { name, .. } => {
                if token.starts_with("group:") && !index.contains(name) {
                    return Err(Error::UnknownGroup {
                        rule: rule_index,
                        name: name.clone(),
                    });
                }
                let root = RuleNode::from_endpoint(&endpoint);
                for (key, node) in index.expand(name, expansion_depth) {
                    if key != root.key {
                        side.insert(key, node);
                    }
                }
                // The directly referenced node wins: it carries any ports
                // parsed from the token
                side.insert(root.key.clone(), root);
            }
            _ => {
                let node = RuleNode::from_endpoint(&endpoint);
                side.insert(node.key.clone(), node);
            }
        }
    }
    Ok(side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn doc_with(groups: &[(&str, &[&str])], acls: Vec<AccessRule>) -> AclDocument {
        AclDocument {
            groups: groups
                .iter()
                .map(|(name, members)| {
                    (
                        name.to_string(),
                        members.iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect(),
            acls,
            tag_owners: Map::new(),
        }
    }

    fn accept(src: &[&str], dst: &[&str]) -> AccessRule {
        AccessRule {
            action: Action::Accept,
            sources: src.iter().map(|s| s.to_string()).collect(),
            destinations: dst.iter().map(|d| d.to_string()).collect(),
            protocol: None,
        }
    }

    // =========================================================================
    // Node Kind Contract
    // =========================================================================

    #[test]
    fn test_kind_strings_are_the_identifier_contract() {
        assert_eq!(NodeKind::Group.as_str(), "group");
        assert_eq!(NodeKind::Host.as_str(), "host");
        assert_eq!(NodeKind::Network.as_str(), "network");
        assert_eq!(NodeKind::NetResToGroup.as_str(), "net-res-to-group");
        assert_eq!(NodeKind::PolicyGroupToGroup.as_str(), "policy-gtg");
        assert_eq!(NodeKind::PolicyGroupToNetRes.as_str(), "policy-gtn");
    }

    // =========================================================================
    // Group Index Tests
    // =========================================================================

    #[test]
    fn test_index_normalizes_prefixes_and_stars() {
        let doc = doc_with(&[("group:dev", &["alice", "group:eng", "tag:srv-*"])], vec![]);
        let index = GroupIndex::from_document(&doc).unwrap();

        assert!(index.contains("dev"));
        assert_eq!(
            index.members("dev").unwrap(),
            ["alice", "eng", "srv-star"]
        );
    }

    #[test]
    fn test_index_rejects_empty_member() {
        let doc = doc_with(&[("dev", &["alice", ""])], vec![]);
        let err = GroupIndex::from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("invalid member"));
        assert!(err.to_string().contains("dev"));
    }

    #[test]
    fn test_expand_group_with_no_children_returns_own_node() {
        let doc = doc_with(&[("dev", &[])], vec![]);
        let index = GroupIndex::from_document(&doc).unwrap();

        let expanded = index.expand("dev", 1);
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains_key("group-dev"));
    }

    #[test]
    fn test_expand_one_level_reaches_children_only() {
        let doc = doc_with(
            &[("prod", &["web", "db"]), ("web", &["frontend"])],
            vec![],
        );
        let index = GroupIndex::from_document(&doc).unwrap();

        let expanded = index.expand("prod", 1);
        assert_eq!(expanded.len(), 3);
        assert!(expanded.contains_key("group-prod"));
        assert!(expanded.contains_key("group-web"));
        assert!(expanded.contains_key("group-db"));
        assert!(!expanded.contains_key("group-frontend"));
    }

    #[test]
    fn test_expand_depth_two_reaches_grandchildren() {
        let doc = doc_with(
            &[("prod", &["web", "db"]), ("web", &["frontend"])],
            vec![],
        );
        let index = GroupIndex::from_document(&doc).unwrap();

        let expanded = index.expand("prod", 2);
        assert_eq!(expanded.len(), 4);
        assert!(expanded.contains_key("group-frontend"));
    }

    #[test]
    fn test_expand_terminates_on_cyclic_membership() {
        let doc = doc_with(&[("a", &["b"]), ("b", &["a"])], vec![]);
        let index = GroupIndex::from_document(&doc).unwrap();

        let expanded = index.expand("a", 10);
        assert_eq!(expanded.len(), 2);
        assert!(expanded.contains_key("group-a"));
        assert!(expanded.contains_key("group-b"));
    }

    #[test]
    fn test_expand_depth_zero_disables_child_expansion() {
        let doc = doc_with(&[("prod", &["web"])], vec![]);
        let index = GroupIndex::from_document(&doc).unwrap();

        let expanded = index.expand("prod", 0);
        assert_eq!(expanded.len(), 1);
    }

    // =========================================================================
    // Membership Pass Tests
    // =========================================================================

    #[test]
    fn test_members_get_destination_edges_to_their_group() {
        let doc = doc_with(&[("dev", &["alice", "bob"])], vec![]);
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let alice = graph.get("group-alice").unwrap();
        assert!(alice.destinations.contains_key("group-dev"));
        let bob = graph.get("group-bob").unwrap();
        assert!(bob.destinations.contains_key("group-dev"));
        assert!(graph.get("group-dev").unwrap().destinations.is_empty());
    }

    #[test]
    fn test_member_of_two_groups_keeps_both_edges() {
        let doc = doc_with(&[("dev", &["alice"]), ("ops", &["alice"])], vec![]);
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let alice = graph.get("group-alice").unwrap();
        assert!(alice.destinations.contains_key("group-dev"));
        assert!(alice.destinations.contains_key("group-ops"));
    }

    // =========================================================================
    // Rule Assembly Tests
    // =========================================================================

    #[test]
    fn test_rule_produces_group_to_resource_policy() {
        let doc = doc_with(
            &[("dev", &["alice"])],
            vec![accept(&["group:dev"], &["10.0.1.0/24:22"])],
        );
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let policy = graph
            .nodes()
            .values()
            .find(|n| n.kind == NodeKind::PolicyGroupToNetRes)
            .unwrap();

        assert!(policy.key.starts_with("policy-gtn-"));
        assert!(policy.key.ends_with("-network-10-0-1-0-24"));
        assert_eq!(policy.action, Some(Action::Accept));
        assert_eq!(policy.ports.as_deref(), Some(["22".to_string()].as_slice()));
        // Sources cover the group and its expanded member
        assert!(policy.sources.contains_key("group-dev"));
        assert!(policy.sources.contains_key("group-alice"));
        assert_eq!(policy.destinations.len(), 1);
    }

    #[test]
    fn test_rule_produces_group_to_group_policy() {
        let doc = doc_with(
            &[("dev", &[]), ("prod", &[])],
            vec![accept(&["group:dev"], &["group:prod"])],
        );
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let policy = graph
            .nodes()
            .values()
            .find(|n| n.kind == NodeKind::PolicyGroupToGroup)
            .unwrap();

        assert!(policy.key.starts_with("policy-gtg-"));
        assert!(policy.sources.contains_key("group-dev"));
        assert!(policy.destinations.contains_key("group-prod"));
    }

    #[test]
    fn test_mixed_destinations_produce_both_policy_kinds() {
        let doc = doc_with(
            &[("dev", &[]), ("prod", &[])],
            vec![accept(&["group:dev"], &["group:prod", "10.0.0.5"])],
        );
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let kinds: Vec<NodeKind> = graph
            .nodes()
            .values()
            .filter(|n| n.kind.is_policy())
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            [NodeKind::PolicyGroupToGroup, NodeKind::PolicyGroupToNetRes]
        );
    }

    #[test]
    fn test_source_resource_is_converted_to_group() {
        let doc = doc_with(
            &[("dev", &[])],
            vec![accept(&["10.0.2.0/24"], &["group:dev"])],
        );
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        // The CIDR source acts as a group, not a plain resource
        let converted = graph.get("net-res-to-group-10-0-2-0-24").unwrap();
        assert_eq!(converted.kind, NodeKind::NetResToGroup);
        assert!(graph.get("network-10-0-2-0-24").is_none());

        let policy = graph
            .nodes()
            .values()
            .find(|n| n.kind == NodeKind::PolicyGroupToGroup)
            .unwrap();
        assert!(policy.sources.contains_key("net-res-to-group-10-0-2-0-24"));
    }

    #[test]
    fn test_destination_resource_stays_a_resource() {
        let doc = doc_with(&[("dev", &[])], vec![accept(&["group:dev"], &["10.0.0.5"])]);
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        assert!(graph.get("host-10-0-0-5").is_some());
        assert!(graph.get("net-res-to-group-10-0-0-5").is_none());
    }

    #[test]
    fn test_repeated_endpoints_dedupe_across_rules() {
        let doc = doc_with(
            &[("dev", &[])],
            vec![
                accept(&["group:dev"], &["10.0.0.5"]),
                accept(&["group:dev"], &["10.0.0.5:22"]),
            ],
        );
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let hosts: Vec<&RuleNode> = graph
            .nodes()
            .values()
            .filter(|n| n.kind == NodeKind::Host)
            .collect();
        assert_eq!(hosts.len(), 1);
    }

    #[test]
    fn test_identical_rules_collide_and_disambiguate() {
        let doc = doc_with(
            &[("dev", &[])],
            vec![
                accept(&["group:dev"], &["10.0.0.5"]),
                accept(&["group:dev"], &["10.0.0.5"]),
            ],
        );
        let graph = RuleGraph::assemble(&doc, 1).unwrap();

        let policies: Vec<&String> = graph
            .nodes()
            .values()
            .filter(|n| n.kind.is_policy())
            .map(|n| &n.key)
            .collect();
        assert_eq!(policies.len(), 2);
        // The second rule's key carries its rule index
        assert!(policies[1].ends_with("-1"), "got {:?}", policies);
    }

    #[test]
    fn test_unknown_group_reference_aborts() {
        let doc = doc_with(&[], vec![accept(&["group:ops"], &["10.0.0.5"])]);
        let err = RuleGraph::assemble(&doc, 1).unwrap_err();
        assert!(matches!(err, Error::UnknownGroup { rule: 0, .. }));
    }

    #[test]
    fn test_tag_reference_is_exempt_from_group_check() {
        let doc = doc_with(&[], vec![accept(&["tag:web"], &["10.0.0.5"])]);
        let graph = RuleGraph::assemble(&doc, 1).unwrap();
        assert!(graph.get("group-web").is_some());
    }

    #[test]
    fn test_malformed_token_reports_rule_and_token() {
        let doc = doc_with(&[], vec![accept(&["10.0.0.5:22:extra"], &["10.0.0.6"])]);
        let err = RuleGraph::assemble(&doc, 1).unwrap_err();
        match err {
            Error::InvalidEndpoint { rule, token, .. } => {
                assert_eq!(rule, 0);
                assert_eq!(token, "10.0.0.5:22:extra");
            }
            other => panic!("expected InvalidEndpoint, got {other}"),
        }
    }

    #[test]
    fn test_reordered_sides_produce_identical_policy_keys() {
        let forward = doc_with(
            &[("dev", &[]), ("ops", &[])],
            vec![accept(&["group:dev", "group:ops"], &["10.0.0.5"])],
        );
        let reversed = doc_with(
            &[("dev", &[]), ("ops", &[])],
            vec![accept(&["group:ops", "group:dev"], &["10.0.0.5"])],
        );

        let keys_a: Vec<String> = RuleGraph::assemble(&forward, 1)
            .unwrap()
            .nodes()
            .keys()
            .cloned()
            .collect();
        let keys_b: Vec<String> = RuleGraph::assemble(&reversed, 1)
            .unwrap()
            .nodes()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys_a, keys_b);
    }
}

//! ACL document types
//!
//! This module defines the input side of the compiler: a declarative
//! access-control document with a groups table (named groups of members), an
//! ordered list of access rules, and a tag-ownership table. The document is
//! immutable once loaded; loading itself (files, flags, HTTP) belongs to the
//! surrounding collaborator, which hands the parsed document to
//! [`crate::compiler::AclCompiler`].
//!
//! Wire shape (JSON or YAML):
//!
//! ```text
//! {
//!   "groups": { "dev": ["alice", "bob"], ... },
//!   "acls":   [ { "action": "accept", "src": ["group:dev"],
//!                 "dst": ["10.0.1.0/24:22"], "proto": "tcp" }, ... ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Traffic action of an access rule
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Allow matching traffic
    Accept,
    /// Reject matching traffic
    Drop,
}

impl Action {
    /// The action's wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Drop => "drop",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network protocol of an access rule
///
/// The set is closed: an unknown protocol string fails deserialization
/// instead of being coerced to the default, since a typo'd protocol must not
/// silently widen or narrow a policy.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (the emission-boundary default when a rule names no protocol)
    #[default]
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
    /// All protocols
    All,
}

impl Protocol {
    /// The protocol's wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single access rule: allow/deny traffic from sources to destinations
///
/// One rule may expand into many canonical policy edges.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AccessRule {
    /// Traffic action
    pub action: Action,

    /// Raw source endpoint tokens
    #[serde(rename = "src")]
    pub sources: Vec<String>,

    /// Raw destination endpoint tokens
    #[serde(rename = "dst")]
    pub destinations: Vec<String>,

    /// Protocol restriction; unset defaults to TCP at emission
    #[serde(rename = "proto", default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

/// The input root: groups table plus ordered access rules
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AclDocument {
    /// Named groups of members; member names may carry a `group:` prefix
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, Vec<String>>,

    /// Access rules in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<AccessRule>,

    /// Tag ownership table; parsed and carried, not consumed by compilation
    #[serde(rename = "tagOwners", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tag_owners: BTreeMap<String, Vec<String>>,
}

impl AclDocument {
    /// Parse a document from JSON
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Parse a document from YAML
    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Validate the document's structure before compilation
    ///
    /// A rule with no sources or no destinations compiles to a policy over
    /// an empty set, which is never what the author meant.
    pub fn validate(&self) -> Result<()> {
        for (index, rule) in self.acls.iter().enumerate() {
            if rule.sources.is_empty() {
                return Err(Error::validation(format!("rule {} has no sources", index)));
            }
            if rule.destinations.is_empty() {
                return Err(Error::validation(format!(
                    "rule {} has no destinations",
                    index
                )));
            }
        }
        Ok(())
    }
}

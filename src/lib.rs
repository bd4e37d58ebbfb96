//! Palisade - ACL-to-policy compiler for zero-trust overlay networks
//!
//! Palisade ingests a declarative access-control document (named groups of
//! members plus allow-rules over source/destination endpoint lists) and emits
//! a canonical, deduplicated set of network objects - groups, endpoint
//! resources, and pairwise access policies - ready for idempotent application
//! to an overlay network's control plane.
//!
//! # Architecture
//!
//! Compilation is a pure, single-pass pipeline:
//!
//! 1. Each raw endpoint token is classified into a typed [`endpoint::Endpoint`]
//! 2. Group references are expanded against the document's membership table
//! 3. The rule list is assembled into a canonical [`graph::RuleGraph`]
//! 4. Every object gets a stable, content-derived key from [`key`]
//! 5. The graph is emitted as a [`policy::CompiledOutput`]
//!
//! Identical input always compiles to byte-identical output, including when
//! source/destination lists are reordered within a rule. That idempotence is
//! what lets the output drive an infrastructure-as-code pipeline without
//! spurious object replacement.
//!
//! # Modules
//!
//! - [`acl`] - Input document types (groups table, access rules)
//! - [`endpoint`] - Endpoint token classification
//! - [`graph`] - Group expansion and rule graph assembly
//! - [`key`] - Canonical key and content-hash generation
//! - [`policy`] - Compiled output types and the policy emitter
//! - [`compiler`] - Unified compiler facade
//! - [`error`] - Error types for the compiler

#![deny(missing_docs)]

pub mod acl;
pub mod compiler;
pub mod endpoint;
pub mod error;
pub mod graph;
pub mod key;
pub mod policy;

pub use acl::{AccessRule, AclDocument, Action, Protocol};
pub use compiler::{AclCompiler, CompilerOptions};
pub use endpoint::{ClassifyError, Endpoint, EndpointKind};
pub use error::{Error, Result};
pub use graph::{GroupIndex, NodeKind, RuleGraph, RuleNode};
pub use policy::{
    CompiledOutput, GroupDeclaration, PolicyDeclaration, PolicyEmitter, PolicyRule,
    ResourceDeclaration,
};

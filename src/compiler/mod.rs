//! Unified ACL compiler facade
//!
//! This module provides the single entry point for compiling an
//! [`AclDocument`] into a [`CompiledOutput`]: validate the document,
//! assemble the rule graph, emit the object set.
//!
//! # Usage
//!
//! ```
//! use palisade::{AclCompiler, AclDocument};
//!
//! let doc = AclDocument::from_json(r#"{
//!     "groups": { "dev": ["alice", "bob"] },
//!     "acls": [
//!         { "action": "accept", "src": ["group:dev"],
//!           "dst": ["10.0.1.0/24"], "proto": "tcp" }
//!     ]
//! }"#).unwrap();
//!
//! let output = AclCompiler::new().compile(&doc).unwrap();
//! assert_eq!(output.groups["group-dev"].members, ["alice", "bob"]);
//! ```
//!
//! Compilation is a pure, single-threaded batch transform: one immutable
//! document in, one immutable output out, nothing shared across invocations.

use tracing::debug;

use crate::acl::{AclDocument, Protocol};
use crate::error::Result;
use crate::graph::RuleGraph;
use crate::policy::{CompiledOutput, PolicyEmitter};

/// Tunable compiler behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompilerOptions {
    /// How many membership levels a group reference expands through.
    /// The default of 1 reaches a group's immediate children ("group of
    /// groups"); deeper values walk transitively with cycle protection.
    pub group_expansion_depth: usize,

    /// Protocol applied at the emission boundary to rules that name none
    pub default_protocol: Protocol,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            group_expansion_depth: 1,
            default_protocol: Protocol::Tcp,
        }
    }
}

/// Compiler turning ACL documents into canonical policy object sets
#[derive(Clone, Debug, Default)]
pub struct AclCompiler {
    options: CompilerOptions,
}

impl AclCompiler {
    /// Create a compiler with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with explicit options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// The compiler's options
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile a document into its canonical object set
    ///
    /// Aborts on the first malformed endpoint token or dangling group
    /// reference; the output is only ever whole.
    pub fn compile(&self, doc: &AclDocument) -> Result<CompiledOutput> {
        doc.validate()?;
        debug!(
            groups = doc.groups.len(),
            rules = doc.acls.len(),
            "compiling ACL document"
        );

        let graph = RuleGraph::assemble(doc, self.options.group_expansion_depth)?;
        let output = PolicyEmitter::new(&graph).emit(self.options.default_protocol);

        debug!(objects = output.total_count(), "compilation complete");
        Ok(output)
    }
}

//! Canonical key generation for compiled objects
//!
//! Every object the compiler emits is named by a deterministic,
//! content-derived key. Simple objects (groups, hosts, networks) use
//! `{kind}-{name}`. Composite objects (policies spanning N sources and M
//! destinations) fold their member keys into a short content digest so that
//! logically identical policies - however their rules were written - always
//! land on the same identifier, and re-running the compiler never churns
//! names downstream.
//!
//! The digest layout is a durable cross-version contract, not an
//! implementation detail: SHA-256 over the lexicographically sorted,
//! concatenated member keys, lowercase hex, truncated to 10 characters.
//! Deployed infrastructure identifies objects by these strings, so changing
//! the algorithm, the sort, or the truncation silently orphans every object
//! already applied to a control plane.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from a content digest
pub const HASH_PREFIX_LEN: usize = 10;

/// Content digest of a string: SHA-256, lowercase hex, truncated
///
/// 40 bits of digest keeps generated names short while leaving collision
/// probability negligible for realistic input sizes; the assembler's
/// index-suffix disambiguation is the backstop if a collision ever lands.
pub fn hash10(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let full = hex::encode(digest);
    full[..HASH_PREFIX_LEN].to_string()
}

/// Digest over one side of a composite object
///
/// Member keys are sorted lexicographically before concatenation, so the
/// result is independent of the order endpoints were written in the rule.
pub fn side_digest<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
    sorted.sort_unstable();
    hash10(&sorted.concat())
}

/// Key for a simple object: `{kind}-{name}`
pub fn simple_key(kind: &str, name: &str) -> String {
    format!("{}-{}", kind, name)
}

/// Key for a composite object: `{kind}-{lhs}-{rhs}`
///
/// Group-to-group policies pass a [`side_digest`] for both sides.
/// Group-to-resource policies pass the source digest and the single
/// destination's key verbatim - the destination stays human-readable and the
/// layout matches identifiers already deployed by existing control planes.
pub fn composite_key(kind: &str, lhs: &str, rhs: &str) -> String {
    format!("{}-{}-{}", kind, lhs, rhs)
}

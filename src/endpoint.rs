//! Endpoint classification for ACL rule participants
//!
//! Every source or destination token in an access rule is one of three
//! things: a group reference (`group:dev`, `tag:web`), a single host
//! (`10.0.0.5`), or a CIDR network (`10.0.1.0/24`), each with an optional
//! port list (`:22,80`) where `*` means no restriction. This module parses a
//! raw token into the explicit [`Endpoint`] sum type so the rest of the
//! compiler never branches on string prefixes.
//!
//! Classification is a pure function of the token: the same token always
//! yields the same variant, the same generated name, and the same ports.
//! Malformed tokens are a hard [`ClassifyError`], never a silent coercion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of a classified endpoint, used for canonical naming
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// A named group of members
    Group,
    /// A single address (explicit or implicit /32)
    Host,
    /// A non-host CIDR block
    Network,
}

impl EndpointKind {
    /// The kind's canonical name segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Host => "host",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a token failed classification
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassifyError {
    /// The token is the empty string
    #[error("empty endpoint token")]
    EmptyToken,
    /// A `group:`/`tag:` token has no name after the prefix
    #[error("empty group name")]
    EmptyName,
    /// A bare token has no address before the port separator
    #[error("empty address")]
    EmptyAddress,
    /// The token has a `:` where the grammar allows none
    #[error("unexpected ':' in port list")]
    UnexpectedColon,
    /// The port list is present but empty, or contains an empty entry
    #[error("empty port in port list")]
    EmptyPort,
}

/// A classified rule participant
///
/// Generated names are usable as resource identifiers: `.` and `/` become
/// `-` in addresses, `*` becomes the literal `star` in group names, and
/// host names drop the redundant `-32` suffix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Reference to a named group (`group:` or `tag:` prefix)
    Group {
        /// Normalized group name
        name: String,
        /// Port restriction, if any
        ports: Option<Vec<String>>,
    },
    /// A single host address, canonicalized with an implicit /32
    Host {
        /// The address in CIDR form (always `/32`)
        address: String,
        /// Generated resource name
        name: String,
        /// Port restriction, if any
        ports: Option<Vec<String>>,
    },
    /// A non-host CIDR block
    Network {
        /// The CIDR block as written
        cidr: String,
        /// Generated resource name
        name: String,
        /// Port restriction, if any
        ports: Option<Vec<String>>,
    },
}

impl Endpoint {
    /// Classify a raw endpoint token
    ///
    /// Grammar: `prefix? address_or_name (":" ports)?` where `prefix` is
    /// `tag:` or `group:` and `ports` is `*` or a comma list.
    pub fn classify(token: &str) -> Result<Self, ClassifyError> {
        if token.is_empty() {
            return Err(ClassifyError::EmptyToken);
        }

        if let Some(rest) = token
            .strip_prefix("tag:")
            .or_else(|| token.strip_prefix("group:"))
        {
            return Self::classify_group(rest);
        }

        Self::classify_address(token)
    }

    /// Classify the remainder of a `group:`/`tag:` token
    fn classify_group(rest: &str) -> Result<Self, ClassifyError> {
        let (name_part, ports_part) = match rest.split_once(':') {
            Some((name, ports)) => (name, Some(ports)),
            None => (rest, None),
        };

        if name_part.is_empty() {
            return Err(ClassifyError::EmptyName);
        }
        if let Some(ports) = ports_part {
            if ports.contains(':') {
                return Err(ClassifyError::UnexpectedColon);
            }
        }

        Ok(Self::Group {
            // Identifiers must be usable as resource names
            name: name_part.replace('*', "star"),
            ports: parse_ports(ports_part)?,
        })
    }

    /// Classify a bare address token into Host or Network
    fn classify_address(token: &str) -> Result<Self, ClassifyError> {
        let (addr_part, ports_part) = match token.split_once(':') {
            Some((addr, ports)) => (addr, Some(ports)),
            None => (token, None),
        };

        if addr_part.is_empty() {
            return Err(ClassifyError::EmptyAddress);
        }
        if let Some(ports) = ports_part {
            if ports.contains(':') {
                return Err(ClassifyError::UnexpectedColon);
            }
        }
        let ports = parse_ports(ports_part)?;

        // Bare addresses are hosts: append the implicit /32
        let address = if addr_part.contains('/') {
            addr_part.to_string()
        } else {
            format!("{}/32", addr_part)
        };

        let base = address.replace(['.', '/'], "-");
        if address.ends_with("/32") {
            let name = base.strip_suffix("-32").unwrap_or(&base).to_string();
            Ok(Self::Host {
                address,
                name,
                ports,
            })
        } else {
            Ok(Self::Network {
                cidr: address,
                name: base,
                ports,
            })
        }
    }

    /// The endpoint's kind
    pub fn kind(&self) -> EndpointKind {
        match self {
            Self::Group { .. } => EndpointKind::Group,
            Self::Host { .. } => EndpointKind::Host,
            Self::Network { .. } => EndpointKind::Network,
        }
    }

    /// The endpoint's generated name
    pub fn name(&self) -> &str {
        match self {
            Self::Group { name, .. } | Self::Host { name, .. } | Self::Network { name, .. } => name,
        }
    }

    /// The endpoint's address in CIDR form, if it has one
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Group { .. } => None,
            Self::Host { address, .. } => Some(address),
            Self::Network { cidr, .. } => Some(cidr),
        }
    }

    /// The endpoint's port restriction, if any
    pub fn ports(&self) -> Option<&[String]> {
        match self {
            Self::Group { ports, .. }
            | Self::Host { ports, .. }
            | Self::Network { ports, .. } => ports.as_deref(),
        }
    }
}

/// Parse an optional ports segment
///
/// `None` and `*` both mean no restriction; a comma list is split verbatim.
fn parse_ports(segment: Option<&str>) -> Result<Option<Vec<String>>, ClassifyError> {
    let Some(segment) = segment else {
        return Ok(None);
    };
    if segment == "*" {
        return Ok(None);
    }
    if segment.is_empty() {
        return Err(ClassifyError::EmptyPort);
    }

    let ports: Vec<String> = segment.split(',').map(str::to_string).collect();
    if ports.iter().any(String::is_empty) {
        return Err(ClassifyError::EmptyPort);
    }
    Ok(Some(ports))
}

//! Graph-specific error types.

use fb_core::{BlockId, LinkId, SignalType};
use thiserror::Error;

use crate::graph::{PortDirection, PortRef};

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Block {0} does not exist")]
    UnknownBlock(BlockId),

    #[error("Port {0} does not exist")]
    UnknownPort(PortRef),

    #[error("Link {0} does not exist")]
    UnknownLink(LinkId),

    #[error("A block named '{0}' already exists")]
    DuplicateBlockName(String),

    /// Both ends of a link must carry the same signal type.
    #[error("Cannot link {src} ({src_type}) to {dst} ({dst_type}): signal types differ")]
    LinkTypeMismatch {
        src: PortRef,
        src_type: SignalType,
        dst: PortRef,
        dst_type: SignalType,
    },

    /// Links run from an `Out` port to an `In`/`InFeedback` port.
    #[error("Cannot link {src} ({src_dir:?}) to {dst} ({dst_dir:?}): wrong port direction")]
    LinkDirectionError {
        src: PortRef,
        src_dir: PortDirection,
        dst: PortRef,
        dst_dir: PortDirection,
    },

    #[error("Block {block} cannot be linked to itself")]
    SelfLinkError { block: BlockId },

    #[error("Port {port} already carries link {link}")]
    PortAlreadyLinked { port: PortRef, link: LinkId },

    #[error("Port {0} is disabled and cannot be linked")]
    DisabledPort(PortRef),

    /// Port and link bookkeeping disagree.
    #[error("Inconsistent link {link}: {what}")]
    Inconsistent { link: LinkId, what: &'static str },
}

//! Core block graph data structures.

use core::fmt;
use std::collections::{BTreeMap, HashMap};

use fb_core::{BlockId, Id, LinkId, ParameterTable, PortId, SignalType};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::validate;

/// Direction of a port relative to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Regular input; gates readiness of the owning block.
    In,
    /// Output produced by the block script.
    Out,
    /// Input fed from the previous feedback segment; never gates readiness.
    InFeedback,
}

impl PortDirection {
    pub fn is_input(self) -> bool {
        matches!(self, PortDirection::In | PortDirection::InFeedback)
    }
}

/// Fully qualified port address: owning block plus block-local port id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    pub block: BlockId,
    pub port: PortId,
}

impl PortRef {
    pub fn new(block: BlockId, port: PortId) -> Self {
        Self { block, port }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.port)
    }
}

/// A named, directed, typed attachment point on a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Unique within the owning block.
    pub id: PortId,
    pub name: String,
    pub direction: PortDirection,
    pub signal_type: SignalType,
    pub connected: bool,
    pub link: Option<LinkId>,
}

impl Port {
    /// True for `In` ports that must hold data before the block may run.
    pub fn gates_readiness(&self) -> bool {
        self.direction == PortDirection::In && !self.signal_type.is_disabled()
    }
}

/// A functional block: a computation node whose behaviour is supplied by the
/// script registered under `script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    /// Opaque key resolved against the script registry.
    pub script: String,
    pub ports: Vec<Port>,
    /// Design-time parameters; each iteration starts from these.
    pub parameters: ParameterTable,
}

impl Block {
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.index() as usize)
    }

    fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.get_mut(id.index() as usize)
    }

    pub fn port_by_name(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Ports that must be ready before this block can compute.
    pub fn gating_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.gates_readiness())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Out)
    }
}

/// Directed edge from an `Out` port to an `In` or `InFeedback` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: PortRef,
    pub dest: PortRef,
    pub signal_type: SignalType,
}

/// The block graph: blocks in insertion order plus the links between them.
///
/// Insertion order is the scheduling order. Ids are never reused, so removing
/// a block leaves gaps in the id space but not in `blocks()`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockGraph {
    blocks: Vec<Block>,
    links: BTreeMap<LinkId, Link>,
    #[serde(skip)]
    index: HashMap<BlockId, usize>,
    #[serde(skip)]
    next_block: u32,
    #[serde(skip)]
    next_link: u32,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block that runs the script registered under `script`.
    pub fn add_block(
        &mut self,
        name: impl Into<String>,
        script: impl Into<String>,
    ) -> GraphResult<BlockId> {
        let name = name.into();
        if self.block_by_name(&name).is_some() {
            return Err(GraphError::DuplicateBlockName(name));
        }
        let id = Id::from_index(self.next_block);
        self.next_block += 1;
        self.index.insert(id, self.blocks.len());
        self.blocks.push(Block {
            id,
            name,
            script: script.into(),
            ports: Vec::new(),
            parameters: ParameterTable::new(),
        });
        Ok(id)
    }

    /// Add a port to `block` and return its address.
    pub fn add_port(
        &mut self,
        block: BlockId,
        name: impl Into<String>,
        direction: PortDirection,
        signal_type: SignalType,
    ) -> GraphResult<PortRef> {
        let b = self.block_mut(block)?;
        let id = PortId::from_index(b.ports.len() as u32);
        b.ports.push(Port {
            id,
            name: name.into(),
            direction,
            signal_type,
            connected: false,
            link: None,
        });
        Ok(PortRef::new(block, id))
    }

    /// Link an `Out` port to an `In`/`InFeedback` port on another block.
    ///
    /// Marks both endpoints connected.
    pub fn add_link(&mut self, src: PortRef, dst: PortRef) -> GraphResult<LinkId> {
        let src_port = self.port(src).ok_or(GraphError::UnknownPort(src))?;
        let dst_port = self.port(dst).ok_or(GraphError::UnknownPort(dst))?;
        validate::check_link(src, src_port, dst, dst_port)?;
        let signal_type = src_port.signal_type;

        let id = Id::from_index(self.next_link);
        self.next_link += 1;
        for end in [src, dst] {
            let port = self.port_mut(end)?;
            port.connected = true;
            port.link = Some(id);
        }
        self.links.insert(
            id,
            Link {
                id,
                source: src,
                dest: dst,
                signal_type,
            },
        );
        Ok(id)
    }

    /// Remove a link and mark both endpoints disconnected.
    pub fn remove_link(&mut self, id: LinkId) -> GraphResult<Link> {
        let link = self.links.remove(&id).ok_or(GraphError::UnknownLink(id))?;
        for end in [link.source, link.dest] {
            // The peer may already be gone when called from remove_block.
            if let Ok(port) = self.port_mut(end) {
                port.connected = false;
                port.link = None;
            }
        }
        Ok(link)
    }

    /// Remove a block and every link touching it. Edit-time only.
    pub fn remove_block(&mut self, id: BlockId) -> GraphResult<Block> {
        let pos = self.block_index(id).ok_or(GraphError::UnknownBlock(id))?;
        let touching: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.source.block == id || l.dest.block == id)
            .map(|l| l.id)
            .collect();
        for link in touching {
            self.remove_link(link)?;
        }
        let block = self.blocks.remove(pos);
        self.reindex();
        Ok(block)
    }

    /// Change the signal type of an unlinked port.
    pub fn set_port_signal_type(
        &mut self,
        port: PortRef,
        signal_type: SignalType,
    ) -> GraphResult<()> {
        let p = self.port_mut(port)?;
        if let Some(link) = p.link {
            return Err(GraphError::PortAlreadyLinked { port, link });
        }
        p.signal_type = signal_type;
        Ok(())
    }

    pub fn set_parameters(&mut self, block: BlockId, parameters: ParameterTable) -> GraphResult<()> {
        self.block_mut(block)?.parameters = parameters;
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Position of a block in scheduling order.
    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<&Block> {
        self.block_index(id).map(|i| &self.blocks[i])
    }

    pub fn block_by_name(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    fn block_mut(&mut self, id: BlockId) -> GraphResult<&mut Block> {
        let i = self.block_index(id).ok_or(GraphError::UnknownBlock(id))?;
        Ok(&mut self.blocks[i])
    }

    pub fn ports_of(&self, block: BlockId) -> GraphResult<&[Port]> {
        self.block_by_id(block)
            .map(|b| b.ports.as_slice())
            .ok_or(GraphError::UnknownBlock(block))
    }

    pub fn port(&self, port: PortRef) -> Option<&Port> {
        self.block_by_id(port.block)?.port(port.port)
    }

    fn port_mut(&mut self, port: PortRef) -> GraphResult<&mut Port> {
        self.block_mut(port.block)?
            .port_mut(port.port)
            .ok_or(GraphError::UnknownPort(port))
    }

    /// Look up a port by `block name` and `port name`.
    pub fn port_by_name(&self, block: &str, port: &str) -> Option<PortRef> {
        let b = self.block_by_name(block)?;
        let p = b.port_by_name(port)?;
        Some(PortRef::new(b.id, p.id))
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// The link leaving an `Out` port, if any.
    pub fn link_from(&self, port: PortRef) -> Option<&Link> {
        let link = self.links.get(&self.port(port)?.link?)?;
        (link.source == port).then_some(link)
    }

    /// The link arriving at an input port, if any.
    pub fn link_to(&self, port: PortRef) -> Option<&Link> {
        let link = self.links.get(&self.port(port)?.link?)?;
        (link.dest == port).then_some(link)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Re-check every structural invariant.
    pub fn validate(&self) -> GraphResult<()> {
        validate::validate_graph(self)
    }

    fn reindex(&mut self) {
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();
    }
}

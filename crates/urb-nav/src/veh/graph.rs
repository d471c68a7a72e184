//! The directed vehicle graph and its binary format.
//!
//! # Topology
//!
//! Nodes have at most two predecessors and two successors, so a vehicle
//! enters a node from side 0 ("left") or side 1 ("right") — its *way*.  Each
//! incoming side carries its own sign and pre-baked routing policy in
//! `from[way]`, which is what lets one physical junction give way to one
//! street and priority to the other.
//!
//! Node 0 is the reserved invalid node: link fields use index 0 as "no link",
//! and the sentinel record at the start of the node array keeps every lookup
//! branch-free.  Spawn nodes occupy indices `1..=spawn_count`.
//!
//! # On-disk format
//!
//! Little-endian, 32-byte header then one 32-byte record per node (including
//! the sentinel):
//!
//! ```text
//! header:  magic[16] = "NAV_VEH_GRAPH\0\0\0", u32 num_nodes, u32 num_spawns, pad[8]
//! node:    u8 from0 (sign | route << 4)
//!          u8 from1
//!          u8 semaphore      signal type index, or km/h for Speed signs
//!          u8 margin
//!          u32 prev[2]
//!          u32 next[2]
//!          f32 x, y, z
//! ```

use std::io::{Read, Write};
use std::path::Path;

use urb_core::{NodeId, Point3};

use crate::{NavError, NavResult};

const MAGIC: [u8; 16] = *b"NAV_VEH_GRAPH\0\0\0";
const HEADER_SIZE: usize = 32;
const NODE_SIZE: usize = 32;

// ── Signs and routes ──────────────────────────────────────────────────────────

/// Traffic sign on one incoming side of a node.
///
/// The byte values are fixed by the on-disk format.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehSign {
    #[default]
    None = 0,
    /// Vehicles may be (re)spawned here.
    Spawn = 1,
    /// Give way: arrival time is penalized at crossings ahead.
    Yield = 2,
    /// Stop.  Currently treated exactly as `Yield`.
    Stop = 3,
    /// Signalled junction; the node's `semaphore` field holds the type index.
    Semaphore = 4,
    /// Speed limit; the node's `semaphore` field holds the limit in km/h.
    Speed = 5,
}

impl VehSign {
    fn from_nibble(n: u8) -> Option<VehSign> {
        Some(match n {
            0 => VehSign::None,
            1 => VehSign::Spawn,
            2 => VehSign::Yield,
            3 => VehSign::Stop,
            4 => VehSign::Semaphore,
            5 => VehSign::Speed,
            _ => return None,
        })
    }
}

/// Pre-baked branching policy at a node's egress, per incoming side.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehRoute {
    /// Terminal: no successor.
    #[default]
    None = 0,
    /// Always take `next[0]`.
    Left = 1,
    /// Always take `next[1]`.
    Right = 2,
    /// Fork: consume one turn bit.
    Any = 3,
}

impl VehRoute {
    fn from_nibble(n: u8) -> Option<VehRoute> {
        Some(match n {
            0 => VehRoute::None,
            1 => VehRoute::Left,
            2 => VehRoute::Right,
            3 => VehRoute::Any,
            _ => return None,
        })
    }
}

/// Sign + routing of one incoming side.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Approach {
    pub sign:  VehSign,
    pub route: VehRoute,
}

impl Approach {
    fn decode(byte: u8, node: u32, field: &'static str) -> NavResult<Approach> {
        let sign = VehSign::from_nibble(byte & 0x0F)
            .ok_or(NavError::BadField { node, field, value: (byte & 0x0F) as u32 })?;
        let route = VehRoute::from_nibble(byte >> 4)
            .ok_or(NavError::BadField { node, field, value: (byte >> 4) as u32 })?;
        Ok(Approach { sign, route })
    }

    fn encode(self) -> u8 {
        self.sign as u8 | (self.route as u8) << 4
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// One vehicle-graph node.  32 bytes, `Copy`, immutable after load.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehNode {
    /// Per incoming side: sign and routing.
    pub from: [Approach; 2],
    /// Signal type index (Semaphore signs) or km/h limit (Speed signs); 0 otherwise.
    pub semaphore: u8,
    /// Safety-margin percentage at merges.
    pub margin: u8,
    /// Predecessor nodes (left, right); `NodeId(0)` = no link.
    pub prev: [NodeId; 2],
    /// Successor nodes (left, right); `NodeId(0)` = no link.
    pub next: [NodeId; 2],
    pub pos: Point3,
}

impl VehNode {
    fn read_from(buf: &[u8; NODE_SIZE], index: u32) -> NavResult<VehNode> {
        let u32_at = |o: usize| u32::from_le_bytes(buf[o..o + 4].try_into().unwrap());
        let f32_at = |o: usize| f32::from_le_bytes(buf[o..o + 4].try_into().unwrap());
        Ok(VehNode {
            from: [
                Approach::decode(buf[0], index, "from0")?,
                Approach::decode(buf[1], index, "from1")?,
            ],
            semaphore: buf[2],
            margin: buf[3],
            prev: [NodeId(u32_at(4)), NodeId(u32_at(8))],
            next: [NodeId(u32_at(12)), NodeId(u32_at(16))],
            pos: Point3::new(f32_at(20), f32_at(24), f32_at(28)),
        })
    }

    fn write_to(&self, buf: &mut [u8; NODE_SIZE]) {
        buf[0] = self.from[0].encode();
        buf[1] = self.from[1].encode();
        buf[2] = self.semaphore;
        buf[3] = self.margin;
        buf[4..8].copy_from_slice(&self.prev[0].0.to_le_bytes());
        buf[8..12].copy_from_slice(&self.prev[1].0.to_le_bytes());
        buf[12..16].copy_from_slice(&self.next[0].0.to_le_bytes());
        buf[16..20].copy_from_slice(&self.next[1].0.to_le_bytes());
        buf[20..24].copy_from_slice(&self.pos.x.to_le_bytes());
        buf[24..28].copy_from_slice(&self.pos.y.to_le_bytes());
        buf[28..32].copy_from_slice(&self.pos.z.to_le_bytes());
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// The immutable directed vehicle graph.
///
/// Construct with [`VehGraphBuilder`] or [`VehGraph::load_path`]; planner
/// scratch state lives in a parallel reservation table owned by
/// [`VehNav`][crate::VehNav], never in the node array.
pub struct VehGraph {
    nodes:      Vec<VehNode>,
    num_spawns: u32,
}

impl VehGraph {
    /// Total node count, sentinel included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of spawn nodes (indices `1..=spawn_count`).
    #[inline]
    pub fn spawn_count(&self) -> u32 {
        self.num_spawns
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &VehNode {
        &self.nodes[id.index()]
    }

    /// The spawn node for an arbitrary index (wraps modulo the spawn count).
    #[inline]
    pub fn spawn_node(&self, index: u32) -> NodeId {
        debug_assert!(self.num_spawns > 0, "graph has no spawn nodes");
        NodeId(1 + index % self.num_spawns.max(1))
    }

    // ── Binary I/O ────────────────────────────────────────────────────────

    pub fn load_path(path: &Path) -> NavResult<VehGraph> {
        let file = std::fs::File::open(path)?;
        Self::load_reader(std::io::BufReader::new(file))
    }

    pub fn load_reader<R: Read>(mut reader: R) -> NavResult<VehGraph> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        if header[..16] != MAGIC {
            return Err(NavError::BadMagic { expected: "NAV_VEH_GRAPH" });
        }
        let num_nodes = u32::from_le_bytes(header[16..20].try_into().unwrap());
        let num_spawns = u32::from_le_bytes(header[20..24].try_into().unwrap());
        if num_nodes == 0 || num_spawns >= num_nodes {
            return Err(NavError::BadHeader(format!(
                "num_nodes={num_nodes} num_spawns={num_spawns}"
            )));
        }

        let mut nodes = Vec::with_capacity(num_nodes as usize);
        let mut buf = [0u8; NODE_SIZE];
        for i in 0..num_nodes {
            reader
                .read_exact(&mut buf)
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => {
                        NavError::ShortRead { expected: num_nodes, got: i }
                    }
                    _ => NavError::Io(e),
                })?;
            nodes.push(VehNode::read_from(&buf, i)?);
        }

        let graph = VehGraph { nodes, num_spawns };
        graph.validate()?;
        Ok(graph)
    }

    /// Write the graph in the exact on-disk layout (round-trips byte-for-byte).
    pub fn write_to<W: Write>(&self, mut writer: W) -> NavResult<()> {
        let mut header = [0u8; HEADER_SIZE];
        header[..16].copy_from_slice(&MAGIC);
        header[16..20].copy_from_slice(&(self.nodes.len() as u32).to_le_bytes());
        header[20..24].copy_from_slice(&self.num_spawns.to_le_bytes());
        writer.write_all(&header)?;

        let mut buf = [0u8; NODE_SIZE];
        for node in &self.nodes {
            node.write_to(&mut buf);
            writer.write_all(&buf)?;
        }
        Ok(())
    }

    pub fn save_path(&self, path: &Path) -> NavResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    /// A malformed graph is undefined behavior for the planner, so dangling
    /// links are rejected here rather than checked per step.
    fn validate(&self) -> NavResult<()> {
        let count = self.nodes.len() as u32;
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            for link in node.prev.iter().chain(node.next.iter()) {
                if link.0 >= count {
                    return Err(NavError::DanglingLink { node: i as u32, target: link.0 });
                }
            }
        }
        Ok(())
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Construct a [`VehGraph`] in memory, then call [`build`](Self::build).
///
/// The builder starts with the sentinel node already in place, so the first
/// [`add_node`](Self::add_node) returns `NodeId(1)`.
///
/// # Example
///
/// ```
/// use urb_core::Point3;
/// use urb_nav::{VehGraphBuilder, VehRoute};
///
/// let mut b = VehGraphBuilder::new();
/// let a = b.add_node(Point3::new(0.0, 0.0, 0.0));
/// let c = b.add_node(Point3::new(10.0, 0.0, 0.0));
/// b.connect(a, c).unwrap();
/// b.set_route(a, 0, VehRoute::Left);
/// b.set_spawn_count(1);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.node_count(), 3); // sentinel + 2
/// ```
pub struct VehGraphBuilder {
    nodes:      Vec<VehNode>,
    num_spawns: u32,
}

impl VehGraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      vec![VehNode::default()],
            num_spawns: 0,
        }
    }

    /// Add a node and return its `NodeId` (sequential from 1).
    pub fn add_node(&mut self, pos: Point3) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(VehNode { pos, ..VehNode::default() });
        id
    }

    /// Add a directed edge `from → to`, filling the first free `next` slot of
    /// `from` and the first free `prev` slot of `to`.
    ///
    /// Returns the incoming side (way) the edge occupies at `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> NavResult<usize> {
        let next = &mut self.nodes[from.index()].next;
        let out = next
            .iter()
            .position(|n| !n.is_valid())
            .ok_or_else(|| NavError::Build(format!("{from} already has two successors")))?;
        next[out] = to;

        let prev = &mut self.nodes[to.index()].prev;
        let way = prev
            .iter()
            .position(|n| !n.is_valid())
            .ok_or_else(|| NavError::Build(format!("{to} already has two predecessors")))?;
        prev[way] = from;
        Ok(way)
    }

    /// Set sign and routing of one incoming side.
    pub fn set_approach(&mut self, node: NodeId, way: usize, sign: VehSign, route: VehRoute) {
        self.nodes[node.index()].from[way] = Approach { sign, route };
    }

    /// Set the routing of one incoming side, leaving the sign untouched.
    pub fn set_route(&mut self, node: NodeId, way: usize, route: VehRoute) {
        self.nodes[node.index()].from[way].route = route;
    }

    /// Set the sign of one incoming side, leaving the routing untouched.
    pub fn set_sign(&mut self, node: NodeId, way: usize, sign: VehSign) {
        self.nodes[node.index()].from[way].sign = sign;
    }

    /// Set the signal-type index (Semaphore) or km/h limit (Speed) payload.
    pub fn set_semaphore(&mut self, node: NodeId, value: u8) {
        self.nodes[node.index()].semaphore = value;
    }

    pub fn set_margin(&mut self, node: NodeId, margin: u8) {
        self.nodes[node.index()].margin = margin;
    }

    /// Declare the first `n` nodes (IDs `1..=n`) as spawn nodes.
    pub fn set_spawn_count(&mut self, n: u32) {
        self.num_spawns = n;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn build(self) -> NavResult<VehGraph> {
        if self.num_spawns >= self.nodes.len() as u32 {
            return Err(NavError::Build(format!(
                "spawn count {} exceeds node count {}",
                self.num_spawns,
                self.nodes.len()
            )));
        }
        let graph = VehGraph {
            nodes:      self.nodes,
            num_spawns: self.num_spawns,
        };
        graph.validate()?;
        Ok(graph)
    }
}

impl Default for VehGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

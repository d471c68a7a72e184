//! The undirected pedestrian graph and its binary format.
//!
//! Sidewalk nodes carry 1–4 adjacencies, each with a quantized outgoing
//! angle (`0..=255` ≡ `0..2π`) used by the planner's angle-biased choice.
//! Node 0 is the reserved invalid node; spawn nodes occupy `1..=spawn_count`.
//!
//! # On-disk format
//!
//! Little-endian, 32-byte header then one 32-byte record per node:
//!
//! ```text
//! header:  magic[16] = "NAV_PED_GRAPH\0\0\0", u32 num_nodes, u32 num_spawns, pad[8]
//! node:    u8 sign, u8 semaphore, u8 pad, u8 count
//!          u32 na[4]         packed ang (low 8 bits) | next index << 8
//!          f32 x, y, z
//! ```

use std::io::{Read, Write};
use std::path::Path;

use urb_core::{NodeId, Point3};

use crate::{NavError, NavResult};

const MAGIC: [u8; 16] = *b"NAV_PED_GRAPH\0\0\0";
const HEADER_SIZE: usize = 32;
const NODE_SIZE: usize = 32;

/// Largest node index the 24-bit adjacency field can address.
const MAX_PED_NODES: u32 = 1 << 24;

// ── Sign ──────────────────────────────────────────────────────────────────────

/// Marker on a sidewalk node.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PedSign {
    #[default]
    None = 0,
    /// Pedestrians may be (re)spawned here.
    Spawn = 1,
    /// Signalled crossing; the node's `semaphore` field holds the type index.
    Semaphore = 2,
}

impl PedSign {
    fn from_byte(b: u8) -> Option<PedSign> {
        Some(match b {
            0 => PedSign::None,
            1 => PedSign::Spawn,
            2 => PedSign::Semaphore,
            _ => return None,
        })
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// One adjacency: the neighboring node plus the quantized direction toward it
/// (`0 = 256 = 2π`, `128 = π`, `64 = π/2`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PedAdjacency {
    pub ang:  u8,
    pub next: NodeId,
}

impl PedAdjacency {
    #[inline]
    fn decode(word: u32) -> PedAdjacency {
        PedAdjacency {
            ang:  (word & 0xFF) as u8,
            next: NodeId(word >> 8),
        }
    }

    #[inline]
    fn encode(self) -> u32 {
        self.ang as u32 | (self.next.0 << 8)
    }
}

/// One pedestrian-graph node.  32 bytes, `Copy`, immutable after load.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PedNode {
    pub sign: PedSign,
    /// Signal type index for `Semaphore` nodes; 0 otherwise.
    pub semaphore: u8,
    /// Number of valid adjacencies, 1..=4 (0 only on the sentinel).
    pub count: u8,
    pub na: [PedAdjacency; 4],
    pub pos: Point3,
}

impl PedNode {
    fn read_from(buf: &[u8; NODE_SIZE], index: u32) -> NavResult<PedNode> {
        let u32_at = |o: usize| u32::from_le_bytes(buf[o..o + 4].try_into().unwrap());
        let f32_at = |o: usize| f32::from_le_bytes(buf[o..o + 4].try_into().unwrap());
        let sign = PedSign::from_byte(buf[0])
            .ok_or(NavError::BadField { node: index, field: "sign", value: buf[0] as u32 })?;
        Ok(PedNode {
            sign,
            semaphore: buf[1],
            count: buf[3],
            na: [
                PedAdjacency::decode(u32_at(4)),
                PedAdjacency::decode(u32_at(8)),
                PedAdjacency::decode(u32_at(12)),
                PedAdjacency::decode(u32_at(16)),
            ],
            pos: Point3::new(f32_at(20), f32_at(24), f32_at(28)),
        })
    }

    fn write_to(&self, buf: &mut [u8; NODE_SIZE]) {
        buf[0] = self.sign as u8;
        buf[1] = self.semaphore;
        buf[2] = 0;
        buf[3] = self.count;
        for (i, na) in self.na.iter().enumerate() {
            let o = 4 + i * 4;
            buf[o..o + 4].copy_from_slice(&na.encode().to_le_bytes());
        }
        buf[20..24].copy_from_slice(&self.pos.x.to_le_bytes());
        buf[24..28].copy_from_slice(&self.pos.y.to_le_bytes());
        buf[28..32].copy_from_slice(&self.pos.z.to_le_bytes());
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// The immutable pedestrian graph.
pub struct PedGraph {
    nodes:      Vec<PedNode>,
    num_spawns: u32,
}

impl PedGraph {
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn spawn_count(&self) -> u32 {
        self.num_spawns
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &PedNode {
        &self.nodes[id.index()]
    }

    /// The spawn node for an arbitrary index (wraps modulo the spawn count).
    #[inline]
    pub fn spawn_node(&self, index: u32) -> NodeId {
        debug_assert!(self.num_spawns > 0, "graph has no spawn nodes");
        NodeId(1 + index % self.num_spawns.max(1))
    }

    // ── Binary I/O ────────────────────────────────────────────────────────

    pub fn load_path(path: &Path) -> NavResult<PedGraph> {
        let file = std::fs::File::open(path)?;
        Self::load_reader(std::io::BufReader::new(file))
    }

    pub fn load_reader<R: Read>(mut reader: R) -> NavResult<PedGraph> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        if header[..16] != MAGIC {
            return Err(NavError::BadMagic { expected: "NAV_PED_GRAPH" });
        }
        let num_nodes = u32::from_le_bytes(header[16..20].try_into().unwrap());
        let num_spawns = u32::from_le_bytes(header[20..24].try_into().unwrap());
        if num_nodes == 0 || num_nodes > MAX_PED_NODES || num_spawns >= num_nodes {
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
            nodes.push(PedNode::read_from(&buf, i)?);
        }

        let graph = PedGraph { nodes, num_spawns };
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

    fn validate(&self) -> NavResult<()> {
        let count = self.nodes.len() as u32;
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            if node.count < 1 || node.count > 4 {
                return Err(NavError::BadField {
                    node:  i as u32,
                    field: "count",
                    value: node.count as u32,
                });
            }
            for (k, na) in node.na.iter().enumerate() {
                let expect_link = k < node.count as usize;
                if expect_link != na.next.is_valid() || na.next.0 >= count {
                    return Err(NavError::DanglingLink { node: i as u32, target: na.next.0 });
                }
            }
        }
        Ok(())
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Construct a [`PedGraph`] in memory.
///
/// [`connect`](Self::connect) adds an undirected edge and bakes the quantized
/// angles from the node positions, the same way the graph export tooling does.
pub struct PedGraphBuilder {
    nodes:      Vec<PedNode>,
    num_spawns: u32,
}

impl PedGraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      vec![PedNode::default()],
            num_spawns: 0,
        }
    }

    /// Add a node and return its `NodeId` (sequential from 1).
    pub fn add_node(&mut self, pos: Point3) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(PedNode { pos, ..PedNode::default() });
        id
    }

    pub fn set_sign(&mut self, node: NodeId, sign: PedSign, semaphore: u8) {
        let n = &mut self.nodes[node.index()];
        n.sign = sign;
        n.semaphore = semaphore;
    }

    /// Add the undirected edge `a ↔ b`, computing both quantized angles.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> NavResult<()> {
        let pa = self.nodes[a.index()].pos.xy();
        let pb = self.nodes[b.index()].pos.xy();
        self.attach(a, b, quantize_angle(pb.sub(pa).angle()))?;
        self.attach(b, a, quantize_angle(pa.sub(pb).angle()))?;
        Ok(())
    }

    /// Add the directed half-edge `from → to` with an explicit baked angle.
    pub fn attach(&mut self, from: NodeId, to: NodeId, ang: u8) -> NavResult<()> {
        let node = &mut self.nodes[from.index()];
        if node.count as usize >= node.na.len() {
            return Err(NavError::Build(format!("{from} already has four neighbors")));
        }
        node.na[node.count as usize] = PedAdjacency { ang, next: to };
        node.count += 1;
        Ok(())
    }

    /// Declare the first `n` nodes (IDs `1..=n`) as spawn nodes.
    pub fn set_spawn_count(&mut self, n: u32) {
        self.num_spawns = n;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn build(self) -> NavResult<PedGraph> {
        if self.num_spawns >= self.nodes.len() as u32 {
            return Err(NavError::Build(format!(
                "spawn count {} exceeds node count {}",
                self.num_spawns,
                self.nodes.len()
            )));
        }
        let graph = PedGraph {
            nodes:      self.nodes,
            num_spawns: self.num_spawns,
        };
        graph.validate()?;
        Ok(graph)
    }
}

impl Default for PedGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantize a radian angle into the byte convention `0 = 2π, 128 = π`.
pub fn quantize_angle(ang: f32) -> u8 {
    ((256.0 * ang / std::f32::consts::TAU) as i32 & 0xFF) as u8
}

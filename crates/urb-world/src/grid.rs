//! The sparse cell grid and its neighbor iterator.
//!
//! # Data layout
//!
//! Entities live in a slab (`Vec<EntityRecord>`) indexed by `EntityId`; freed
//! slots are recycled through a free list.  Each record carries its cell
//! coordinates and a forward link, so a cell is nothing more than the
//! `EntityId` of its list head stored in `cells`:
//!
//! ```text
//! cells[(cy << 16) | cx] ──► e3 ──► e1 ──► INVALID
//! ```
//!
//! Insertion prepends (O(1)); within a cell, iteration therefore yields
//! entities in reverse insertion order.  Cell coordinates are biased around
//! `0x7FFF` so the world origin sits in the middle of the u16 range, and
//! `(0, 0)` doubles as the "not inserted" marker.
//!
//! A secondary FIFO queue holds entities temporarily detached from the grid
//! (boarding passengers, pooled spares).  Queued entities are threaded
//! through the same `next` links and are invisible to queries.

use rustc_hash::FxHashMap;

use urb_core::{EntityId, Point2};

use crate::EntityKind;

/// Edge length of a grid cell in world metres.
///
/// Must stay on the order of the agent footprint / interaction radius so a
/// typical neighbor query touches 4–9 cells.
pub const CELL_SIZE: f32 = 8.0;
const CELL_SIZE_INV: f32 = 1.0 / CELL_SIZE;

/// Bias added to cell indices so the origin maps to the middle of the range.
const CELL_BIAS: f32 = 0x7FFF as f32;

#[inline]
fn cell_from_world(v: f32) -> u16 {
    (CELL_BIAS + v * CELL_SIZE_INV).floor() as u16
}

#[inline]
fn cell_key(cx: u16, cy: u16) -> u32 {
    ((cy as u32) << 16) | cx as u32
}

// ── Entity slab ───────────────────────────────────────────────────────────────

struct EntityRecord {
    kind:   EntityKind,
    cell_x: u16,
    cell_y: u16,
    /// Next entity in the same cell list (or in the detached queue).
    next:   EntityId,
}

impl EntityRecord {
    #[inline]
    fn inserted(&self) -> bool {
        (self.cell_x | self.cell_y) != 0
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// The spatial-hash world: entity slab + sparse cell grid + detached queue.
///
/// Single-writer: all mutation happens from the orchestrator thread.  Queries
/// return a lazy [`Nearby`] iterator; callers must collect results before
/// mutating positions (mutating mid-iteration is a defined misuse).
#[derive(Default)]
pub struct World {
    entities: Vec<EntityRecord>,
    free:     Vec<EntityId>,
    cells:    FxHashMap<u32, EntityId>,
    /// Entities currently filed in the grid (debug bookkeeping).
    live:     usize,
    queue_head: EntityId,
    queue_tail: EntityId,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities:   Vec::new(),
            free:       Vec::new(),
            cells:      FxHashMap::default(),
            live:       0,
            queue_head: EntityId::INVALID,
            queue_tail: EntityId::INVALID,
        }
    }

    // ── Entity lifecycle ──────────────────────────────────────────────────

    /// Allocate an entity slot.  The entity is not in any cell until the
    /// first [`update`](Self::update).
    pub fn spawn(&mut self, kind: EntityKind) -> EntityId {
        let record = EntityRecord {
            kind,
            cell_x: 0,
            cell_y: 0,
            next: EntityId::INVALID,
        };
        match self.free.pop() {
            Some(id) => {
                self.entities[id.index()] = record;
                id
            }
            None => {
                let id = EntityId(self.entities.len() as u32);
                self.entities.push(record);
                id
            }
        }
    }

    /// Release an entity slot, unlinking it from its cell first.
    ///
    /// The entity must not be sitting in the detached queue (pop it first).
    pub fn despawn(&mut self, id: EntityId) {
        if self.entities[id.index()].inserted() {
            self.remove(id);
        }
        self.free.push(id);
    }

    #[inline]
    pub fn kind(&self, id: EntityId) -> EntityKind {
        self.entities[id.index()].kind
    }

    /// `true` while the entity is filed in a grid cell.
    #[inline]
    pub fn is_inserted(&self, id: EntityId) -> bool {
        self.entities[id.index()].inserted()
    }

    /// Number of entities currently filed in the grid.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ── Placement ─────────────────────────────────────────────────────────

    /// File the entity under its current position, migrating between cells
    /// as needed.  Re-filing under the same cell is a no-op, so calling this
    /// every frame is cheap.
    pub fn update(&mut self, id: EntityId, x: f32, y: f32) {
        let cell_x = cell_from_world(x);
        let cell_y = cell_from_world(y);

        let record = &self.entities[id.index()];
        if cell_x == record.cell_x && cell_y == record.cell_y {
            return;
        }

        if record.inserted() {
            self.remove(id);
        }

        let key = cell_key(cell_x, cell_y);
        let head = self.cells.get(&key).copied().unwrap_or(EntityId::INVALID);

        let record = &mut self.entities[id.index()];
        record.cell_x = cell_x;
        record.cell_y = cell_y;
        record.next = head;
        self.cells.insert(key, id);
        self.live += 1;
    }

    /// Unlink the entity from its cell, leaving it alive but not inserted.
    ///
    /// Removing an entity that is not inserted is a programmer error.
    pub fn remove(&mut self, id: EntityId) {
        let record = &self.entities[id.index()];
        debug_assert!(record.inserted(), "remove of uninserted entity {id}");
        let key = cell_key(record.cell_x, record.cell_y);
        let next = record.next;

        let head = *self.cells.get(&key).expect("entity cell has no list");
        if head == id {
            if next.is_valid() {
                self.cells.insert(key, next);
            } else {
                self.cells.remove(&key);
            }
        } else {
            // Walk the cell list to the predecessor and splice around `id`.
            let mut cursor = head;
            loop {
                let cursor_next = self.entities[cursor.index()].next;
                debug_assert!(cursor_next.is_valid(), "entity missing from its cell list");
                if cursor_next == id {
                    self.entities[cursor.index()].next = next;
                    break;
                }
                cursor = cursor_next;
            }
        }

        let record = &mut self.entities[id.index()];
        record.cell_x = 0;
        record.cell_y = 0;
        record.next = EntityId::INVALID;
        self.live -= 1;
    }

    /// Reset the grid and queue; every entity reverts to the not-inserted
    /// state but keeps its slot.
    pub fn clear(&mut self) {
        for record in &mut self.entities {
            record.cell_x = 0;
            record.cell_y = 0;
            record.next = EntityId::INVALID;
        }
        self.cells.clear();
        self.live = 0;
        self.queue_head = EntityId::INVALID;
        self.queue_tail = EntityId::INVALID;
    }

    // ── Detached FIFO queue ───────────────────────────────────────────────

    /// Move the entity out of the grid and onto the back of the detached
    /// queue.  Queued entities never appear in query results.
    pub fn queue_push_back(&mut self, id: EntityId) {
        debug_assert_eq!(self.queue_head.is_valid(), self.queue_tail.is_valid());

        if self.entities[id.index()].inserted() {
            self.remove(id);
        }
        self.entities[id.index()].next = EntityId::INVALID;

        if self.queue_tail.is_valid() {
            self.entities[self.queue_tail.index()].next = id;
        } else {
            self.queue_head = id;
        }
        self.queue_tail = id;
    }

    /// Pop the front of the detached queue, if any.
    pub fn queue_pop_front(&mut self) -> Option<EntityId> {
        debug_assert_eq!(self.queue_head.is_valid(), self.queue_tail.is_valid());

        if !self.queue_head.is_valid() {
            return None;
        }
        let id = self.queue_head;
        if self.queue_head == self.queue_tail {
            self.queue_head = EntityId::INVALID;
            self.queue_tail = EntityId::INVALID;
        } else {
            self.queue_head = self.entities[id.index()].next;
        }
        self.entities[id.index()].next = EntityId::INVALID;
        Some(id)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Iterate every entity whose cell intersects the AABB
    /// `[min_x, max_x] × [min_y, max_y]`.
    ///
    /// Coverage is cell-granular: the sweep may yield entities slightly
    /// outside the box but never misses one inside it.  Do not insert,
    /// remove, or move entities while iterating.
    pub fn query(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Nearby<'_> {
        let mut nearby = Nearby {
            world:      self,
            cell_min_x: cell_from_world(min_x),
            cell_min_y: cell_from_world(min_y),
            cell_max_x: cell_from_world(max_x),
            cell_max_y: cell_from_world(max_y),
            cell_cur_x: 0,
            cell_cur_y: 0,
            started:    false,
            ent:        EntityId::INVALID,
        };
        nearby.reset();
        nearby
    }

    /// Convenience: all entities within `radius` of `center` (cell-granular).
    pub fn query_around(&self, center: Point2, radius: f32) -> Nearby<'_> {
        self.query(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    #[inline]
    fn cell_head(&self, cx: u16, cy: u16) -> EntityId {
        self.cells
            .get(&cell_key(cx, cy))
            .copied()
            .unwrap_or(EntityId::INVALID)
    }
}

// ── Nearby ────────────────────────────────────────────────────────────────────

/// Lazy, restartable iteration over the entities in a cell range.
///
/// Scans cells row-major; within a cell, reverse insertion order.
pub struct Nearby<'w> {
    world:      &'w World,
    cell_min_x: u16,
    cell_min_y: u16,
    cell_max_x: u16,
    cell_max_y: u16,
    cell_cur_x: u16,
    cell_cur_y: u16,
    started:    bool,
    ent:        EntityId,
}

impl Nearby<'_> {
    /// Rewind to the start of the cell range.
    pub fn reset(&mut self) {
        self.cell_cur_x = self.cell_min_x;
        self.cell_cur_y = self.cell_min_y;
        self.started = false;
        self.ent = EntityId::INVALID;
    }

    /// Advance the cell cursor.  Returns `false` when the range is exhausted.
    fn advance_cell(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }
        if self.cell_cur_x < self.cell_max_x {
            self.cell_cur_x += 1;
        } else if self.cell_cur_y < self.cell_max_y {
            self.cell_cur_x = self.cell_min_x;
            self.cell_cur_y += 1;
        } else {
            return false;
        }
        true
    }
}

impl Iterator for Nearby<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        if self.ent.is_valid() {
            self.ent = self.world.entities[self.ent.index()].next;
        }
        while !self.ent.is_valid() {
            if !self.advance_cell() {
                return None;
            }
            self.ent = self.world.cell_head(self.cell_cur_x, self.cell_cur_y);
        }
        Some(self.ent)
    }
}

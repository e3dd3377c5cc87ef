//! TLB entry pool and per-set list allocator.
//!
//! Every TLB entry lives in a fixed arena and is wrapped by a [`ListNode`]
//! carrying `prev`/`next` indices into the same arena. Each set keeps two
//! doubly linked lists over its ways:
//! 1. **Free list:** Unallocated ways. Allocation pops the head.
//! 2. **Used list:** Allocated ways ordered MRU (head) to LRU (tail).
//!
//! All list traffic goes through [`EntryPool::move_node`], which unlinks a node
//! and pushes it at the head of a list. Allocation, touching, aging, and
//! freeing are all single moves, so every operation is O(1).
//!
//! The pool also owns the reverse index mapping a `(size, address)` slot to
//! the node currently holding it, which lets the TLB find an entry without
//! scanning its set.

use super::tag::REVERSE_SLOTS;
use super::tlb::TlbEntry;
use crate::common::constants::{TLB_ENTRIES, TLB_SETS, TLB_WAYS};

/// Index of an entry in the pool: `set * TLB_WAYS + way`.
pub type EntryId = usize;

/// Which of a set's two lists a node is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Unallocated ways.
    Free,
    /// Allocated ways, most recently used first.
    Used,
}

/// List links and bookkeeping for one entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListNode {
    /// Towards the head of the list.
    pub prev: Option<EntryId>,
    /// Towards the tail of the list.
    pub next: Option<EntryId>,
    /// The node is on the used list.
    pub allocated: bool,
    /// Stable sequence number; equal to the node's arena index.
    pub seq: EntryId,
    /// Reverse-index slot this node currently represents.
    pub region: Option<usize>,
}

/// Head and tail of one list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListEnds {
    /// First node, or `None` when the list is empty.
    pub head: Option<EntryId>,
    /// Last node, or `None` when the list is empty.
    pub tail: Option<EntryId>,
}

/// The free and used lists of one set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetLists {
    /// Unallocated ways.
    pub free: ListEnds,
    /// Allocated ways, MRU to LRU.
    pub used: ListEnds,
}

impl SetLists {
    const fn ends(&self, kind: ListKind) -> &ListEnds {
        match kind {
            ListKind::Free => &self.free,
            ListKind::Used => &self.used,
        }
    }

    const fn ends_mut(&mut self, kind: ListKind) -> &mut ListEnds {
        match kind {
            ListKind::Free => &mut self.free,
            ListKind::Used => &mut self.used,
        }
    }
}

/// Fixed arena of TLB entries with their list nodes and the reverse index.
#[derive(Clone, Debug)]
pub struct EntryPool {
    entries: [TlbEntry; TLB_ENTRIES],
    nodes: [ListNode; TLB_ENTRIES],
    sets: [SetLists; TLB_SETS],
    reverse: Vec<Option<u8>>,
}

impl Default for EntryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryPool {
    /// Creates a pool with every way on its set's free list.
    pub fn new() -> Self {
        let mut pool = Self {
            entries: [TlbEntry::default(); TLB_ENTRIES],
            nodes: [ListNode::default(); TLB_ENTRIES],
            sets: [SetLists::default(); TLB_SETS],
            reverse: vec![None; REVERSE_SLOTS],
        };
        pool.reset();
        pool
    }

    /// Frees every entry and clears the reverse index.
    ///
    /// Afterwards each set's free list holds ways 0..4 in order, way 0 at the head.
    pub fn reset(&mut self) {
        self.reverse.fill(None);
        for set in 0..TLB_SETS {
            let base = set * TLB_WAYS;
            for way in 0..TLB_WAYS {
                let id = base + way;
                self.entries[id] = TlbEntry::default();
                self.nodes[id] = ListNode {
                    prev: if way == 0 { None } else { Some(id - 1) },
                    next: if way + 1 == TLB_WAYS { None } else { Some(id + 1) },
                    allocated: false,
                    seq: id,
                    region: None,
                };
            }
            self.sets[set] = SetLists {
                free: ListEnds {
                    head: Some(base),
                    tail: Some(base + TLB_WAYS - 1),
                },
                used: ListEnds::default(),
            };
        }
    }

    /// Unlinks `id` from list `from` and pushes it at the head of list `to`.
    ///
    /// Does nothing if `id` already heads `to`. `from` must be the list the
    /// node is currently on; `from == to` moves a node to the front.
    pub fn move_node(&mut self, id: EntryId, from: ListKind, to: ListKind) {
        let set = id / TLB_WAYS;
        if self.sets[set].ends(to).head == Some(id) {
            return;
        }

        let ListNode { prev, next, .. } = self.nodes[id];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.sets[set].ends_mut(from).head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.sets[set].ends_mut(from).tail = prev,
        }

        let old_head = self.sets[set].ends(to).head;
        self.nodes[id].prev = None;
        self.nodes[id].next = old_head;
        match old_head {
            Some(h) => self.nodes[h].prev = Some(id),
            None => self.sets[set].ends_mut(to).tail = Some(id),
        }
        self.sets[set].ends_mut(to).head = Some(id);
    }

    /// Takes the first free way of `set` and makes it the newest used way.
    ///
    /// Returns `None` when the free list is empty; the caller evicts instead.
    pub fn alloc(&mut self, set: usize) -> Option<EntryId> {
        let id = self.sets[set].free.head?;
        self.move_node(id, ListKind::Free, ListKind::Used);
        self.nodes[id].allocated = true;
        Some(id)
    }

    /// Returns an allocated entry to its set's free list.
    ///
    /// Clears the entry's reverse mapping and zeroes its tag. Returns `false`
    /// if the entry was already free.
    pub fn free(&mut self, id: EntryId) -> bool {
        if !self.nodes[id].allocated {
            return false;
        }
        self.nodes[id].allocated = false;
        self.release_region(id);
        self.entries[id].tag = 0;
        self.move_node(id, ListKind::Used, ListKind::Free);
        true
    }

    /// Marks an entry as most recently used, allocating it first if it is free.
    pub fn touch(&mut self, id: EntryId) {
        if self.nodes[id].allocated {
            self.move_node(id, ListKind::Used, ListKind::Used);
        } else {
            self.move_node(id, ListKind::Free, ListKind::Used);
            self.nodes[id].allocated = true;
        }
    }

    /// Picks the way that the next insert into `set` overwrites.
    ///
    /// A free way is allocated if one exists. Otherwise the least recently
    /// used way is evicted: its reverse mapping is dropped and it becomes the
    /// newest entry, ready to be overwritten.
    pub fn oldest(&mut self, set: usize) -> EntryId {
        if let Some(id) = self.alloc(set) {
            self.release_region(id);
            return id;
        }
        let tail = self.sets[set].used.tail;
        debug_assert!(tail.is_some(), "TLB set {set} has neither free nor used ways");
        match tail {
            Some(tail) => {
                self.release_region(tail);
                self.move_node(tail, ListKind::Used, ListKind::Used);
                tail
            }
            None => {
                tracing::error!(set, "TLB set lists corrupted, falling back to way 0");
                set * TLB_WAYS
            }
        }
    }

    /// Returns the entry representing a reverse-index slot, if any.
    #[inline(always)]
    pub fn find(&self, index: usize) -> Option<EntryId> {
        self.reverse.get(index).copied().flatten().map(EntryId::from)
    }

    /// Records that `id` now represents reverse-index slot `index`.
    pub fn register(&mut self, id: EntryId, index: usize) {
        self.release_region(id);
        if let Some(slot) = self.reverse.get_mut(index) {
            *slot = Some(id as u8);
            self.nodes[id].region = Some(index);
        }
    }

    /// Drops the reverse mapping held by `id`, if it still owns its slot.
    pub fn release_region(&mut self, id: EntryId) {
        if let Some(index) = self.nodes[id].region.take() {
            if self.find(index) == Some(id) {
                self.reverse[index] = None;
            }
        }
    }

    /// The entry stored at `id`.
    #[inline(always)]
    pub fn entry(&self, id: EntryId) -> &TlbEntry {
        &self.entries[id]
    }

    /// Mutable access to the entry stored at `id`.
    #[inline(always)]
    pub fn entry_mut(&mut self, id: EntryId) -> &mut TlbEntry {
        &mut self.entries[id]
    }

    /// The list node of `id`.
    pub fn node(&self, id: EntryId) -> &ListNode {
        &self.nodes[id]
    }

    /// The lists of `set`.
    pub fn lists(&self, set: usize) -> &SetLists {
        &self.sets[set]
    }

    /// Returns `true` if `id` is on the used list.
    #[inline(always)]
    pub fn is_allocated(&self, id: EntryId) -> bool {
        self.nodes[id].allocated
    }

    /// Returns `true` if `set` has no free way left.
    pub fn free_is_empty(&self, set: usize) -> bool {
        self.sets[set].free.head.is_none()
    }

    /// First node of a list.
    pub fn head(&self, set: usize, kind: ListKind) -> Option<EntryId> {
        self.sets[set].ends(kind).head
    }

    /// Successor of `id` on its list.
    #[inline]
    pub fn next(&self, id: EntryId) -> Option<EntryId> {
        self.nodes[id].next
    }

    /// Used ways of `set`, MRU first.
    pub fn used_ids(&self, set: usize) -> Vec<EntryId> {
        self.walk(set, ListKind::Used)
    }

    /// Number of nodes on a list.
    pub fn list_len(&self, set: usize, kind: ListKind) -> usize {
        self.walk(set, kind).len()
    }

    fn walk(&self, set: usize, kind: ListKind) -> Vec<EntryId> {
        let mut ids = Vec::with_capacity(TLB_WAYS);
        let mut cursor = self.head(set, kind);
        while let Some(id) = cursor {
            if ids.len() > TLB_WAYS {
                break;
            }
            ids.push(id);
            cursor = self.nodes[id].next;
        }
        ids
    }
}

//! Persistent list
//!
//! List operations expressed as cell-reference chasing through a
//! [`CellStore`]. The list is always in one of two domain states: empty
//! (no head, no tail, zero length) or non-empty (length >= 1, head and tail
//! valid, equal exactly when length is 1). Every operation preserves that
//! duality.

use std::marker::PhantomData;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{CellarError, Result};
use crate::store::{CellRef, CellStore};

use super::{ListIndex, Node, Record, INDEX_SIZE};

/// Singly linked list of fixed-size records persisted to a single file.
///
/// Positions are 0-based. Head-side operations are O(1); anything that must
/// reach an interior position or the tail's predecessor walks the chain
/// from the head — the list is singly linked and cannot traverse backward,
/// so `pop_back` on a long list costs O(len) while `pop_front` stays O(1).
/// That asymmetry is a property of the structure, not an oversight.
///
/// The cached index record is the single source of truth while the list is
/// open; it is written back to the store's index slot on every structural
/// mutation and again on [`close`](Self::close).
pub struct PersistentList<R: Record> {
    /// Underlying cell store, exclusively owned
    store: CellStore,

    /// Cached head/tail/len record
    index: ListIndex,

    _record: PhantomData<R>,
}

impl<R: Record> PersistentList<R> {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a new list file with the default config.
    ///
    /// Fails with [`CellarError::AlreadyExists`] if the file exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_config(path, Config::default())
    }

    /// Create a new list file with the given config
    pub fn create_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let store = CellStore::create_with_config(
            path,
            INDEX_SIZE,
            Node::<R>::SIZE as u32,
            config,
        )?;

        let index = ListIndex::default();
        store.write_index(&index.encode())?;

        debug!(path = %store.path().display(), "created list");

        Ok(Self {
            store,
            index,
            _record: PhantomData,
        })
    }

    /// Open an existing list file with the default config.
    ///
    /// Fails with [`CellarError::NotFound`] if the file does not exist, and
    /// with [`CellarError::Corrupted`] if the file's geometry does not match
    /// a list of `R` records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Open an existing list file with the given config
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let store = CellStore::open_with_config(path, config)?;

        if store.index_size() != INDEX_SIZE || store.cell_size() != Node::<R>::SIZE as u32 {
            return Err(CellarError::Corrupted(format!(
                "not a list of {}-byte records: index_size={}, cell_size={}",
                R::SIZE,
                store.index_size(),
                store.cell_size()
            )));
        }

        let index = ListIndex::decode(&store.read_index()?)?;

        debug!(path = %store.path().display(), len = index.len, "opened list");

        Ok(Self {
            store,
            index,
            _record: PhantomData,
        })
    }

    /// Close the list: flush the cached index record and close the store
    pub fn close(self) -> Result<()> {
        self.store.write_index(&self.index.encode())?;
        self.store.close()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the list contains no elements. O(1).
    pub fn is_empty(&self) -> bool {
        self.index.len == 0
    }

    /// Number of elements in the list. O(1).
    pub fn len(&self) -> u64 {
        self.index.len
    }

    /// The first element. O(1). Fails with [`CellarError::EmptyList`] on an
    /// empty list.
    pub fn front(&self) -> Result<R> {
        let head = self.index.head.ok_or(CellarError::EmptyList)?;
        Ok(self.read_node(head)?.element)
    }

    /// The last element. O(1). Fails with [`CellarError::EmptyList`] on an
    /// empty list.
    pub fn back(&self) -> Result<R> {
        let tail = self.index.tail.ok_or(CellarError::EmptyList)?;
        Ok(self.read_node(tail)?.element)
    }

    /// The element at `position`. Valid positions are `0..len`.
    ///
    /// Boundary positions are O(1); interior positions walk the chain from
    /// the head — O(position).
    pub fn get(&self, position: u64) -> Result<R> {
        self.check_position(position)?;
        if position == 0 {
            self.front()
        } else if position == self.index.len - 1 {
            self.back()
        } else {
            Ok(self.node_at(position)?.1.element)
        }
    }

    /// Position of the first element matching `predicate`, or `None`.
    ///
    /// Linear scan from the head. The comparison is entirely the caller's —
    /// the list itself is comparison-agnostic.
    pub fn find<P>(&self, mut predicate: P) -> Result<Option<u64>>
    where
        P: FnMut(&R) -> bool,
    {
        let mut cursor = self.index.head;
        let mut position = 0;
        while let Some(cell) = cursor {
            let node = self.read_node(cell)?;
            if predicate(&node.element) {
                return Ok(Some(position));
            }
            cursor = node.next;
            position += 1;
        }
        Ok(None)
    }

    /// Iterate over all elements from head to tail.
    ///
    /// Each step is a fresh read from storage, so items are `Result<R>`.
    pub fn iter(&self) -> Iter<'_, R> {
        Iter {
            list: self,
            cursor: self.index.head,
        }
    }

    /// Highest cell reference the underlying store has ever allocated.
    ///
    /// For tests and debugging: freed cells are recycled before the store
    /// grows, so this stays flat across balanced insert/remove cycles.
    pub fn allocated_cells(&self) -> u32 {
        self.store.num_cells()
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert an element at the front. O(1).
    pub fn push_front(&mut self, element: R) -> Result<()> {
        let cell = self.store.allocate()?;
        self.write_node(
            cell,
            &Node {
                element,
                next: self.index.head,
            },
        )?;

        self.index.head = Some(cell);
        if self.index.tail.is_none() {
            self.index.tail = Some(cell);
        }
        self.index.len += 1;
        self.write_back()
    }

    /// Insert an element at the back. O(1).
    pub fn push_back(&mut self, element: R) -> Result<()> {
        let cell = self.store.allocate()?;
        self.write_node(
            cell,
            &Node {
                element,
                next: None,
            },
        )?;

        match self.index.tail {
            Some(prev) => {
                let mut prev_node = self.read_node(prev)?;
                prev_node.next = Some(cell);
                self.write_node(prev, &prev_node)?;
            }
            None => self.index.head = Some(cell),
        }

        self.index.tail = Some(cell);
        self.index.len += 1;
        self.write_back()
    }

    /// Insert an element at `position`. Valid positions are `0..=len`.
    ///
    /// Position 0 and `len` degenerate to the O(1) push operations; interior
    /// positions splice after the predecessor — O(position).
    pub fn insert(&mut self, position: u64, element: R) -> Result<()> {
        if position > self.index.len {
            return Err(CellarError::OutOfRange {
                position,
                len: self.index.len,
            });
        }

        if position == 0 {
            self.push_front(element)
        } else if position == self.index.len {
            self.push_back(element)
        } else {
            let (prev_cell, mut prev_node) = self.node_at(position - 1)?;

            let cell = self.store.allocate()?;
            self.write_node(
                cell,
                &Node {
                    element,
                    next: prev_node.next,
                },
            )?;

            prev_node.next = Some(cell);
            self.write_node(prev_cell, &prev_node)?;

            self.index.len += 1;
            self.write_back()
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove and return the first element. O(1).
    pub fn pop_front(&mut self) -> Result<R> {
        let head = self.index.head.ok_or(CellarError::EmptyList)?;
        let node = self.read_node(head)?;

        self.index.head = node.next;
        if self.index.head.is_none() {
            self.index.tail = None;
        }
        self.index.len -= 1;
        self.write_back()?;

        self.store.free(head)?;
        Ok(node.element)
    }

    /// Remove and return the last element.
    ///
    /// O(len) for lists longer than one element: the tail's predecessor is
    /// only reachable by walking from the head.
    pub fn pop_back(&mut self) -> Result<R> {
        if self.index.len <= 1 {
            return self.pop_front();
        }

        let (prev_cell, mut prev_node) = self.node_at(self.index.len - 2)?;
        let tail_cell = prev_node.next.ok_or_else(Self::broken_chain)?;
        let tail_node = self.read_node(tail_cell)?;

        prev_node.next = None;
        self.write_node(prev_cell, &prev_node)?;

        self.index.tail = Some(prev_cell);
        self.index.len -= 1;
        self.write_back()?;

        self.store.free(tail_cell)?;
        Ok(tail_node.element)
    }

    /// Remove and return the element at `position`. Valid positions are
    /// `0..len`.
    ///
    /// Boundaries degenerate to the pop operations; interior positions
    /// splice the target out — O(position).
    pub fn remove(&mut self, position: u64) -> Result<R> {
        self.check_position(position)?;

        if position == 0 {
            self.pop_front()
        } else if position == self.index.len - 1 {
            self.pop_back()
        } else {
            let (prev_cell, mut prev_node) = self.node_at(position - 1)?;
            let cell = prev_node.next.ok_or_else(Self::broken_chain)?;
            let node = self.read_node(cell)?;

            prev_node.next = node.next;
            self.write_node(prev_cell, &prev_node)?;

            self.index.len -= 1;
            self.write_back()?;

            self.store.free(cell)?;
            Ok(node.element)
        }
    }

    /// Remove all elements, returning every cell to the free list.
    ///
    /// Reads each node's successor before freeing the node, then resets and
    /// flushes the index record. A no-op on an already-empty list.
    pub fn clear(&mut self) -> Result<()> {
        let mut cursor = self.index.head;
        while let Some(cell) = cursor {
            cursor = self.read_node(cell)?.next;
            self.store.free(cell)?;
        }

        self.index = ListIndex::default();
        self.write_back()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read_node(&self, cell: CellRef) -> Result<Node<R>> {
        Ok(Node::decode(&self.store.read_cell(cell)?))
    }

    fn write_node(&self, cell: CellRef, node: &Node<R>) -> Result<()> {
        self.store.write_cell(cell, &node.encode())
    }

    /// Flush the cached index record to the store's index slot
    fn write_back(&self) -> Result<()> {
        self.store.write_index(&self.index.encode())
    }

    /// Walk `position` links from the head, returning that node and its cell
    fn node_at(&self, position: u64) -> Result<(CellRef, Node<R>)> {
        let mut cell = self.index.head.ok_or(CellarError::EmptyList)?;
        let mut node = self.read_node(cell)?;
        for _ in 0..position {
            cell = node.next.ok_or_else(Self::broken_chain)?;
            node = self.read_node(cell)?;
        }
        Ok((cell, node))
    }

    fn check_position(&self, position: u64) -> Result<()> {
        if position >= self.index.len {
            return Err(CellarError::OutOfRange {
                position,
                len: self.index.len,
            });
        }
        Ok(())
    }

    /// A chain ending before the cached length promises — index slot and
    /// node links disagree
    fn broken_chain() -> CellarError {
        CellarError::Corrupted("node chain ended before the recorded length".to_string())
    }
}

/// Iterator over list elements, head to tail
pub struct Iter<'a, R: Record> {
    list: &'a PersistentList<R>,
    cursor: Option<CellRef>,
}

impl<R: Record> Iterator for Iter<'_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cursor?;
        match self.list.read_node(cell) {
            Ok(node) => {
                self.cursor = node.next;
                Some(Ok(node.element))
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}

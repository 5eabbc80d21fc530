//! Arena-backed doubly linked list.
//!
//! This is the recency queue of the SIEVE cache. Nodes live in a slot arena
//! and refer to each other by slot index instead of by pointer, so a stale
//! handle can at worst name an empty slot, never freed memory.
//!
//! ```text
//!   head (newest)                                  tail (oldest)
//!   ┌──────┐  older  ┌──────┐  older  ┌──────┐
//!   │ slot │ ──────▶ │ slot │ ──────▶ │ slot │ ──▶ None
//!   │  3   │ ◀────── │  0   │ ◀────── │  5   │
//!   └──────┘  newer  └──────┘  newer  └──────┘
//! ```
//!
//! Values are always linked at the head. Removed slots are recycled by the
//! next insertion.
//!
//! **Note**: This module is internal infrastructure. The list performs no
//! synchronization of its own; the cache keeps it behind its structural lock.

use crate::error::InvariantError;

/// Stable position of a node inside a [`List`].
pub(crate) type Slot = usize;

struct Node<T> {
    value: T,
    /// Neighbour toward the head.
    newer: Option<Slot>,
    /// Neighbour toward the tail.
    older: Option<Slot>,
}

/// A doubly linked list whose nodes are addressed by [`Slot`].
pub(crate) struct List<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<Slot>,
    head: Option<Slot>,
    tail: Option<Slot>,
    len: usize,
}

impl<T> List<T> {
    /// Creates an empty list with room for `capacity` nodes before reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        List {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Newest node.
    #[inline]
    pub(crate) fn head(&self) -> Option<Slot> {
        self.head
    }

    /// Oldest node.
    #[inline]
    pub(crate) fn tail(&self) -> Option<Slot> {
        self.tail
    }

    #[inline]
    fn node(&self, slot: Slot) -> Option<&Node<T>> {
        self.nodes.get(slot).and_then(Option::as_ref)
    }

    /// Returns `true` if `slot` currently holds a linked node.
    #[inline]
    pub(crate) fn contains(&self, slot: Slot) -> bool {
        self.node(slot).is_some()
    }

    #[inline]
    pub(crate) fn get(&self, slot: Slot) -> Option<&T> {
        self.node(slot).map(|node| &node.value)
    }

    /// Neighbour of `slot` toward the head, `None` for the head itself.
    #[inline]
    pub(crate) fn newer(&self, slot: Slot) -> Option<Slot> {
        self.node(slot).and_then(|node| node.newer)
    }

    /// Neighbour of `slot` toward the tail, `None` for the tail itself.
    #[inline]
    pub(crate) fn older(&self, slot: Slot) -> Option<Slot> {
        self.node(slot).and_then(|node| node.older)
    }

    /// Returns the slot the next [`push_front`](Self::push_front) will occupy.
    #[inline]
    pub(crate) fn next_slot(&self) -> Slot {
        self.free.last().copied().unwrap_or(self.nodes.len())
    }

    /// Links `value` at the head and returns its slot.
    pub(crate) fn push_front(&mut self, value: T) -> Slot {
        let node = Node {
            value,
            newer: None,
            older: self.head,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.head {
            Some(old_head) => {
                if let Some(old) = self.nodes[old_head].as_mut() {
                    old.newer = Some(slot);
                }
            }
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
        slot
    }

    /// Unlinks the node at `slot` and returns its value.
    ///
    /// Returns `None` if `slot` is empty. Head and tail are updated when the
    /// node was an endpoint.
    pub(crate) fn remove(&mut self, slot: Slot) -> Option<T> {
        let node = self.nodes.get_mut(slot)?.take()?;

        match node.newer {
            Some(newer) => {
                if let Some(n) = self.nodes[newer].as_mut() {
                    n.older = node.older;
                }
            }
            None => self.head = node.older,
        }
        match node.older {
            Some(older) => {
                if let Some(n) = self.nodes[older].as_mut() {
                    n.newer = node.newer;
                }
            }
            None => self.tail = node.newer,
        }

        self.free.push(slot);
        self.len -= 1;
        Some(node.value)
    }

    /// Drops every node at once, keeping the arena's allocation.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates from head (newest) to tail (oldest).
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Verifies that the links form one well-formed chain of `len` nodes.
    ///
    /// Checks that `a.older == b` iff `b.newer == a` for consecutive nodes,
    /// that the endpoints have no outer neighbours, and that no occupied slot
    /// is unreachable from the head.
    pub(crate) fn check_links(&self) -> Result<(), InvariantError> {
        if self.head.is_none() != self.tail.is_none() {
            return Err(InvariantError::new(
                "exactly one of head and tail is set",
            ));
        }

        let mut previous: Option<Slot> = None;
        let mut cursor = self.head;
        let mut walked = 0usize;
        while let Some(slot) = cursor {
            let node = self.node(slot).ok_or_else(|| {
                InvariantError::new(format!("slot {slot} is linked but empty"))
            })?;
            if node.newer != previous {
                return Err(InvariantError::new(format!(
                    "slot {slot} has newer {:?}, expected {previous:?}",
                    node.newer
                )));
            }
            walked += 1;
            if walked > self.len {
                return Err(InvariantError::new("cycle or length mismatch in queue"));
            }
            previous = Some(slot);
            cursor = node.older;
        }

        if previous != self.tail {
            return Err(InvariantError::new(format!(
                "walk ended at {previous:?} but tail is {:?}",
                self.tail
            )));
        }
        if walked != self.len {
            return Err(InvariantError::new(format!(
                "walked {walked} nodes but len is {}",
                self.len
            )));
        }
        let occupied = self.nodes.iter().filter(|n| n.is_some()).count();
        if occupied != self.len {
            return Err(InvariantError::new(format!(
                "{occupied} occupied slots but len is {}",
                self.len
            )));
        }
        Ok(())
    }
}

/// Head-to-tail iterator over `(slot, value)` pairs.
pub(crate) struct Iter<'a, T> {
    list: &'a List<T>,
    next: Option<Slot>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Slot, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.next?;
        let node = self.list.node(slot)?;
        self.next = node.older;
        self.remaining -= 1;
        Some((slot, &node.value))
    }
}

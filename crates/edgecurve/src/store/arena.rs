//! Slot arena for polyline nodes.
//!
//! Slots are recycled through a free list; each reuse bumps the slot's
//! generation so handles to deleted nodes stay detectably stale.

use super::types::{NodeHandle, PolylineNode};

#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub node: PolylineNode,
    pub prev: Option<NodeHandle>,
    pub next: Option<NodeHandle>,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl NodeArena {
    pub fn alloc(&mut self, node: PolylineNode) -> NodeHandle {
        let entry = Entry {
            node,
            prev: None,
            next: None,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        NodeHandle {
            index,
            generation: 0,
        }
    }

    pub fn release(&mut self, h: NodeHandle) -> Option<Entry> {
        let slot = self.slots.get_mut(h.index as usize)?;
        if slot.generation != h.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(h.index);
        self.live -= 1;
        Some(entry)
    }

    #[inline]
    pub fn get(&self, h: NodeHandle) -> Option<&Entry> {
        let slot = self.slots.get(h.index as usize)?;
        if slot.generation != h.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, h: NodeHandle) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(h.index as usize)?;
        if slot.generation != h.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    #[inline]
    pub fn set_next(&mut self, h: NodeHandle, next: Option<NodeHandle>) {
        if let Some(e) = self.get_mut(h) {
            e.next = next;
        }
    }

    #[inline]
    pub fn set_prev(&mut self, h: NodeHandle, prev: Option<NodeHandle>) {
        if let Some(e) = self.get_mut(h) {
            e.prev = prev;
        }
    }

    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }
}

//! The recycled witness-cell and quadratic-group arenas.
//!
//! Grounded on `witness_manager.hpp`'s `recycle_pool<mpz_class, ...>` /
//! `recycle_pool<quadratic_slot, ...>`: instead of pointer-tagged pooled
//! objects, cells and groups live in flat `Vec`s addressed by a small index
//! handle, with a free list of recycled slots. `lazy_witness.hpp`'s exact
//! per-witness reference-counting state machine wasn't part of the
//! retrieved source and is reconstructed here at a coarser grain: one
//! refcount per cell, and a quadratic group commits once all three member
//! cells have independently reached zero.

use zkwasm_field::Scalar;

/// Handle to a pooled witness cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WitnessId(pub(crate) u32);

/// Handle to a pooled quadratic group (an L·R=O triple).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) u32);

/// Which leg of a quadratic triple a cell occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuadPos {
    /// Left multiplicand, feeds `quadratic_val[0]`.
    L,
    /// Right multiplicand, feeds `quadratic_val[1]`.
    R,
    /// Product, feeds `quadratic_val[2]`.
    O,
}

impl QuadPos {
    pub(crate) const fn index(self) -> usize {
        match self {
            QuadPos::L => 0,
            QuadPos::R => 1,
            QuadPos::O => 2,
        }
    }
}

/// Which row stream a cell eventually commits into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Linear,
    Quadratic(GroupId, QuadPos),
}

pub(crate) struct Cell {
    pub value: Scalar,
    pub random: Scalar,
    pub refcount: u32,
    pub role: Role,
}

pub(crate) struct Group {
    pub members: [Option<u32>; 3],
    pub ready: [bool; 3],
}

/// A flat, index-addressed pool with a free list, mirroring the shape of the
/// C++ `recycle_pool`.
pub(crate) struct Pool<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Pool<T> {
    pub fn acquire(&mut self, value: T) -> u32 {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(value);
            idx
        } else {
            self.slots.push(Some(value));
            (self.slots.len() - 1) as u32
        }
    }

    pub fn get(&self, idx: u32) -> &T {
        self.slots[idx as usize]
            .as_ref()
            .expect("pool: stale handle")
    }

    pub fn get_mut(&mut self, idx: u32) -> &mut T {
        self.slots[idx as usize]
            .as_mut()
            .expect("pool: stale handle")
    }

    pub fn recycle(&mut self, idx: u32) -> T {
        let value = self.slots[idx as usize].take().expect("pool: double recycle");
        self.free.push(idx);
        value
    }

    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

//! Fixed-capacity overwrite ring
//!
//! Backs both the smoothing window and the tap history. The arena never
//! grows: each push overwrites the slot under the write index (the oldest
//! value once the ring has wrapped) and advances the index modulo `N`.

/// Fixed-capacity ring of `N` slots with a manually tracked write index
///
/// # Example
/// ```
/// use tapper_core::detector::ring::FixedRing;
///
/// let mut ring: FixedRing<u32, 3> = FixedRing::new();
/// for v in 1..=4 {
///     ring.push(v);
/// }
/// // Slot 0 held the oldest value (1) and was overwritten by 4
/// assert_eq!(ring.snapshot(), Some([4, 2, 3]));
/// ```
#[derive(Debug, Clone)]
pub struct FixedRing<T, const N: usize> {
    slots: [Option<T>; N],
    next: usize,
    writes: u64,
}

impl<T: Copy, const N: usize> FixedRing<T, N> {
    pub fn new() -> Self {
        Self {
            slots: [None; N],
            next: 0,
            writes: 0,
        }
    }

    /// Write `value` into the current slot and advance the index
    pub fn push(&mut self, value: T) {
        self.slots[self.next] = Some(value);
        self.next = (self.next + 1) % N;
        self.writes += 1;
    }

    /// Copy of every slot in physical (overwrite) order
    ///
    /// `None` until each slot has been written at least once.
    pub fn snapshot(&self) -> Option<[T; N]> {
        let mut out = [self.slots[0]?; N];
        for (dst, slot) in out.iter_mut().zip(self.slots.iter()) {
            *dst = (*slot)?;
        }
        Some(out)
    }

    /// Raw slots, including ones not yet written
    pub fn slots(&self) -> &[Option<T>; N] {
        &self.slots
    }

    /// Index the next push will write to
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Number of pushes ever made
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether every slot has been written at least once
    pub fn is_saturated(&self) -> bool {
        self.writes >= N as u64
    }
}

impl<T: Copy, const N: usize> Default for FixedRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

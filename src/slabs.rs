//! Shared body buffer ("slabs") - Structure-of-Arrays over one allocation.
//!
//! All per-body state that crosses the physics -> renderer boundary lives in
//! a single contiguous allocation, sliced into typed sub-views. This gives
//! the renderer byte ranges it can hand straight to `queue.write_buffer`
//! with no per-body packing, and it keeps the upload for a frame bounded by
//! the *active* body count even though the allocation is sized for the fixed
//! maximum capacity.
//!
//! ## Word layout (capacity C, one word = 4 bytes)
//!
//! | region     | words        | type      | per body |
//! |------------|--------------|-----------|----------|
//! | positions  | `0 .. 2C`    | f32 pairs | 8 bytes  |
//! | angles     | `2C .. 3C`   | f32       | 4 bytes  |
//! | radii      | `3C .. 4C`   | f32       | 4 bytes  |
//! | colors     | `4C .. 5C`   | u32 RGBA8 | 4 bytes  |
//! | velocities | `5C .. 7C`   | f32 pairs | 8 bytes  |
//!
//! Positions + angles form the **dynamic** region (rewritten every frame);
//! radii + colors form the **static** region (rewritten only when bodies are
//! recreated). Velocities are carried for state snapshots and never uploaded.
//!
//! Region offsets are computed once at construction and never move; only
//! `active` (<= capacity) varies over the buffer's lifetime.

/// Hard cap on simulated bodies. All buffers (CPU and GPU) are sized for
/// this count up front so body-count changes never reallocate.
pub const MAX_BODIES: usize = 1024;

/// Structure-of-Arrays body buffer backed by one allocation.
pub struct BodySlabs {
    /// Backing store. `u32` words rather than bytes so the `f32` casts are
    /// alignment-safe.
    data: Box<[u32]>,
    capacity: usize,
    active: usize,
}

impl BodySlabs {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u32; capacity * Self::WORDS_PER_BODY].into_boxed_slice(),
            capacity,
            active: 0,
        }
    }

    const WORDS_PER_BODY: usize = 7;

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bodies currently holding valid data.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Set the active body count. Panics if it exceeds capacity; the
    /// physics engine enforces the cap before writing.
    pub fn set_active(&mut self, count: usize) {
        assert!(count <= self.capacity, "active count exceeds slab capacity");
        self.active = count;
    }

    // Region word offsets.
    fn positions_range(&self) -> std::ops::Range<usize> {
        0..2 * self.capacity
    }
    fn angles_range(&self) -> std::ops::Range<usize> {
        2 * self.capacity..3 * self.capacity
    }
    fn radii_range(&self) -> std::ops::Range<usize> {
        3 * self.capacity..4 * self.capacity
    }
    fn colors_range(&self) -> std::ops::Range<usize> {
        4 * self.capacity..5 * self.capacity
    }
    fn velocities_range(&self) -> std::ops::Range<usize> {
        5 * self.capacity..7 * self.capacity
    }

    // === Typed views (full capacity; callers index by body) ===

    pub fn positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data[self.positions_range()])
    }
    pub fn positions_mut(&mut self) -> &mut [f32] {
        let r = self.positions_range();
        bytemuck::cast_slice_mut(&mut self.data[r])
    }
    pub fn angles(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data[self.angles_range()])
    }
    pub fn angles_mut(&mut self) -> &mut [f32] {
        let r = self.angles_range();
        bytemuck::cast_slice_mut(&mut self.data[r])
    }
    pub fn radii(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data[self.radii_range()])
    }
    pub fn radii_mut(&mut self) -> &mut [f32] {
        let r = self.radii_range();
        bytemuck::cast_slice_mut(&mut self.data[r])
    }
    pub fn colors(&self) -> &[u32] {
        &self.data[self.colors_range()]
    }
    pub fn colors_mut(&mut self) -> &mut [u32] {
        let r = self.colors_range();
        &mut self.data[r]
    }
    pub fn velocities(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data[self.velocities_range()])
    }
    pub fn velocities_mut(&mut self) -> &mut [f32] {
        let r = self.velocities_range();
        bytemuck::cast_slice_mut(&mut self.data[r])
    }

    /// Simultaneous views for collision resolution: mutable positions and
    /// velocities plus read-only radii, split safely out of the one
    /// allocation.
    pub fn contact_views(&mut self) -> (&mut [f32], &mut [f32], &[f32]) {
        let c = self.capacity;
        let (front, velocities) = self.data.split_at_mut(5 * c);
        let (positions, rest) = front.split_at_mut(2 * c);
        let radii = &rest[c..2 * c];
        (
            bytemuck::cast_slice_mut(positions),
            bytemuck::cast_slice_mut(velocities),
            bytemuck::cast_slice(radii),
        )
    }

    // === Upload byte ranges (active bodies only) ===
    //
    // These back the renderer's `write_buffer` calls: exactly
    // `active * bytes_per_body` valid bytes per attribute, never more.

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions()[..self.active * 2])
    }
    pub fn angle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.angles()[..self.active])
    }
    pub fn radius_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.radii()[..self.active])
    }
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors()[..self.active])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_offsets_are_stable_and_disjoint() {
        let slabs = BodySlabs::new(16);
        assert_eq!(slabs.positions().len(), 32);
        assert_eq!(slabs.angles().len(), 16);
        assert_eq!(slabs.radii().len(), 16);
        assert_eq!(slabs.colors().len(), 16);
        assert_eq!(slabs.velocities().len(), 32);
        assert_eq!(slabs.data.len(), 16 * BodySlabs::WORDS_PER_BODY);
    }

    #[test]
    fn writes_land_in_their_region() {
        let mut slabs = BodySlabs::new(4);
        slabs.positions_mut()[0] = 1.5;
        slabs.angles_mut()[0] = 2.5;
        slabs.radii_mut()[3] = 3.5;
        slabs.colors_mut()[3] = 0xDEADBEEF;
        slabs.velocities_mut()[7] = 4.5;

        assert_eq!(slabs.positions()[0], 1.5);
        assert_eq!(slabs.angles()[0], 2.5);
        assert_eq!(slabs.radii()[3], 3.5);
        assert_eq!(slabs.colors()[3], 0xDEADBEEF);
        assert_eq!(slabs.velocities()[7], 4.5);
    }

    #[test]
    fn upload_ranges_track_active_count() {
        let mut slabs = BodySlabs::new(MAX_BODIES);
        for n in [0usize, 1, 17, MAX_BODIES] {
            slabs.set_active(n);
            assert_eq!(slabs.position_bytes().len(), n * 8);
            assert_eq!(slabs.angle_bytes().len(), n * 4);
            assert_eq!(slabs.radius_bytes().len(), n * 4);
            assert_eq!(slabs.color_bytes().len(), n * 4);
        }
    }

    #[test]
    #[should_panic(expected = "active count exceeds slab capacity")]
    fn overflowing_active_count_panics() {
        let mut slabs = BodySlabs::new(8);
        slabs.set_active(9);
    }
}

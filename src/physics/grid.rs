//! Uniform spatial grid for broad-phase collision detection.
//!
//! The canvas area is divided into square cells at least one max body
//! diameter wide, so any overlapping pair is either in the same cell or in
//! directly adjacent cells. The grid is rebuilt every step with a counting
//! pass plus prefix sum into flat fixed-size arrays; no per-step allocation
//! once warmed up, and iteration order is deterministic.

use glam::{IVec2, UVec2, Vec2};

/// Forward neighbor offsets for half-space pair enumeration. Checking only
/// these four (plus same-cell pairs) visits every adjacent pair exactly once.
const FORWARD_NEIGHBORS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

pub struct SpatialGrid {
    dims: UVec2,
    origin: Vec2,
    cell_size: f32,
    /// Body indices, grouped by cell via the prefix-sum offsets.
    cell_contents: Vec<usize>,
    cell_offsets: Vec<usize>,
    cell_counts: Vec<usize>,
    /// Cells touched by the last rebuild; only these get cleared next time.
    used_cells: Vec<usize>,
}

/// An overlapping body pair found by the broad phase. `normal` points from
/// body `a` toward body `b`.
#[derive(Debug, Clone, Copy)]
pub struct CollisionPair {
    pub index_a: usize,
    pub index_b: usize,
    pub overlap: f32,
    pub normal: Vec2,
}

impl SpatialGrid {
    /// Build a grid covering `[origin, origin + extent]` with cells no
    /// smaller than `min_cell_size` (one max body diameter).
    pub fn new(origin: Vec2, extent: Vec2, min_cell_size: f32, capacity: usize) -> Self {
        let min_cell_size = min_cell_size.max(1e-3);
        let dims = UVec2::new(
            ((extent.x / min_cell_size).floor() as u32).max(1),
            ((extent.y / min_cell_size).floor() as u32).max(1),
        );
        // Cells stretch to cover the extent exactly; they can only be
        // larger than the minimum, never smaller.
        let cell_size = (extent.x / dims.x as f32).max(extent.y / dims.y as f32);
        let cell_count = (dims.x * dims.y) as usize;

        Self {
            dims,
            origin,
            cell_size,
            cell_contents: vec![0; capacity],
            cell_offsets: vec![0; cell_count],
            cell_counts: vec![0; cell_count],
            used_cells: Vec::with_capacity(cell_count),
        }
    }

    fn cell_coord(&self, position: Vec2) -> IVec2 {
        let local = (position - self.origin) / self.cell_size;
        IVec2::new(
            (local.x as i32).clamp(0, self.dims.x as i32 - 1),
            (local.y as i32).clamp(0, self.dims.y as i32 - 1),
        )
    }

    fn cell_index(&self, coord: IVec2) -> Option<usize> {
        if coord.x < 0
            || coord.y < 0
            || coord.x >= self.dims.x as i32
            || coord.y >= self.dims.y as i32
        {
            return None;
        }
        Some(coord.y as usize * self.dims.x as usize + coord.x as usize)
    }

    fn cell_contents(&self, cell: usize) -> &[usize] {
        let start = self.cell_offsets[cell];
        &self.cell_contents[start..start + self.cell_counts[cell]]
    }

    /// Re-bucket the first `count` bodies. `positions` is the interleaved
    /// x,y slab view.
    pub fn rebuild(&mut self, positions: &[f32], count: usize) {
        for &cell in &self.used_cells {
            self.cell_counts[cell] = 0;
        }
        self.used_cells.clear();

        for i in 0..count {
            let p = Vec2::new(positions[2 * i], positions[2 * i + 1]);
            let cell = self
                .cell_index(self.cell_coord(p))
                .expect("clamped coord is always in range");
            if self.cell_counts[cell] == 0 {
                self.used_cells.push(cell);
            }
            self.cell_counts[cell] += 1;
        }

        let mut offset = 0;
        for &cell in &self.used_cells {
            self.cell_offsets[cell] = offset;
            offset += self.cell_counts[cell];
        }

        // Reset counts and reuse them as insertion cursors.
        for &cell in &self.used_cells {
            self.cell_counts[cell] = 0;
        }
        for i in 0..count {
            let p = Vec2::new(positions[2 * i], positions[2 * i + 1]);
            let cell = self
                .cell_index(self.cell_coord(p))
                .expect("clamped coord is always in range");
            self.cell_contents[self.cell_offsets[cell] + self.cell_counts[cell]] = i;
            self.cell_counts[cell] += 1;
        }
    }

    /// Enumerate overlapping pairs, sorted by index for deterministic
    /// resolution order.
    pub fn detect_collisions(
        &self,
        positions: &[f32],
        radii: &[f32],
        pairs: &mut Vec<CollisionPair>,
    ) {
        pairs.clear();
        let body = |i: usize| Vec2::new(positions[2 * i], positions[2 * i + 1]);

        for &cell in &self.used_cells {
            let contents = self.cell_contents(cell);
            let coord = IVec2::new(
                (cell % self.dims.x as usize) as i32,
                (cell / self.dims.x as usize) as i32,
            );

            for i in 0..contents.len() {
                let a = contents[i];
                for &b in &contents[i + 1..] {
                    if let Some(pair) = test_pair(a, b, body(a), body(b), radii) {
                        pairs.push(pair);
                    }
                }
            }

            for &offset in &FORWARD_NEIGHBORS {
                let Some(neighbor) = self.cell_index(coord + offset) else {
                    continue;
                };
                for &a in contents {
                    for &b in self.cell_contents(neighbor) {
                        if let Some(pair) = test_pair(a, b, body(a), body(b), radii) {
                            pairs.push(pair);
                        }
                    }
                }
            }
        }

        pairs.sort_unstable_by_key(|pair| (pair.index_a, pair.index_b));
    }
}

fn test_pair(a: usize, b: usize, pa: Vec2, pb: Vec2, radii: &[f32]) -> Option<CollisionPair> {
    let delta = pb - pa;
    let distance = delta.length();
    let combined = radii[a] + radii[b];
    if distance >= combined {
        return None;
    }
    let normal = if distance > 1e-4 {
        delta / distance
    } else {
        Vec2::X
    };
    Some(CollisionPair {
        index_a: a.min(b),
        index_b: a.max(b),
        overlap: combined - distance,
        normal: if a < b { normal } else { -normal },
    })
}

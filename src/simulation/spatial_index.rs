use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    concurrency::{par_iter_mut0, par_iter_mut1, par_iter_mut3},
    grid::UniformGrid,
    V3, V4,
};

/// Counting-sort spatial index over a [`UniformGrid`]. Rebuilt from scratch
/// every frame; nothing here persists across frames.
///
/// After [`build`] the three arrays satisfy:
/// - `cell_count[c]` = number of particles hashing to cell `c`,
///   with `sum(cell_count) == N`
/// - `cell_start` = exclusive prefix sum of `cell_count`
///   (length `num_cells + 1`, `cell_start[num_cells] == N`)
/// - `sorted_particle_id` is a permutation of `0..N` where particles of
///   cell `c` occupy `sorted_particle_id[cell_start[c]..cell_start[c+1]]`
///   in unspecified order
///
/// All atomic accesses use relaxed ordering: within a pass the counters
/// carry no cross-thread data dependencies, and the join at the end of each
/// parallel pass is the synchronization point between passes.
///
/// [`build`]: SpatialIndex::build
pub struct SpatialIndex {
    cell_count: Vec<AtomicU32>,
    write_cursor: Vec<AtomicU32>,
    cell_start: Vec<u32>,
    sorted_particle_id: Vec<AtomicU32>,
}

impl SpatialIndex {
    pub fn new(num_cells: usize, num_particles: usize) -> SpatialIndex {
        SpatialIndex {
            cell_count: (0..num_cells).map(|_| AtomicU32::new(0)).collect(),
            write_cursor: (0..num_cells).map(|_| AtomicU32::new(0)).collect(),
            cell_start: vec![0; num_cells + 1],
            sorted_particle_id: (0..num_particles).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn num_cells(&self) -> usize {
        self.cell_count.len()
    }

    /// Rebuilds the index for the given positions: clear, parallel atomic
    /// count, serial exclusive scan, parallel atomic scatter. Each particle
    /// claims a unique slot via `cell_start[cell] + write_cursor[cell]++`,
    /// so the permutation is valid under arbitrary thread interleaving.
    pub fn build(&mut self, grid: &UniformGrid, positions: &[V3]) {
        assert!(positions.len() == self.sorted_particle_id.len());
        assert!(grid.num_cells == self.cell_count.len());

        // clear
        par_iter_mut1(&mut self.cell_count, |_, count| {
            *count.get_mut() = 0;
        });
        par_iter_mut1(&mut self.write_cursor, |_, cursor| {
            *cursor.get_mut() = 0;
        });

        // count
        let cell_count = &self.cell_count;
        par_iter_mut0(positions.len(), |i| {
            let cell = grid.cell_index_of(positions[i]);
            cell_count[cell].fetch_add(1, Ordering::Relaxed);
        });

        // exclusive scan (serial; cell counts are modest next to N)
        self.cell_start[0] = 0;
        for c in 0..grid.num_cells {
            self.cell_start[c + 1] = self.cell_start[c] + self.cell_count[c].load(Ordering::Relaxed);
        }

        // scatter
        let cell_start = &self.cell_start;
        let write_cursor = &self.write_cursor;
        let sorted_particle_id = &self.sorted_particle_id;
        par_iter_mut0(positions.len(), |i| {
            let cell = grid.cell_index_of(positions[i]);
            let slot = cell_start[cell] + write_cursor[cell].fetch_add(1, Ordering::Relaxed);
            sorted_particle_id[slot as usize].store(i as u32, Ordering::Relaxed);
        });
    }

    pub fn cell_count(&self, cell: usize) -> u32 {
        self.cell_count[cell].load(Ordering::Relaxed)
    }

    pub fn cell_start(&self) -> &[u32] {
        &self.cell_start
    }

    /// Sorted-slot range of a cell; slot indices are the particle indices of
    /// the reordered arrays.
    pub fn cell_range(&self, cell: usize) -> Range<usize> {
        self.cell_start[cell] as usize..self.cell_start[cell + 1] as usize
    }

    /// Pre-sort particle id occupying the given sorted slot.
    pub fn sorted_id(&self, slot: usize) -> usize {
        self.sorted_particle_id[slot].load(Ordering::Relaxed) as usize
    }
}

/// Gathers position/velocity/color into sorted order: destination slot `k`
/// receives the attributes of the particle the counting sort placed there.
/// The reordered arrays are the source arrays every neighborhood stage of
/// this frame consumes.
pub fn reorder_particles(
    index: &SpatialIndex,
    position_src: &[V3],
    velocity_src: &[V3],
    color_src: &[V4],
    position_dst: &mut [V3],
    velocity_dst: &mut [V3],
    color_dst: &mut [V4],
) {
    par_iter_mut3(
        position_dst,
        velocity_dst,
        color_dst,
        |slot, p_position, p_velocity, p_color| {
            let id = index.sorted_id(slot);
            *p_position = position_src[id];
            *p_velocity = velocity_src[id];
            *p_color = color_src[id];
        },
    );
}

/// Visits every particle (by sorted index) in the 3x3x3 cell block around
/// `position`. Cells outside the grid are skipped, not wrapped. Candidates
/// are not distance-filtered here; callers apply the kernel support cutoff.
#[inline(always)]
pub fn for_each_neighbor_candidate(
    grid: &UniformGrid,
    index: &SpatialIndex,
    position: V3,
    mut f: impl FnMut(usize),
) {
    let center = grid.cell_coords_of(position);
    for dz in -1..=1 {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let coords = center + crate::vec3i(dx, dy, dz);
                if !grid.contains(coords) {
                    continue;
                }
                for j in index.cell_range(grid.flatten(coords)) {
                    f(j);
                }
            }
        }
    }
}

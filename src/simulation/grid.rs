use crate::{floating_type_mod::FT, vec3i, V3, V3I};

/// Uniform spatial decomposition of the simulation box. Pure configuration,
/// derived once per run: the cell size equals the kernel support radius so a
/// particle's neighbors are always inside the 3x3x3 cell block around it.
#[derive(Debug, Clone, Copy)]
pub struct UniformGrid {
    pub min: V3,
    pub cell_size: FT,
    pub dims: V3I,
    pub num_cells: usize,
}

impl UniformGrid {
    pub fn new(box_width: FT, box_height: FT, box_depth: FT, cell_size: FT) -> UniformGrid {
        debug_assert!(cell_size > 0.);

        let nx = (box_width / cell_size).ceil() as i32 + 1;
        let ny = (box_height / cell_size).ceil() as i32 + 1;
        let nz = (box_depth / cell_size).ceil() as i32 + 1;

        UniformGrid {
            min: crate::vec3f(-box_width * 0.5, -box_height * 0.5, -box_depth * 0.5),
            cell_size,
            dims: vec3i(nx, ny, nz),
            num_cells: (nx as usize) * (ny as usize) * (nz as usize),
        }
    }

    /// Integer cell coordinates of a position, clamped per axis into the
    /// grid. Particles that drift outside the box (numerical overshoot
    /// before the boundary response catches them) hash to a border cell
    /// instead of indexing out of bounds.
    pub fn cell_coords_of(&self, position: V3) -> V3I {
        let mut coords = vec3i(0, 0, 0);
        for d in 0..3 {
            let c = ((position[d] - self.min[d]) / self.cell_size).floor() as i32;
            coords[d] = c.clamp(0, self.dims[d] - 1);
        }
        coords
    }

    /// Flattened hash of in-range cell coordinates: `cx + nx*(cy + ny*cz)`.
    pub fn flatten(&self, coords: V3I) -> usize {
        debug_assert!(self.contains(coords));
        (coords[0] + self.dims[0] * (coords[1] + self.dims[1] * coords[2])) as usize
    }

    pub fn cell_index_of(&self, position: V3) -> usize {
        self.flatten(self.cell_coords_of(position))
    }

    pub fn contains(&self, coords: V3I) -> bool {
        (0..3).all(|d| coords[d] >= 0 && coords[d] < self.dims[d])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3f;

    #[test]
    fn dims_follow_box_and_cell_size() {
        // reference scene: 35x25x55 box, 30^3 lattice, h = 1.5 * spacing
        let h = 35. / 29. * 1.5;
        let grid = UniformGrid::new(35., 25., 55., h);
        assert_eq!(grid.dims[0], (35. / h as f64).ceil() as i32 + 1);
        assert_eq!(grid.dims[1], (25. / h as f64).ceil() as i32 + 1);
        assert_eq!(grid.dims[2], (55. / h as f64).ceil() as i32 + 1);
        assert_eq!(
            grid.num_cells,
            (grid.dims[0] * grid.dims[1] * grid.dims[2]) as usize
        );
    }

    #[test]
    fn hash_is_x_fastest() {
        let grid = UniformGrid::new(4., 4., 4., 1.);
        let nx = grid.dims[0];
        let ny = grid.dims[1];
        assert_eq!(grid.flatten(crate::vec3i(1, 0, 0)), 1);
        assert_eq!(grid.flatten(crate::vec3i(0, 1, 0)), nx as usize);
        assert_eq!(grid.flatten(crate::vec3i(0, 0, 1)), (nx * ny) as usize);
    }

    #[test]
    fn out_of_box_positions_clamp_to_border_cells() {
        let grid = UniformGrid::new(2., 2., 2., 0.5);

        let below = grid.cell_coords_of(vec3f(-100., -100., -100.));
        assert_eq!(below, crate::vec3i(0, 0, 0));

        let above = grid.cell_coords_of(vec3f(100., 100., 100.));
        for d in 0..3 {
            assert_eq!(above[d], grid.dims[d] - 1);
        }

        // every clamped coordinate flattens into a valid index
        assert!(grid.cell_index_of(vec3f(1e6, -1e6, 0.)) < grid.num_cells);
    }

    #[test]
    fn cell_index_is_deterministic() {
        let grid = UniformGrid::new(10., 10., 10., 1.);
        let p = vec3f(0.123, -3.456, 4.999);
        assert_eq!(grid.cell_index_of(p), grid.cell_index_of(p));
    }

    #[test]
    fn min_corner_is_centered_box() {
        let grid = UniformGrid::new(8., 6., 4., 1.);
        assert_eq!(grid.min, vec3f(-4., -3., -2.));
        // min corner maps to cell (0,0,0)
        assert_eq!(grid.cell_index_of(grid.min), 0);
    }
}

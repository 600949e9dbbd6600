use crate::{floating_type_mod::FT, grid::Grid, vec2f, V2};

#[inline]
fn lerp(a: FT, b: FT, t: FT) -> FT {
    a + t * (b - a)
}

/**
 * Bilinear interpolation of the staggered velocity field at a grid-space position.
 *
 * `u` lives at `(i+1, j+1/2)` and `v` at `(i+1/2, j+1)`, so each component is interpolated
 * between the two faces of the containing cell along its own axis and the faces of the
 * neighboring row/column that is closest to the position along the other axis.
 */
pub struct VelocityInterpolator<'a> {
    grid: &'a Grid,
}

impl<'a> VelocityInterpolator<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }

    /// Velocity in world units per time. The containing cell must hold liquid.
    pub fn find_velocity(&self, position: &V2) -> V2 {
        let grid = self.grid;
        let (i, j) = grid.cell_index_of(position);
        let status = grid.cell(i, j).status();
        assert!(
            !grid.cell(i, j).is_obstacle() && !grid.cell(i, j).is_empty(),
            "cannot interpolate velocity at ({}, {}) in a cell with status {}",
            position.x,
            position.y,
            status.as_str_lowercase()
        );

        let fx = position.x - i as FT;
        let fy = position.y - j as FT;

        // neighboring row/column on the side of the closest face center and the weight towards it
        let (j_off, ty) = if fy >= 0.5 { (j + 1, fy - 0.5) } else { (j - 1, 0.5 - fy) };
        let (i_off, tx) = if fx >= 0.5 { (i + 1, fx - 0.5) } else { (i - 1, 0.5 - fx) };

        let u = lerp(
            lerp(grid.u(i - 1, j), grid.u(i, j), fx),
            lerp(grid.u(i - 1, j_off), grid.u(i, j_off), fx),
            ty,
        );
        let v = lerp(
            lerp(grid.v(i, j - 1), grid.v(i, j), fy),
            lerp(grid.v(i_off, j - 1), grid.v(i_off, j), fy),
            tx,
        );

        vec2f(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::VelocityInterpolator;
    use crate::{assert_ft_approx_eq, cell::CellStatus, floating_type_mod::FT, grid::Grid, vec2f};

    fn liquid_grid(x_dim: usize, y_dim: usize) -> Grid {
        let mut grid = Grid::new(x_dim, y_dim, 1.);
        let interior: Vec<_> = grid.interior_cells().collect();
        for (i, j) in interior {
            grid.set_status(i, j, CellStatus::Full);
        }
        grid
    }

    fn sample_positions() -> Vec<(FT, FT)> {
        let mut positions = Vec::new();
        for &x in &[1.0, 1.25, 1.5, 2.01, 2.49, 2.5, 2.99, 3.7] {
            for &y in &[1.0, 1.1, 1.5, 2.3, 2.75, 3.999] {
                positions.push((x, y));
            }
        }
        positions
    }

    #[test]
    fn uniform_field_is_reproduced_exactly() {
        let mut grid = liquid_grid(6, 6);
        grid.initialize_uniform_velocity(0.37, -1.3);
        let interpolator = VelocityInterpolator::new(&grid);
        for (x, y) in sample_positions() {
            let velocity = interpolator.find_velocity(&vec2f(x, y));
            assert_eq!(velocity, vec2f(0.37, -1.3), "at ({}, {})", x, y);
        }
    }

    #[test]
    fn linear_field_is_reproduced() {
        let mut grid = liquid_grid(6, 6);
        // u on the face x = i + 1 equals x, v on the face y = j + 1 equals 2y
        for i in 0..6 {
            for j in 0..6 {
                grid.initialize_velocity(i, j, (i + 1) as FT, 2. * (j + 1) as FT);
            }
        }
        let interpolator = VelocityInterpolator::new(&grid);
        for (x, y) in sample_positions() {
            let velocity = interpolator.find_velocity(&vec2f(x, y));
            assert_ft_approx_eq(velocity.x, x, 1e-12, || format!("u at ({}, {})", x, y));
            assert_ft_approx_eq(velocity.y, 2. * y, 1e-12, || format!("v at ({}, {})", x, y));
        }
    }

    #[test]
    fn closest_row_is_used() {
        let mut grid = liquid_grid(6, 6);
        grid.set_u(2, 3, 1.);
        let interpolator = VelocityInterpolator::new(&grid);

        // on the right face of cell (2, 2), a quarter cell below the center of the row above
        assert_ft_approx_eq(interpolator.find_velocity(&vec2f(3., 2.75)).x, 0.25, 1e-12, || "upper half".to_string());
        // the lower half of the cell never sees the row above
        assert_eq!(interpolator.find_velocity(&vec2f(3., 2.25)).x, 0.);
    }

    #[test]
    #[should_panic]
    fn empty_cell_is_rejected() {
        let mut grid = liquid_grid(6, 6);
        grid.set_status(2, 2, CellStatus::Empty);
        VelocityInterpolator::new(&grid).find_velocity(&vec2f(2.5, 2.5));
    }
}

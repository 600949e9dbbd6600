use crate::{
    cell::{CellStatus, ATMOSPHERIC_PRESSURE},
    floating_type_mod::FT,
    grid::Grid,
};

/// Faces of a cell, `left`/`bottom` are shared with the left/bottom neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Faces {
    left: FT,
    right: FT,
    bottom: FT,
    top: FT,
}

/**
 * Velocities and pressures of liquid cells next to empty space. These cells are skipped by the
 * pressure iteration, so their faces towards empty neighbors are derived from the faces towards the
 * liquid such that the cell divergence stays zero. Faces towards liquid or obstacles are never changed.
 *
 * Faces that border empty space on both sides of an axis only feel gravity.
 */
#[derive(Debug, Clone, Default)]
pub struct SurfaceVelocityUpdater {}

impl SurfaceVelocityUpdater {
    pub fn new() -> Self {
        Self {}
    }

    pub fn update_surface_velocity(&self, grid: &mut Grid, dt: FT, gravity: FT) {
        let surface_cells: Vec<(usize, usize)> = grid
            .interior_cells()
            .filter(|&(i, j)| matches!(grid.cell(i, j).status(), CellStatus::Surface | CellStatus::Isolated))
            .collect();

        for (i, j) in surface_cells {
            grid.cell_mut(i, j).set_pressure(ATMOSPHERIC_PRESSURE);

            let neighbors = grid.neighbors(i, j);
            let empty = (
                neighbors.left.is_empty(),
                neighbors.right.is_empty(),
                neighbors.bottom.is_empty(),
                neighbors.top.is_empty(),
            );

            let faces = Faces {
                left: grid.u(i - 1, j),
                right: grid.u(i, j),
                bottom: grid.v(i, j - 1),
                top: grid.v(i, j),
            };
            let new_faces = Self::extrapolate(faces, empty, dt * gravity);

            grid.set_u(i - 1, j, new_faces.left);
            grid.set_u(i, j, new_faces.right);
            grid.set_v(i, j - 1, new_faces.bottom);
            grid.set_v(i, j, new_faces.top);
        }
    }

    /// `empty` is `(left, right, bottom, top)`, `dv` the velocity gained by falling for one time step.
    fn extrapolate(f: Faces, empty: (bool, bool, bool, bool), dv: FT) -> Faces {
        let Faces {
            left,
            right,
            bottom,
            top,
        } = f;

        // outflow along each axis, the cell divergence times h
        let div_x = right - left;
        let div_y = top - bottom;

        match empty {
            // enclosed by liquid and walls
            (false, false, false, false) => f,

            // one empty neighbor: that face balances the other three
            (false, true, false, false) => Faces { right: left - div_y, ..f },
            (true, false, false, false) => Faces { left: right + div_y, ..f },
            (false, false, false, true) => Faces { top: bottom - div_x, ..f },
            (false, false, true, false) => Faces { bottom: top + div_x, ..f },

            // two adjacent empty neighbors: each empty face copies its opposite face
            (false, true, false, true) => Faces {
                right: left,
                top: bottom,
                ..f
            },
            (true, false, false, true) => Faces {
                left: right,
                top: bottom,
                ..f
            },
            (false, true, true, false) => Faces {
                right: left,
                bottom: top,
                ..f
            },
            (true, false, true, false) => Faces {
                left: right,
                bottom: top,
                ..f
            },

            // two opposite empty neighbors: the free pair absorbs the outflow of the other axis
            (true, true, false, false) => {
                let mean = 0.5 * (left + right);
                Faces {
                    left: mean + 0.5 * div_y,
                    right: mean - 0.5 * div_y,
                    ..f
                }
            }
            (false, false, true, true) => {
                let mean = 0.5 * (bottom + top) + dv;
                Faces {
                    bottom: mean + 0.5 * div_x,
                    top: mean - 0.5 * div_x,
                    ..f
                }
            }

            // three empty neighbors: the face opposite the liquid balances the rest
            (true, true, false, true) => Faces { top: bottom - div_x, ..f },
            (true, true, true, false) => Faces { bottom: top + div_x, ..f },
            (false, true, true, true) => {
                let (bottom, top) = (bottom + dv, top + dv);
                Faces {
                    bottom,
                    top,
                    right: left - (top - bottom),
                    ..f
                }
            }
            (true, false, true, true) => {
                let (bottom, top) = (bottom + dv, top + dv);
                Faces {
                    bottom,
                    top,
                    left: right + (top - bottom),
                    ..f
                }
            }

            // isolated drop, ballistic
            (true, true, true, true) => Faces {
                bottom: bottom + dv,
                top: top + dv,
                ..f
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SurfaceVelocityUpdater;
    use crate::{
        assert_ft_approx_eq,
        cell::{CellStatus, ATMOSPHERIC_PRESSURE},
        floating_type_mod::FT,
        grid::Grid,
    };

    /// 7x7 grid, every interior cell is liquid except the listed empty ones. Cell (3, 3) is the surface cell under test.
    fn grid_with_empty_cells(empty: &[(usize, usize)]) -> Grid {
        let mut grid = Grid::new(7, 7, 1.);
        let interior: Vec<_> = grid.interior_cells().collect();
        for (i, j) in interior {
            let status = if empty.contains(&(i, j)) {
                CellStatus::Empty
            } else {
                CellStatus::Full
            };
            grid.set_status(i, j, status);
        }
        grid.set_status(3, 3, CellStatus::Surface);
        grid
    }

    fn set_faces(grid: &mut Grid, left: FT, right: FT, bottom: FT, top: FT) {
        grid.set_u(2, 3, left);
        grid.set_u(3, 3, right);
        grid.set_v(3, 2, bottom);
        grid.set_v(3, 3, top);
    }

    fn assert_divergence_free(grid: &Grid) {
        assert_ft_approx_eq(grid.divergence(3, 3), 0., 1e-12, || "divergence of (3, 3)".to_string());
    }

    #[test]
    fn sets_atmospheric_pressure() {
        let mut grid = grid_with_empty_cells(&[(4, 3)]);
        grid.cell_mut(3, 3).set_pressure(7.);
        grid.cell_mut(2, 3).set_pressure(7.);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
        assert_eq!(grid.cell(3, 3).pressure(), ATMOSPHERIC_PRESSURE);
        // full cells keep their pressure
        assert_eq!(grid.cell(2, 3).pressure(), 7.);
    }

    #[test]
    fn single_empty_neighbor_balances_divergence() {
        for empty in [(2, 3), (4, 3), (3, 2), (3, 4)] {
            let mut grid = grid_with_empty_cells(&[empty]);
            set_faces(&mut grid, 0.3, 0.1, -0.2, 0.4);
            SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
            assert_divergence_free(&grid);
        }

        let mut grid = grid_with_empty_cells(&[(4, 3)]);
        set_faces(&mut grid, 0.3, 0.1, -0.2, 0.4);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
        assert_ft_approx_eq(grid.u(3, 3), -0.3, 1e-12, || "right face".to_string());
        assert_eq!(grid.u(2, 3), 0.3);
        assert_eq!(grid.v(3, 2), -0.2);
        assert_eq!(grid.v(3, 3), 0.4);
    }

    #[test]
    fn adjacent_empty_neighbors_copy_opposite_faces() {
        let mut grid = grid_with_empty_cells(&[(4, 3), (3, 4)]);
        set_faces(&mut grid, 0.3, 0.1, -0.2, 0.4);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
        assert_eq!(grid.u(3, 3), 0.3);
        assert_eq!(grid.v(3, 3), -0.2);
        assert_divergence_free(&grid);

        let mut grid = grid_with_empty_cells(&[(2, 3), (3, 2)]);
        set_faces(&mut grid, 0.3, 0.1, -0.2, 0.4);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
        assert_eq!(grid.u(2, 3), 0.1);
        assert_eq!(grid.v(3, 2), 0.4);
        assert_divergence_free(&grid);
    }

    #[test]
    fn opposite_empty_neighbors_fall_and_balance() {
        let mut grid = grid_with_empty_cells(&[(3, 2), (3, 4)]);
        set_faces(&mut grid, 0.1, 0.3, 0., 0.);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -10.);
        // mean of -1 from gravity, the x outflow of 0.2 is split between both faces
        assert_ft_approx_eq(grid.v(3, 2), -0.9, 1e-12, || "bottom face".to_string());
        assert_ft_approx_eq(grid.v(3, 3), -1.1, 1e-12, || "top face".to_string());
        assert_divergence_free(&grid);

        let mut grid = grid_with_empty_cells(&[(2, 3), (4, 3)]);
        set_faces(&mut grid, 0.5, 0.5, 0.2, 0.6);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -10.);
        assert_ft_approx_eq(grid.u(2, 3), 0.7, 1e-12, || "left face".to_string());
        assert_ft_approx_eq(grid.u(3, 3), 0.3, 1e-12, || "right face".to_string());
        assert_divergence_free(&grid);
    }

    #[test]
    fn three_empty_neighbors() {
        for empty in [
            [(2, 3), (4, 3), (3, 4)],
            [(2, 3), (4, 3), (3, 2)],
            [(4, 3), (3, 2), (3, 4)],
            [(2, 3), (3, 2), (3, 4)],
        ] {
            let mut grid = grid_with_empty_cells(&empty);
            set_faces(&mut grid, 0.3, 0.1, -0.2, 0.4);
            SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
            assert_divergence_free(&grid);
        }

        // liquid below: the top face balances
        let mut grid = grid_with_empty_cells(&[(2, 3), (4, 3), (3, 4)]);
        set_faces(&mut grid, 0.3, 0.1, -0.2, 0.4);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
        assert_eq!(grid.v(3, 2), -0.2);
        assert_ft_approx_eq(grid.v(3, 3), 0., 1e-12, || "top face".to_string());
    }

    #[test]
    fn isolated_drop_is_ballistic() {
        let mut grid = grid_with_empty_cells(&[(2, 3), (4, 3), (3, 2), (3, 4)]);
        grid.set_status(3, 3, CellStatus::Isolated);
        set_faces(&mut grid, 0.3, 0.3, 0.5, 0.5);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -10.);
        assert_eq!(grid.u(2, 3), 0.3);
        assert_eq!(grid.u(3, 3), 0.3);
        assert_ft_approx_eq(grid.v(3, 2), -0.5, 1e-12, || "bottom face".to_string());
        assert_ft_approx_eq(grid.v(3, 3), -0.5, 1e-12, || "top face".to_string());
    }

    #[test]
    fn obstacle_faces_are_kept() {
        let mut grid = grid_with_empty_cells(&[(3, 4)]);
        grid.set_obstacle(4, 3);
        set_faces(&mut grid, 0.3, 0., -0.2, 0.4);
        SurfaceVelocityUpdater::new().update_surface_velocity(&mut grid, 0.1, -9.81);
        assert_eq!(grid.u(3, 3), 0.);
        assert_ft_approx_eq(grid.v(3, 3), 0.1, 1e-12, || "top face".to_string());
    }
}

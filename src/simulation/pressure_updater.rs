use serde::{Deserialize, Serialize};

use crate::{floating_type_mod::FT, grid::Grid};

/// Outcome of one pressure iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureSolveStats {
    /// number of full sweeps over the liquid
    pub iterations: usize,
    /// largest |divergence| seen in the last sweep, measured before each cell was corrected
    pub max_divergence: FT,
    pub converged: bool,
}

/**
 * Gauss-Seidel style relaxation driving the divergence of every full cell towards zero.
 *
 * Each visit computes the cell divergence `D`, the pressure increment `-beta * D` with
 * `beta = b0 / (2 dt (1/dx^2 + 1/dy^2))`, and pushes the four faces of the cell by
 * `dt/h` times that increment. Corrections are visible to the next cell within the same sweep.
 * `b0` in `[1, 2]` is the over-relaxation factor.
 */
#[derive(Debug, Clone)]
pub struct PressureUpdater {
    pub b0: FT,
    pub max_iterations: usize,
    pub max_divergence: FT,
}

impl PressureUpdater {
    pub fn new(b0: FT, max_iterations: usize, max_divergence: FT) -> Self {
        assert!(max_iterations > 0, "at least one pressure sweep is required");
        Self {
            b0,
            max_iterations,
            max_divergence,
        }
    }

    pub fn update_pressure(&self, grid: &mut Grid, dt: FT) -> PressureSolveStats {
        let full_cells: Vec<(usize, usize)> = grid.interior_cells().filter(|&(i, j)| grid.cell(i, j).is_full()).collect();

        let mut iterations = 0;
        loop {
            let max_divergence = self.sweep(grid, &full_cells, dt);
            iterations += 1;

            if max_divergence < self.max_divergence {
                return PressureSolveStats {
                    iterations,
                    max_divergence,
                    converged: true,
                };
            }
            if iterations >= self.max_iterations {
                return PressureSolveStats {
                    iterations,
                    max_divergence,
                    converged: false,
                };
            }
        }
    }

    fn sweep(&self, grid: &mut Grid, full_cells: &[(usize, usize)], dt: FT) -> FT {
        let dx = grid.cell_size();
        let dy = grid.cell_size();
        let dx_sq = dx * dx;
        let dy_sq = dy * dy;
        let beta = self.b0 / (2. * dt * (1. / dx_sq + 1. / dy_sq));

        let mut max_divergence: FT = 0.;
        for &(i, j) in full_cells {
            let divergence = grid.divergence(i, j);
            max_divergence = max_divergence.max(divergence.abs());

            let delta_p = -beta * divergence;
            grid.set_u(i, j, grid.u(i, j) + dt / dx * delta_p);
            grid.set_u(i - 1, j, grid.u(i - 1, j) - dt / dx * delta_p);
            grid.set_v(i, j, grid.v(i, j) + dt / dy * delta_p);
            grid.set_v(i, j - 1, grid.v(i, j - 1) - dt / dy * delta_p);

            let cell = grid.cell_mut(i, j);
            let pressure = cell.pressure();
            cell.set_pressure(pressure + delta_p);
        }
        max_divergence
    }
}

#[cfg(test)]
mod tests {
    use super::PressureUpdater;
    use crate::{assert_ft_approx_eq, cell::CellStatus, floating_type_mod::FT, grid::Grid};

    /// Unit velocity everywhere except the faces of the single full cell (2, 2), which are perturbed by
    /// +-0.01 so that the cell has a divergence of 0.04 to relax.
    fn perturbed_uniform_grid() -> Grid {
        let mut grid = Grid::new(5, 5, 1.);
        grid.initialize_uniform_velocity(1., 1.);
        grid.initialize_velocity(2, 2, 1.01, 1.01);
        grid.set_u(1, 2, 0.99);
        grid.set_v(2, 1, 0.99);
        grid.set_status(2, 2, CellStatus::Full);
        grid
    }

    /// Radial outflow `(i - 2, j - 2)` with all 3x3 interior cells full.
    fn radial_grid() -> Grid {
        let mut grid = Grid::new(5, 5, 1.);
        for i in 0..5 {
            for j in 0..5 {
                grid.initialize_velocity(i, j, i as FT - 2., j as FT - 2.);
            }
        }
        let interior: Vec<_> = grid.interior_cells().collect();
        for (i, j) in interior {
            grid.set_status(i, j, CellStatus::Full);
        }
        grid
    }

    #[test]
    fn uniform_flow_needs_a_single_sweep() {
        let mut grid = Grid::new(5, 5, 1.);
        grid.initialize_uniform_velocity(1., 1.);
        grid.set_status(2, 2, CellStatus::Full);
        let stats = PressureUpdater::new(1., 100, 1e-6).update_pressure(&mut grid, 0.1);

        assert!(stats.converged);
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.max_divergence, 0.);
        assert_eq!(grid.cell(2, 2).pressure(), 0.);
        assert_eq!(grid.u(2, 2), 1.);
        assert_eq!(grid.v(2, 2), 1.);
    }

    #[test]
    fn perturbed_uniform_flow_is_relaxed() {
        let mut grid = perturbed_uniform_grid();
        let stats = PressureUpdater::new(1., 100, 1e-6).update_pressure(&mut grid, 0.1);

        assert!(stats.converged);
        assert_eq!(stats.iterations, 2);
        assert_eq!(stats.max_divergence, 0.);
        assert_ft_approx_eq(grid.cell(2, 2).pressure(), 0.9, 1e-12, || "pressure".to_string());
        assert_ft_approx_eq(grid.u(1, 2), 1., 1e-12, || "left face".to_string());
        assert_ft_approx_eq(grid.u(2, 2), 1., 1e-12, || "right face".to_string());
        assert_ft_approx_eq(grid.v(2, 1), 1., 1e-12, || "bottom face".to_string());
        assert_ft_approx_eq(grid.v(2, 2), 1., 1e-12, || "top face".to_string());
        assert_eq!(grid.divergence(2, 2), 0.);
    }

    #[test]
    fn iteration_cap_stops_unconverged_solve() {
        let mut grid = radial_grid();
        let stats = PressureUpdater::new(1., 10, 1e-4).update_pressure(&mut grid, 0.1);

        assert!(!stats.converged);
        assert_eq!(stats.iterations, 10);
        assert_ft_approx_eq(stats.max_divergence, 0.01220703125, 1e-9, || "max divergence".to_string());
        assert_ft_approx_eq(grid.cell(2, 2).pressure(), -21.469482421875, 1e-9, || "center".to_string());
        assert_ft_approx_eq(grid.cell(1, 1).pressure(), -12.71948266401887, 1e-9, || "corner (1, 1)".to_string());
        assert_ft_approx_eq(grid.cell(3, 3).pressure(), -12.742370601685252, 1e-9, || "corner (3, 3)".to_string());
    }

    #[test]
    fn radial_outflow_converges_with_enough_sweeps() {
        let mut grid = radial_grid();
        let stats = PressureUpdater::new(1., 100, 1e-4).update_pressure(&mut grid, 0.1);

        assert!(stats.converged);
        assert!(stats.iterations > 10 && stats.iterations < 100);
        for (i, j) in grid.interior_cells() {
            assert!(grid.divergence(i, j).abs() < 1e-3, "divergence of ({}, {})", i, j);
        }
        // the outflow is balanced by suction in the middle
        assert!(grid.cell(2, 2).pressure() < grid.cell(1, 2).pressure());
    }

    #[test]
    fn non_full_cells_are_untouched() {
        let mut grid = perturbed_uniform_grid();
        grid.set_status(2, 2, CellStatus::Surface);
        let before = grid.clone();
        let stats = PressureUpdater::new(1.7, 100, 1e-6).update_pressure(&mut grid, 0.1);

        // nothing to relax, the single sweep sees no divergence
        assert!(stats.converged);
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.max_divergence, 0.);
        assert_eq!(grid.cell(2, 2).pressure(), before.cell(2, 2).pressure());
        assert_eq!(grid.u(2, 2), before.u(2, 2));
    }

    #[test]
    fn over_relaxation_still_converges() {
        let mut grid = radial_grid();
        let stats = PressureUpdater::new(1.7, 200, 1e-6).update_pressure(&mut grid, 0.1);
        assert!(stats.converged);
    }
}

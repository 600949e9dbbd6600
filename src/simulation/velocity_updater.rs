use crate::{cell::CellVelocity, floating_type_mod::FT, grid::Grid};

/**
 * Tilde velocities: the momentum equation (advection, body force, pressure gradient and viscous diffusion)
 * integrated for one time step, before the pressure iteration restores mass conservation.
 *
 * Only full cells are updated, everything else is passed through. All cells read the current generation
 * and write the next one, which is committed for the whole grid afterwards.
 */
#[derive(Debug, Clone)]
pub struct VelocityUpdater {
    pub viscosity: FT,
}

impl VelocityUpdater {
    pub fn new(viscosity: FT) -> Self {
        Self { viscosity }
    }

    pub fn update_velocity(&self, grid: &mut Grid, dt: FT, gravity: FT) {
        for i in 0..grid.x_dim() {
            for j in 0..grid.y_dim() {
                if grid.is_border(i, j) || !grid.cell(i, j).is_full() {
                    grid.pass_velocity_through(i, j);
                    continue;
                }

                let current = grid.velocity(i, j);
                let neighbors = grid.neighbors(i, j);

                // no flux into solids
                let u = if neighbors.right.is_obstacle() {
                    current.u
                } else {
                    self.tilde_u(grid, i, j, dt, 0.)
                };
                let v = if neighbors.top.is_obstacle() {
                    current.v
                } else {
                    self.tilde_v(grid, i, j, dt, gravity)
                };

                assert!(
                    u.is_finite() && v.is_finite(),
                    "tilde velocity of cell ({}, {}) is not finite: ({}, {})",
                    i,
                    j,
                    u,
                    v
                );
                grid.set_next_velocity(i, j, CellVelocity::new(u, v));
            }
        }

        grid.swap_velocities();
    }

    /// u on the face (i+1/2, j)
    fn tilde_u(&self, grid: &Grid, i: usize, j: usize, dt: FT, force_x: FT) -> FT {
        let dx = grid.cell_size();
        let dy = grid.cell_size();
        let dx_sq = dx * dx;
        let dy_sq = dy * dy;

        let u = grid.u(i, j);

        // u at the centers of cell (i, j) and (i+1, j)
        let u_center_left = 0.5 * (grid.u(i - 1, j) + u);
        let u_center_right = 0.5 * (u + grid.u(i + 1, j));

        // uv at the corners (i+1/2, j+1/2) and (i+1/2, j-1/2)
        let uv_top = 0.5 * (u + grid.u(i, j + 1)) * 0.5 * (grid.v(i, j) + grid.v(i + 1, j));
        let uv_bottom = 0.5 * (grid.u(i, j - 1) + u) * 0.5 * (grid.v(i, j - 1) + grid.v(i + 1, j - 1));

        let advection = (u_center_left * u_center_left - u_center_right * u_center_right) / dx + (uv_bottom - uv_top) / dy;
        let pressure = (grid.cell(i, j).pressure() - grid.cell(i + 1, j).pressure()) / dx;
        let diffusion = self.viscosity
            * ((grid.u(i + 1, j) - 2. * u + grid.u(i - 1, j)) / dx_sq
                + (grid.u(i, j + 1) - 2. * u + grid.u(i, j - 1)) / dy_sq);

        u + dt * (advection + force_x + pressure + diffusion)
    }

    /// v on the face (i, j+1/2)
    fn tilde_v(&self, grid: &Grid, i: usize, j: usize, dt: FT, force_y: FT) -> FT {
        let dx = grid.cell_size();
        let dy = grid.cell_size();
        let dx_sq = dx * dx;
        let dy_sq = dy * dy;

        let v = grid.v(i, j);

        // v at the centers of cell (i, j) and (i, j+1)
        let v_center_bottom = 0.5 * (grid.v(i, j - 1) + v);
        let v_center_top = 0.5 * (v + grid.v(i, j + 1));

        // uv at the corners (i+1/2, j+1/2) and (i-1/2, j+1/2)
        let uv_right = 0.5 * (grid.u(i, j) + grid.u(i, j + 1)) * 0.5 * (v + grid.v(i + 1, j));
        let uv_left = 0.5 * (grid.u(i - 1, j) + grid.u(i - 1, j + 1)) * 0.5 * (grid.v(i - 1, j) + v);

        let advection = (uv_left - uv_right) / dx + (v_center_bottom * v_center_bottom - v_center_top * v_center_top) / dy;
        let pressure = (grid.cell(i, j).pressure() - grid.cell(i, j + 1).pressure()) / dy;
        let diffusion = self.viscosity
            * ((grid.v(i + 1, j) - 2. * v + grid.v(i - 1, j)) / dx_sq
                + (grid.v(i, j + 1) - 2. * v + grid.v(i, j - 1)) / dy_sq);

        v + dt * (advection + force_y + pressure + diffusion)
    }
}

use std::mem;

use crate::{
    cell::{Cell, CellStatus, CellVelocity},
    floating_type_mod::FT,
    V2,
};

/**
 * The four axis-adjacent cells of a cell. Built on demand, never stored.
 *
 * Neighbors outside of the grid are replaced by the cell itself. This only happens for
 * border cells, which are obstacles.
 */
pub struct CellNeighbors<'a> {
    pub left: &'a Cell,
    pub right: &'a Cell,
    pub bottom: &'a Cell,
    pub top: &'a Cell,
}

impl<'a> CellNeighbors<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Cell> {
        [self.left, self.right, self.bottom, self.top].into_iter()
    }

    pub fn all_have_particles(&self) -> bool {
        self.iter().all(|c| c.has_particles())
    }

    pub fn none_have_particles(&self) -> bool {
        self.iter().all(|c| !c.has_particles())
    }

    pub fn num_with_particles(&self) -> usize {
        self.iter().filter(|c| c.has_particles()).count()
    }
}

/**
 * Staggered (MAC) grid of `x_dim * y_dim` cells. Cell `(i, j)` covers `[i, i+1) x [j, j+1)` in
 * grid coordinates, so a world position is `grid position * cell_size`.
 *
 * The outermost ring of cells is always an obstacle.
 *
 * Velocities are double buffered: `velocity` is read by the update passes while `velocity_next`
 * is written, then both buffers are swapped for the whole grid at once.
 */
#[derive(Debug, Clone)]
pub struct Grid {
    x_dim: usize,
    y_dim: usize,
    cell_size: FT,
    cells: Vec<Cell>,
    velocity: Vec<CellVelocity>,
    velocity_next: Vec<CellVelocity>,
}

impl Grid {
    pub fn new(x_dim: usize, y_dim: usize, cell_size: FT) -> Self {
        assert!(x_dim >= 3, "x_dim must be >= 3 (got {})", x_dim);
        assert!(y_dim >= 3, "y_dim must be >= 3 (got {})", y_dim);
        assert!(cell_size > 0., "cell_size must be > 0");

        let num_cells = x_dim * y_dim;
        let mut grid = Self {
            x_dim,
            y_dim,
            cell_size,
            cells: (0..num_cells).map(|_| Cell::new()).collect(),
            velocity: vec![CellVelocity::zero(); num_cells],
            velocity_next: vec![CellVelocity::zero(); num_cells],
        };
        grid.set_boundaries();
        grid
    }

    pub fn x_dim(&self) -> usize {
        self.x_dim
    }

    pub fn y_dim(&self) -> usize {
        self.y_dim
    }

    pub fn cell_size(&self) -> FT {
        self.cell_size
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.x_dim && j < self.y_dim, "cell ({}, {}) out of bounds", i, j);
        j * self.x_dim + i
    }

    pub fn is_border(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i == self.x_dim - 1 || j == self.y_dim - 1
    }

    /// All cells except the border ring, column by column.
    pub fn interior_cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let y_dim = self.y_dim;
        (1..self.x_dim - 1).flat_map(move |i| (1..y_dim - 1).map(move |j| (i, j)))
    }

    pub fn cell(&self, i: usize, j: usize) -> &Cell {
        &self.cells[self.idx(i, j)]
    }

    pub fn cell_mut(&mut self, i: usize, j: usize) -> &mut Cell {
        let idx = self.idx(i, j);
        &mut self.cells[idx]
    }

    pub fn neighbors(&self, i: usize, j: usize) -> CellNeighbors<'_> {
        CellNeighbors {
            left: self.cell(i.saturating_sub(1), j),
            right: self.cell((i + 1).min(self.x_dim - 1), j),
            bottom: self.cell(i, j.saturating_sub(1)),
            top: self.cell(i, (j + 1).min(self.y_dim - 1)),
        }
    }

    pub fn set_status(&mut self, i: usize, j: usize, status: CellStatus) {
        self.cell_mut(i, j).set_status(status);
    }

    pub fn set_obstacle(&mut self, i: usize, j: usize) {
        self.cell_mut(i, j).set_obstacle();
    }

    pub fn velocity(&self, i: usize, j: usize) -> CellVelocity {
        self.velocity[self.idx(i, j)]
    }

    /// Velocity on the right face of cell `(i, j)`.
    #[inline]
    pub fn u(&self, i: usize, j: usize) -> FT {
        self.velocity[self.idx(i, j)].u
    }

    /// Velocity on the top face of cell `(i, j)`.
    #[inline]
    pub fn v(&self, i: usize, j: usize) -> FT {
        self.velocity[self.idx(i, j)].v
    }

    pub fn set_u(&mut self, i: usize, j: usize, u: FT) {
        let idx = self.idx(i, j);
        self.velocity[idx].u = u;
    }

    pub fn set_v(&mut self, i: usize, j: usize, v: FT) {
        let idx = self.idx(i, j);
        self.velocity[idx].v = v;
    }

    /// Sets both buffers, so the value survives the next swap even if the cell is not updated.
    pub fn initialize_velocity(&mut self, i: usize, j: usize, u: FT, v: FT) {
        let idx = self.idx(i, j);
        self.velocity[idx] = CellVelocity::new(u, v);
        self.velocity_next[idx] = CellVelocity::new(u, v);
    }

    pub fn initialize_uniform_velocity(&mut self, u: FT, v: FT) {
        self.velocity.fill(CellVelocity::new(u, v));
        self.velocity_next.fill(CellVelocity::new(u, v));
    }

    pub fn set_next_velocity(&mut self, i: usize, j: usize, velocity: CellVelocity) {
        let idx = self.idx(i, j);
        self.velocity_next[idx] = velocity;
    }

    /// Carries the current velocity unchanged into the next generation.
    pub fn pass_velocity_through(&mut self, i: usize, j: usize) {
        let idx = self.idx(i, j);
        self.velocity_next[idx] = self.velocity[idx];
    }

    /// Commits the next generation for the whole grid.
    pub fn swap_velocities(&mut self) {
        mem::swap(&mut self.velocity, &mut self.velocity_next);
    }

    /// Net outflow of cell `(i, j)` per unit time.
    pub fn divergence(&self, i: usize, j: usize) -> FT {
        let dx = self.cell_size;
        let dy = self.cell_size;
        (self.u(i, j) - self.u(i - 1, j)) / dx + (self.v(i, j) - self.v(i, j - 1)) / dy
    }

    /// Forces the outermost ring of cells to be obstacles. Idempotent.
    pub fn set_boundaries(&mut self) {
        for i in 0..self.x_dim {
            self.set_obstacle(i, 0);
            self.set_obstacle(i, self.y_dim - 1);
        }
        for j in 0..self.y_dim {
            self.set_obstacle(0, j);
            self.set_obstacle(self.x_dim - 1, j);
        }
    }

    /**
     * Reclassifies every non-obstacle cell from its own particle count and the particle counts of its
     * four neighbors. The classification only reads particle counts, so updating in place is safe.
     */
    pub fn update_cell_status(&mut self) {
        let new_statuses: Vec<(usize, usize, CellStatus)> = self
            .interior_cells()
            .filter(|&(i, j)| !self.cell(i, j).is_obstacle())
            .map(|(i, j)| {
                let cell = self.cell(i, j);
                let neighbors = self.neighbors(i, j);
                let status = if !cell.has_particles() {
                    CellStatus::Empty
                } else if neighbors.all_have_particles() {
                    CellStatus::Full
                } else if neighbors.none_have_particles() {
                    CellStatus::Isolated
                } else {
                    CellStatus::Surface
                };
                (i, j, status)
            })
            .collect();

        for (i, j, status) in new_statuses {
            self.set_status(i, j, status);
        }
    }

    /**
     * Free-slip walls: border cells copy pressure and the tangential velocity of the adjacent interior cell,
     * the velocity through the wall face is zeroed. Faces of interior obstacles are zeroed as well.
     */
    pub fn set_boundary_constraints(&mut self) {
        let (nx, ny) = (self.x_dim, self.y_dim);

        for j in 1..ny - 1 {
            let p = self.cell(1, j).pressure();
            self.cell_mut(0, j).set_pressure(p);
            self.set_v(0, j, self.v(1, j));
            self.set_u(0, j, 0.);

            let p = self.cell(nx - 2, j).pressure();
            self.cell_mut(nx - 1, j).set_pressure(p);
            self.set_v(nx - 1, j, self.v(nx - 2, j));
            self.set_u(nx - 2, j, 0.);
            self.set_u(nx - 1, j, 0.);
        }

        for i in 1..nx - 1 {
            let p = self.cell(i, 1).pressure();
            self.cell_mut(i, 0).set_pressure(p);
            self.set_u(i, 0, self.u(i, 1));
            self.set_v(i, 0, 0.);

            let p = self.cell(i, ny - 2).pressure();
            self.cell_mut(i, ny - 1).set_pressure(p);
            self.set_u(i, ny - 1, self.u(i, ny - 2));
            self.set_v(i, ny - 2, 0.);
            self.set_v(i, ny - 1, 0.);
        }

        let walls: Vec<(usize, usize)> = self
            .interior_cells()
            .filter(|&(i, j)| self.cell(i, j).is_obstacle())
            .collect();
        for (i, j) in walls {
            self.set_u(i, j, 0.);
            self.set_u(i - 1, j, 0.);
            self.set_v(i, j, 0.);
            self.set_v(i, j - 1, 0.);
        }
    }

    /// Cell containing a grid-space position, clamped to the grid.
    pub fn cell_index_of(&self, position: &V2) -> (usize, usize) {
        let max_i = (self.x_dim - 1) as FT;
        let max_j = (self.y_dim - 1) as FT;
        let i = position.x.floor().max(0.).min(max_i) as usize;
        let j = position.y.floor().max(0.).min(max_j) as usize;
        (i, j)
    }

    pub fn total_particle_count(&self) -> u64 {
        self.cells.iter().map(|c| c.num_particles() as u64).sum()
    }

    pub fn count_cells_with_status(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status() == status).count()
    }

    pub fn max_velocity_magnitude(&self) -> FT {
        self.velocity.iter().map(|v| v.magnitude()).fold(0., FT::max)
    }
}

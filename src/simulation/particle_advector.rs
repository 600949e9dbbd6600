use crate::{floating_type_mod::FT, grid::Grid, particles::Particles, vec2f, velocity_interpolator::VelocityInterpolator, V2};

/// Distance a marker keeps from an obstacle face it was pushed back from (in cells).
const OBSTACLE_EPSILON: FT = 1e-5;

/// The time step is halved if the fastest marker travels more than this fraction of a cell per step...
const MAX_CELL_FRACTION_PER_STEP: FT = 1. / 10.;

/// ...and doubled if it travels less than this fraction.
const MIN_CELL_FRACTION_PER_STEP: FT = 1. / 10000.;

/**
 * Moves the markers through the velocity field and keeps the per-cell marker counts in sync.
 *
 * Only markers in liquid cells are moved. A marker that would end up inside an obstacle is placed
 * just in front of the face it crossed, or left where it was if that is not enough.
 */
#[derive(Debug, Clone, Default)]
pub struct ParticleAdvector {}

impl ParticleAdvector {
    pub fn new() -> Self {
        Self {}
    }

    /// Advects all markers by `dt` and returns the recommended time step for the next call.
    pub fn advect_particles(&self, grid: &mut Grid, particles: &mut Particles, dt: FT) -> FT {
        let h = grid.cell_size();

        let velocities: Vec<Option<V2>> = {
            let interpolator = VelocityInterpolator::new(grid);
            (0..particles.len())
                .map(|idx| {
                    let (i, j) = particles.cell[idx];
                    if grid.cell(i, j).status().is_liquid() {
                        Some(interpolator.find_velocity(&particles.position[idx]))
                    } else {
                        None
                    }
                })
                .collect()
        };

        let mut max_velocity: FT = 0.;
        for (idx, velocity) in velocities.into_iter().enumerate() {
            let velocity = match velocity {
                Some(velocity) => velocity,
                None => continue,
            };
            max_velocity = max_velocity.max(velocity.norm());

            let old_position = particles.position[idx];
            let old_cell = particles.cell[idx];
            let new_position = self.resolve_obstacles(grid, old_position + velocity * (dt / h), old_cell);
            let new_cell = grid.cell_index_of(&new_position);

            particles.position[idx] = new_position;
            particles.age[idx] += dt;

            if new_cell != old_cell {
                grid.cell_mut(old_cell.0, old_cell.1).decrement_particles();
                grid.cell_mut(new_cell.0, new_cell.1).increment_particles();
                particles.cell[idx] = new_cell;
            }
        }

        let travel = dt * max_velocity;
        if travel > h * MAX_CELL_FRACTION_PER_STEP {
            dt * 0.5
        } else if travel < h * MIN_CELL_FRACTION_PER_STEP {
            dt * 2.
        } else {
            dt
        }
    }

    /**
     * Keeps markers out of obstacles. A marker that lands in an obstacle is put back just inside its old
     * cell along one crossed axis if that leaves it in a free cell, and along all crossed axes otherwise.
     */
    fn resolve_obstacles(&self, grid: &Grid, new_position: V2, old_cell: (usize, usize)) -> V2 {
        let mut position = new_position;
        position.x = position.x.max(0.).min(grid.x_dim() as FT - OBSTACLE_EPSILON);
        position.y = position.y.max(0.).min(grid.y_dim() as FT - OBSTACLE_EPSILON);

        let (i, j) = grid.cell_index_of(&position);
        if !grid.cell(i, j).is_obstacle() {
            return position;
        }

        let (old_i, old_j) = old_cell;
        let pushed_x = if i > old_i {
            Some((old_i + 1) as FT - OBSTACLE_EPSILON)
        } else if i < old_i {
            Some(old_i as FT + OBSTACLE_EPSILON)
        } else {
            None
        };
        let pushed_y = if j > old_j {
            Some((old_j + 1) as FT - OBSTACLE_EPSILON)
        } else if j < old_j {
            Some(old_j as FT + OBSTACLE_EPSILON)
        } else {
            None
        };

        let single_axis_candidates = [
            pushed_x.map(|x| vec2f(x, position.y)),
            pushed_y.map(|y| vec2f(position.x, y)),
        ];
        for candidate in single_axis_candidates.iter().flatten() {
            let (i, j) = grid.cell_index_of(candidate);
            if !grid.cell(i, j).is_obstacle() {
                return *candidate;
            }
        }

        vec2f(pushed_x.unwrap_or(position.x), pushed_y.unwrap_or(position.y))
    }
}

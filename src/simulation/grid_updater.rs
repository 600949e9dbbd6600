use crate::{
    floating_type_mod::FT,
    grid::Grid,
    particle_advector::ParticleAdvector,
    particles::Particles,
    pressure_updater::{PressureSolveStats, PressureUpdater},
    scene_config::ConfigError,
    simulation_parameters::{validate_b0, validate_viscosity, LiquidParams},
    solver_log::LogSink,
    surface_velocity_updater::SurfaceVelocityUpdater,
    velocity_updater::VelocityUpdater,
};

/// Pressure iterations above this count are reported as a warning.
pub const HIGH_PRESSURE_ITERATION_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// time step the step actually integrated with, at most the requested one
    pub time_step: FT,
    /// time step the advector recommends for the next step, not clamped
    pub recommended_time_step: FT,
    pub pressure: PressureSolveStats,
}

/**
 * Runs one simulation step on a grid and its markers:
 *
 * 0. limit the time step to what the current velocities and gravity allow
 * 1. reclassify cells from the marker counts
 * 2. boundary conditions on the obstacle border
 * 3. tilde velocities of full cells
 * 4. pressure iteration on full cells
 * 5. surface cell velocities and pressures
 * 6. marker advection
 */
#[derive(Debug, Clone)]
pub struct GridUpdater {
    velocity_updater: VelocityUpdater,
    pressure_updater: PressureUpdater,
    surface_velocity_updater: SurfaceVelocityUpdater,
    particle_advector: ParticleAdvector,
    log: LogSink,
}

impl GridUpdater {
    pub fn new(params: &LiquidParams, log: LogSink) -> Self {
        Self {
            velocity_updater: VelocityUpdater::new(params.viscosity),
            pressure_updater: PressureUpdater::new(params.b0, params.max_pressure_iterations, params.max_divergence),
            surface_velocity_updater: SurfaceVelocityUpdater::new(),
            particle_advector: ParticleAdvector::new(),
            log,
        }
    }

    /**
     * Largest time step for which no face moves liquid further than one cell, counting the velocity the face
     * picks up from gravity during the step, and for which the explicit viscous diffusion stays stable.
     */
    pub fn stable_time_step(&self, grid: &Grid, gravity: FT) -> FT {
        let h = grid.cell_size();
        let max_velocity = grid.max_velocity_magnitude();

        // positive root of dt * (max_velocity + |gravity| * dt) = h
        let discriminant = max_velocity * max_velocity + 4. * gravity.abs() * h;
        let denominator = max_velocity + discriminant.sqrt();
        let advection_dt = if denominator > 0. { 2. * h / denominator } else { FT::INFINITY };

        let viscosity = self.velocity_updater.viscosity;
        let diffusion_dt = if viscosity > 0. { h * h / (4. * viscosity) } else { FT::INFINITY };

        advection_dt.min(diffusion_dt)
    }

    pub fn step(&mut self, grid: &mut Grid, particles: &mut Particles, dt: FT, gravity: FT) -> StepOutcome {
        let stable_dt = self.stable_time_step(grid, gravity);
        let dt = if dt > stable_dt {
            self.log
                .info(|| format!("time step limited by the velocity field: {} -> {}", dt, stable_dt));
            stable_dt
        } else {
            dt
        };

        grid.update_cell_status();
        grid.set_boundary_constraints();

        self.velocity_updater.update_velocity(grid, dt, gravity);

        let pressure = self.pressure_updater.update_pressure(grid, dt);
        self.log.debug(|| {
            format!(
                "pressure iteration: {} sweeps, max divergence {:e}",
                pressure.iterations, pressure.max_divergence
            )
        });
        if !pressure.converged {
            self.log.warn(|| {
                format!(
                    "pressure iteration stopped at the cap of {} sweeps with max divergence {:e}",
                    pressure.iterations, pressure.max_divergence
                )
            });
        } else if pressure.iterations > HIGH_PRESSURE_ITERATION_COUNT {
            self.log
                .warn(|| format!("pressure iteration needed {} sweeps", pressure.iterations));
        }

        self.surface_velocity_updater.update_surface_velocity(grid, dt, gravity);

        let recommended_time_step = self.particle_advector.advect_particles(grid, particles, dt);
        if recommended_time_step < dt {
            self.log
                .info(|| format!("time step halved: {} -> {}", dt, recommended_time_step));
        } else if recommended_time_step > dt {
            self.log
                .info(|| format!("time step doubled: {} -> {}", dt, recommended_time_step));
        }

        StepOutcome {
            time_step: dt,
            recommended_time_step,
            pressure,
        }
    }

    pub fn viscosity(&self) -> FT {
        self.velocity_updater.viscosity
    }

    pub fn set_viscosity(&mut self, viscosity: FT) -> Result<(), ConfigError> {
        validate_viscosity(viscosity)?;
        self.velocity_updater.viscosity = viscosity;
        Ok(())
    }

    pub fn b0(&self) -> FT {
        self.pressure_updater.b0
    }

    pub fn set_b0(&mut self, b0: FT) -> Result<(), ConfigError> {
        validate_b0(b0)?;
        self.pressure_updater.b0 = b0;
        Ok(())
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogSink {
        &mut self.log
    }
}

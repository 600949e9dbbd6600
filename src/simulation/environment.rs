use rand::{rngs::StdRng, SeedableRng};

use crate::{
    floating_type_mod::FT,
    grid::Grid,
    grid_updater::{GridUpdater, StepOutcome},
    particles::Particles,
    scene_config::{ConfigError, SceneConfig},
    simulation_parameters::LiquidParams,
    solver_log::LogSink,
    statistics::{PerformanceCounters, ValueCounters},
};

/**
 * A liquid scene: grid, markers and solver built from a validated configuration.
 *
 * Sources and sinks of the scene are applied at the beginning of every step, at the simulated
 * time the step starts at.
 */
pub struct LiquidEnvironment {
    scene: SceneConfig,
    params: LiquidParams,

    grid: Grid,
    particles: Particles,
    updater: GridUpdater,
    rng: StdRng,

    time: FT,
    step_number: usize,
    last_outcome: Option<StepOutcome>,

    pcounters: PerformanceCounters,
    vcounters: ValueCounters,
}

impl LiquidEnvironment {
    pub fn new(scene: SceneConfig, params: LiquidParams, log: LogSink) -> Result<Self, ConfigError> {
        scene.validate()?;
        params.validate()?;

        let mut rng = Self::new_rng(&scene);
        let mut updater = GridUpdater::new(&params, log);
        let (grid, particles) = Self::build(&scene, &mut rng, updater.log_mut());

        Ok(Self {
            scene,
            params,
            grid,
            particles,
            updater,
            rng,
            time: 0.,
            step_number: 0,
            last_outcome: None,
            pcounters: PerformanceCounters::new(false),
            vcounters: ValueCounters::new(false),
        })
    }

    fn new_rng(scene: &SceneConfig) -> StdRng {
        match scene.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn build(scene: &SceneConfig, rng: &mut StdRng, log: &mut LogSink) -> (Grid, Particles) {
        let mut grid = Grid::new(scene.grid.width, scene.grid.height, scene.grid.cell_size);
        for wall in &scene.walls {
            for (i, j) in wall.cells() {
                grid.set_obstacle(i, j);
            }
        }

        let mut particles = Particles::new();
        for block in &scene.initial_liquid {
            let [u, v] = block.velocity;
            for (i, j) in block.region.cells() {
                if !grid.cell(i, j).is_obstacle() {
                    grid.initialize_velocity(i, j, u, v);
                }
            }
            particles.seed_region(&block.region, scene.particles_per_cell, rng, &mut grid);
        }

        log.info(|| {
            format!(
                "seeded {} markers into a {}x{} grid",
                particles.len(),
                grid.x_dim(),
                grid.y_dim()
            )
        });

        (grid, particles)
    }

    /// Discards grid and markers and rebuilds them from the configuration. Live tunables are kept.
    pub fn restart(&mut self) {
        self.rng = Self::new_rng(&self.scene);
        let (grid, particles) = Self::build(&self.scene, &mut self.rng, self.updater.log_mut());
        self.grid = grid;
        self.particles = particles;
        self.time = 0.;
        self.step_number = 0;
        self.last_outcome = None;
    }

    fn apply_sources_and_sinks(&mut self) {
        let time = self.time;
        for source in self.scene.sources.iter().filter(|s| s.is_active(time)) {
            let [u, v] = source.velocity;
            for (i, j) in source.region.cells() {
                if !self.grid.cell(i, j).is_obstacle() {
                    self.grid.initialize_velocity(i, j, u, v);
                }
            }
            self.particles
                .top_up_region(&source.region, self.scene.particles_per_cell, &mut self.rng, &mut self.grid);
        }

        for sink in self.scene.sinks.iter().filter(|s| s.is_active(time)) {
            self.particles.remove_in_region(&sink.region, &mut self.grid);
        }
    }

    /// Advances the scene by `dt`, or less if the velocity field does not allow `dt`, and returns the time step
    /// to use next, at most `max_time_step`.
    pub fn step_forward(&mut self, dt: FT) -> FT {
        self.pcounters.begin("simulation-step");

        self.apply_sources_and_sinks();
        let outcome = self
            .updater
            .step(&mut self.grid, &mut self.particles, dt, self.scene.gravity);

        self.time += outcome.time_step;
        self.step_number += 1;
        self.last_outcome = Some(outcome);

        self.pcounters.end("simulation-step");
        self.vcounters.add_value("particle-count", self.particles.len() as FT);
        self.vcounters
            .add_value("pressure-iterations", outcome.pressure.iterations as FT);
        self.vcounters.add_value("max-divergence", outcome.pressure.max_divergence);
        self.vcounters.add_value("time-step", outcome.time_step);

        outcome.recommended_time_step.min(self.params.max_time_step)
    }

    pub fn set_counters_enabled(&mut self, enabled: bool) {
        self.pcounters.set_enabled(enabled);
        self.vcounters.set_enabled(enabled);
    }

    pub fn set_viscosity(&mut self, viscosity: FT) -> Result<(), ConfigError> {
        self.updater.set_viscosity(viscosity)?;
        self.params.viscosity = viscosity;
        Ok(())
    }

    pub fn set_b0(&mut self, b0: FT) -> Result<(), ConfigError> {
        self.updater.set_b0(b0)?;
        self.params.b0 = b0;
        Ok(())
    }

    pub fn time(&self) -> FT {
        self.time
    }

    pub fn step_number(&self) -> usize {
        self.step_number
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn params(&self) -> &LiquidParams {
        &self.params
    }

    pub fn last_outcome(&self) -> Option<&StepOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn log(&self) -> &LogSink {
        self.updater.log()
    }

    pub(crate) fn performance_counters(&self) -> &PerformanceCounters {
        &self.pcounters
    }

    pub(crate) fn value_counters(&self) -> &ValueCounters {
        &self.vcounters
    }
}

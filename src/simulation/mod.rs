pub mod cell;
pub mod color_map;
pub mod environment;
pub mod grid;
pub mod grid_updater;
pub mod particle_advector;
pub mod particles;
pub mod pressure_updater;
pub mod scene_config;
pub mod simulation_parameters;
pub mod solver_log;
pub mod statistics;
pub mod surface_velocity_updater;
pub mod velocity_interpolator;
pub mod velocity_updater;
pub mod visualization;

#[cfg(feature = "double-precision")]
pub mod floating_type_mod {
    pub type FT = f64;
}

#[cfg(not(feature = "double-precision"))]
pub mod floating_type_mod {
    pub type FT = f32;
}

use floating_type_mod::FT;

use nalgebra::SVector;
use num_traits::Float;
use std::fmt::Display;

#[allow(dead_code)]
pub type V<FT, const D: usize> = SVector<FT, D>;

pub type V2 = V<FT, 2>;

pub fn vec2f(x: FT, y: FT) -> V2 {
    [x, y].into()
}

pub use cell::{Cell, CellStatus, CellVelocity, ATMOSPHERIC_PRESSURE};
pub use environment::LiquidEnvironment;
pub use grid::{CellNeighbors, Grid};
pub use grid_updater::{GridUpdater, StepOutcome};
pub use particle_advector::ParticleAdvector;
pub use particles::Particles;
pub use pressure_updater::{PressureSolveStats, PressureUpdater};
pub use scene_config::{ConfigError, Region, SceneConfig};
pub use simulation_parameters::LiquidParams;
pub use solver_log::{ConsoleLog, LogLevel, LogSink, RecordingLog, SilentLog, SolverLog};
pub use statistics::write_statistics;
pub use surface_velocity_updater::SurfaceVelocityUpdater;
pub use velocity_interpolator::VelocityInterpolator;
pub use velocity_updater::VelocityUpdater;
pub use visualization::{
    render_grid, write_png, RgbImage, VisualizationParams, VisualizedAttribute, ALL_VISUALIZED_ATTRIBUTES,
};

pub fn is_ft_approx_eq<FT: Float>(a: FT, b: FT, tolerance: FT) -> bool {
    assert!(!a.is_nan());
    assert!(!b.is_nan());
    b <= a + tolerance && b >= a - tolerance
}

pub fn assert_ft_approx_eq<FT: Float + Display>(a: FT, b: FT, tolerance: FT, s: impl FnOnce() -> String) {
    if !is_ft_approx_eq(a, b, tolerance) {
        panic!(
            "{} value not equal with a tolerance of {}:\n\ta={}\n\tb={}\n",
            s(),
            tolerance,
            a,
            b
        );
    }
}

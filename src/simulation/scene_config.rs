use std::fmt;

use serde::{Deserialize, Serialize};

use crate::floating_type_mod::FT;

#[derive(Debug)]
pub enum ConfigError {
    InvalidGrid(String),
    InvalidParameter { name: &'static str, value: FT, reason: &'static str },
    RegionOutOfBounds { kind: &'static str, index: usize, region: Region },
    Parse(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidGrid(msg) => write!(f, "invalid grid: {}", msg),
            ConfigError::InvalidParameter { name, value, reason } => {
                write!(f, "invalid value {} for `{}`: {}", value, name, reason)
            }
            ConfigError::RegionOutOfBounds { kind, index, region } => write!(
                f,
                "{} #{} spans cells {:?}..={:?} which is not inside the grid interior",
                kind, index, region.start, region.stop
            ),
            ConfigError::Parse(e) => write!(f, "failed parsing config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Rectangle of cells, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: [usize; 2],
    pub stop: [usize; 2],
}

impl Region {
    pub fn new(start: [usize; 2], stop: [usize; 2]) -> Self {
        Self { start, stop }
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i >= self.start[0] && i <= self.stop[0] && j >= self.start[1] && j <= self.stop[1]
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (j0, j1) = (self.start[1], self.stop[1]);
        (self.start[0]..=self.stop[0]).flat_map(move |i| (j0..=j1).map(move |j| (i, j)))
    }

    pub fn num_cells(&self) -> usize {
        if self.start[0] > self.stop[0] || self.start[1] > self.stop[1] {
            return 0;
        }
        (self.stop[0] - self.start[0] + 1) * (self.stop[1] - self.start[1] + 1)
    }

    /// Non-empty and not touching the obstacle border of a `x_dim * y_dim` grid.
    fn is_inside_interior(&self, x_dim: usize, y_dim: usize) -> bool {
        self.start[0] >= 1
            && self.start[1] >= 1
            && self.start[0] <= self.stop[0]
            && self.start[1] <= self.stop[1]
            && self.stop[0] + 1 < x_dim
            && self.stop[1] + 1 < y_dim
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SceneGrid {
    pub width: usize,
    pub height: usize,
    pub cell_size: FT,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneLiquidBlock {
    pub region: Region,
    #[serde(default)]
    pub velocity: [FT; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSource {
    pub region: Region,
    pub velocity: [FT; 2],
    #[serde(default)]
    pub start_time: FT,
    // absent: stays on forever
    #[serde(default)]
    pub duration: Option<FT>,
    #[serde(default)]
    pub repeat_interval: Option<FT>,
}

impl SceneSource {
    pub fn is_active(&self, time: FT) -> bool {
        if time < self.start_time {
            return false;
        }
        let duration = match self.duration {
            Some(duration) => duration,
            None => return true,
        };
        let mut elapsed = time - self.start_time;
        if let Some(repeat_interval) = self.repeat_interval {
            elapsed %= repeat_interval;
        }
        elapsed < duration
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSink {
    pub region: Region,
    #[serde(default)]
    pub start_time: FT,
}

impl SceneSink {
    pub fn is_active(&self, time: FT) -> bool {
        time >= self.start_time
    }
}

fn default_particles_per_cell() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub grid: SceneGrid,
    pub gravity: FT,
    #[serde(default = "default_particles_per_cell")]
    pub particles_per_cell: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub walls: Vec<Region>,
    #[serde(default)]
    pub sources: Vec<SceneSource>,
    #[serde(default)]
    pub sinks: Vec<SceneSink>,
    #[serde(default)]
    pub initial_liquid: Vec<SceneLiquidBlock>,
}

impl SceneConfig {
    /// Closed box of `width * height` cells (border included) without any liquid.
    pub fn empty_box(width: usize, height: usize, cell_size: FT, gravity: FT) -> Self {
        Self {
            grid: SceneGrid {
                width,
                height,
                cell_size,
            },
            gravity,
            particles_per_cell: default_particles_per_cell(),
            seed: None,
            walls: Vec::new(),
            sources: Vec::new(),
            sinks: Vec::new(),
            initial_liquid: Vec::new(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let scene: SceneConfig = serde_yaml::from_str(yaml)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let SceneGrid {
            width,
            height,
            cell_size,
        } = self.grid;
        if width < 3 || height < 3 {
            return Err(ConfigError::InvalidGrid(format!(
                "grid of {}x{} cells has no interior (need at least 3x3 including the border)",
                width, height
            )));
        }
        if !(cell_size > 0.) || !cell_size.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "cell_size",
                value: cell_size,
                reason: "must be positive and finite",
            });
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "gravity",
                value: self.gravity,
                reason: "must be finite",
            });
        }
        if self.particles_per_cell == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "particles_per_cell",
                value: 0.,
                reason: "must be at least 1",
            });
        }

        let check_region = |kind: &'static str, index: usize, region: &Region| {
            if region.is_inside_interior(width, height) {
                Ok(())
            } else {
                Err(ConfigError::RegionOutOfBounds {
                    kind,
                    index,
                    region: *region,
                })
            }
        };

        for (index, wall) in self.walls.iter().enumerate() {
            check_region("wall", index, wall)?;
        }
        for (index, block) in self.initial_liquid.iter().enumerate() {
            check_region("initial liquid", index, &block.region)?;
        }
        for (index, sink) in self.sinks.iter().enumerate() {
            check_region("sink", index, &sink.region)?;
        }
        for (index, source) in self.sources.iter().enumerate() {
            check_region("source", index, &source.region)?;
            if let Some(duration) = source.duration {
                if !(duration > 0.) {
                    return Err(ConfigError::InvalidParameter {
                        name: "source.duration",
                        value: duration,
                        reason: "must be positive",
                    });
                }
            }
            if let Some(repeat_interval) = source.repeat_interval {
                if !(repeat_interval > 0.) {
                    return Err(ConfigError::InvalidParameter {
                        name: "source.repeat_interval",
                        value: repeat_interval,
                        reason: "must be positive",
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Region, SceneConfig, SceneSource};

    const DAM_BREAK: &str = "
grid:
  width: 20
  height: 12
  cell_size: 0.5
gravity: -9.81
particles_per_cell: 4
seed: 42
walls:
  - start: [10, 1]
    stop: [10, 4]
initial_liquid:
  - region:
      start: [1, 1]
      stop: [6, 8]
sources:
  - region:
      start: [15, 9]
      stop: [16, 10]
    velocity: [0.0, -1.0]
    start_time: 1.0
    duration: 0.5
    repeat_interval: 2.0
sinks:
  - region:
      start: [17, 1]
      stop: [18, 1]
";

    #[test]
    fn parses_scene() {
        let scene = SceneConfig::from_yaml(DAM_BREAK).unwrap();
        assert_eq!(scene.grid.width, 20);
        assert_eq!(scene.particles_per_cell, 4);
        assert_eq!(scene.seed, Some(42));
        assert_eq!(scene.walls.len(), 1);
        assert_eq!(scene.initial_liquid[0].region.num_cells(), 6 * 8);
        assert_eq!(scene.initial_liquid[0].velocity, [0., 0.]);
        assert_eq!(scene.sources[0].velocity, [0., -1.]);
        assert_eq!(scene.sinks[0].start_time, 0.);
    }

    #[test]
    fn rejects_region_touching_border() {
        let mut scene = SceneConfig::empty_box(10, 10, 1., -1.);
        scene.walls.push(Region::new([0, 2], [3, 3]));
        match scene.validate() {
            Err(ConfigError::RegionOutOfBounds { kind, index, .. }) => {
                assert_eq!(kind, "wall");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut scene = SceneConfig::empty_box(10, 10, 1., -1.);
        scene.sinks.push(super::SceneSink {
            region: Region::new([2, 2], [9, 3]),
            start_time: 0.,
        });
        assert!(scene.validate().is_err());
    }

    #[test]
    fn rejects_bad_grid() {
        assert!(matches!(
            SceneConfig::empty_box(2, 10, 1., -1.).validate(),
            Err(ConfigError::InvalidGrid(_))
        ));
        assert!(matches!(
            SceneConfig::empty_box(5, 5, 0., -1.).validate(),
            Err(ConfigError::InvalidParameter { name: "cell_size", .. })
        ));
        assert!(SceneConfig::empty_box(3, 3, 1., -1.).validate().is_ok());
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            SceneConfig::from_yaml("grid: [1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn source_schedule() {
        let source = SceneSource {
            region: Region::new([1, 1], [1, 1]),
            velocity: [0., 0.],
            start_time: 1.,
            duration: Some(0.5),
            repeat_interval: Some(2.),
        };
        assert!(!source.is_active(0.9));
        assert!(source.is_active(1.0));
        assert!(source.is_active(1.4));
        assert!(!source.is_active(1.6));
        assert!(source.is_active(3.2));
        assert!(!source.is_active(4.0));

        let forever = SceneSource {
            duration: None,
            repeat_interval: None,
            ..source.clone()
        };
        assert!(forever.is_active(100.));

        let once = SceneSource {
            repeat_interval: None,
            ..source
        };
        assert!(!once.is_active(3.2));
    }

    #[test]
    fn bundled_scenes_are_valid() {
        for yaml in [
            include_str!("../../configs/dam-break.yaml"),
            include_str!("../../configs/fountain.yaml"),
        ] {
            SceneConfig::from_yaml(yaml).unwrap();
        }
    }

    #[test]
    fn region_iteration() {
        let region = Region::new([2, 3], [3, 5]);
        let cells: Vec<_> = region.cells().collect();
        assert_eq!(cells.len(), region.num_cells());
        assert_eq!(cells[0], (2, 3));
        assert_eq!(cells[5], (3, 5));
        assert!(region.contains(3, 4));
        assert!(!region.contains(4, 4));
    }
}

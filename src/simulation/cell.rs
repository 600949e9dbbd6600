use serde::{Deserialize, Serialize};

use crate::floating_type_mod::FT;

/// Pressure of cells that are not part of the liquid interior.
pub const ATMOSPHERIC_PRESSURE: FT = 1.0;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CellStatus {
    /// No markers in the cell.
    Empty,

    /// Markers in the cell and in some (but not all) of the axis-adjacent cells.
    Surface,

    /// Markers in the cell and in all four axis-adjacent cells.
    Full,

    /// Solid. Never changes once set.
    Obstacle,

    /// Markers in the cell but in none of the axis-adjacent cells.
    Isolated,
}

impl CellStatus {
    /// Cells whose markers are moved by the velocity field.
    pub fn is_liquid(self) -> bool {
        matches!(self, CellStatus::Full | CellStatus::Surface | CellStatus::Isolated)
    }

    pub fn as_str_lowercase(&self) -> &'static str {
        match self {
            &Self::Empty => "empty",
            &Self::Surface => "surface",
            &Self::Full => "full",
            &Self::Obstacle => "obstacle",
            &Self::Isolated => "isolated",
        }
    }
}

/**
 * Face velocities of a single cell on the staggered grid.
 *
 * `u` lives on the face shared with the right neighbor (i+1/2, j),
 * `v` lives on the face shared with the top neighbor (i, j+1/2).
 * The faces towards the left and bottom neighbors belong to those neighbors.
 */
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellVelocity {
    pub u: FT,
    pub v: FT,
}

impl CellVelocity {
    pub fn new(u: FT, v: FT) -> Self {
        Self { u, v }
    }

    pub fn zero() -> Self {
        Self { u: 0., v: 0. }
    }

    pub fn magnitude(&self) -> FT {
        (self.u * self.u + self.v * self.v).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    status: CellStatus,
    pressure: FT,
    num_particles: u32,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl Cell {
    pub fn new() -> Self {
        Self {
            status: CellStatus::Empty,
            pressure: ATMOSPHERIC_PRESSURE,
            num_particles: 0,
        }
    }

    pub fn status(&self) -> CellStatus {
        self.status
    }

    pub fn is_obstacle(&self) -> bool {
        self.status == CellStatus::Obstacle
    }

    pub fn is_empty(&self) -> bool {
        self.status == CellStatus::Empty
    }

    pub fn is_full(&self) -> bool {
        self.status == CellStatus::Full
    }

    /// Obstacle cells keep their status, every other assignment is applied.
    pub fn set_status(&mut self, status: CellStatus) {
        if self.status != CellStatus::Obstacle {
            self.status = status;
        }
    }

    pub fn set_obstacle(&mut self) {
        self.status = CellStatus::Obstacle;
    }

    pub fn pressure(&self) -> FT {
        self.pressure
    }

    pub fn set_pressure(&mut self, pressure: FT) {
        self.pressure = pressure;
    }

    pub fn num_particles(&self) -> u32 {
        self.num_particles
    }

    pub fn has_particles(&self) -> bool {
        self.num_particles > 0
    }

    pub fn increment_particles(&mut self) {
        self.num_particles += 1;
    }

    pub fn decrement_particles(&mut self) {
        assert!(
            self.num_particles > 0,
            "removing a particle from a cell without particles (status {:?})",
            self.status
        );
        self.num_particles -= 1;
    }
}

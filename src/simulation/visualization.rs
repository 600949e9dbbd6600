use std::{fs::File, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    cell::CellStatus,
    color_map::{rgb, to_u8, Color, ColorMap},
    floating_type_mod::FT,
    grid::Grid,
    particles::Particles,
};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum VisualizedAttribute {
    Status,
    Pressure,
    Velocity,
    ParticleCount,
}

pub const ALL_VISUALIZED_ATTRIBUTES: [VisualizedAttribute; 4] = [
    VisualizedAttribute::Status,
    VisualizedAttribute::Pressure,
    VisualizedAttribute::Velocity,
    VisualizedAttribute::ParticleCount,
];

impl VisualizedAttribute {
    pub fn as_str_lowercase(&self) -> &'static str {
        match self {
            &Self::Status => "status",
            &Self::Pressure => "pressure",
            &Self::Velocity => "velocity",
            &Self::ParticleCount => "particle-count",
        }
    }

    pub fn from_str_lowercase(s: &str) -> Option<VisualizedAttribute> {
        ALL_VISUALIZED_ATTRIBUTES
            .iter()
            .copied()
            .find(|attribute| attribute.as_str_lowercase() == s)
    }
}

fn default_pixels_per_cell() -> u32 {
    8
}

fn default_draw_particles() -> bool {
    true
}

#[derive(Copy, Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationParams {
    pub visualized_attribute: VisualizedAttribute,
    #[serde(default = "default_pixels_per_cell")]
    pub pixels_per_cell: u32,
    #[serde(default = "default_draw_particles")]
    pub draw_particles: bool,
}

impl Default for VisualizationParams {
    fn default() -> Self {
        Self {
            visualized_attribute: VisualizedAttribute::Status,
            pixels_per_cell: default_pixels_per_cell(),
            draw_particles: default_draw_particles(),
        }
    }
}

/// Row-major RGB8 pixels, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = 3 * (y as usize * self.width as usize + x as usize);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        let idx = 3 * (y as usize * self.width as usize + x as usize);
        self.data[idx..idx + 3].copy_from_slice(&color);
    }
}

const BACKGROUND_COLOR: [u8; 3] = [250, 250, 250];
const OBSTACLE_COLOR: [u8; 3] = [90, 90, 90];
const PARTICLE_COLOR: [u8; 3] = [0, 0, 0];

fn status_color(status: CellStatus) -> Color {
    match status {
        CellStatus::Empty => rgb(0.98, 0.98, 0.98),
        CellStatus::Surface => rgb(0.55, 0.75, 0.95),
        CellStatus::Full => rgb(0.1, 0.3, 0.8),
        CellStatus::Obstacle => rgb(0.35, 0.35, 0.35),
        CellStatus::Isolated => rgb(0.2, 0.8, 0.8),
    }
}

/// Speed at the cell center from the averaged face velocities.
fn cell_speed(grid: &Grid, i: usize, j: usize) -> FT {
    let u = 0.5 * (grid.u(i - 1, j) + grid.u(i, j));
    let v = 0.5 * (grid.v(i, j - 1) + grid.v(i, j));
    (u * u + v * v).sqrt()
}

fn liquid_range(grid: &Grid, f: impl Fn(usize, usize) -> FT) -> (FT, FT) {
    let (min, max) = grid
        .interior_cells()
        .filter(|&(i, j)| grid.cell(i, j).status().is_liquid())
        .map(|(i, j)| f(i, j))
        .fold((FT::MAX, FT::MIN), |(min, max), x| (min.min(x), max.max(x)));
    if min > max {
        (0., 1.)
    } else if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

/**
 * Draws one block of `pixels_per_cell` squared pixels per cell, +y pointing up. Liquid cells are
 * colored by the visualized attribute, empty cells and obstacles get fixed colors.
 */
pub fn render_grid(grid: &Grid, particles: &Particles, params: &VisualizationParams) -> RgbImage {
    let ppc = params.pixels_per_cell.max(1);
    let width = grid.x_dim() as u32 * ppc;
    let height = grid.y_dim() as u32 * ppc;
    let mut image = RgbImage::new(width, height);

    let color_of_cell: Box<dyn Fn(usize, usize) -> [u8; 3] + '_> = match params.visualized_attribute {
        VisualizedAttribute::Status => Box::new(|i: usize, j: usize| to_u8(status_color(grid.cell(i, j).status()))),
        VisualizedAttribute::Pressure => {
            let (min, max) = liquid_range(grid, |i, j| grid.cell(i, j).pressure());
            let map = ColorMap::cool_warm(min, max);
            Box::new(move |i: usize, j: usize| map.get_u8(grid.cell(i, j).pressure()))
        }
        VisualizedAttribute::Velocity => {
            let (_, max) = liquid_range(grid, |i, j| cell_speed(grid, i, j));
            let map = ColorMap::viridis(0., max);
            Box::new(move |i: usize, j: usize| map.get_u8(cell_speed(grid, i, j)))
        }
        VisualizedAttribute::ParticleCount => {
            let (_, max) = liquid_range(grid, |i, j| grid.cell(i, j).num_particles() as FT);
            let map = ColorMap::viridis(0., max);
            Box::new(move |i: usize, j: usize| map.get_u8(grid.cell(i, j).num_particles() as FT))
        }
    };

    for i in 0..grid.x_dim() {
        for j in 0..grid.y_dim() {
            let status = grid.cell(i, j).status();
            let color = if status == CellStatus::Obstacle {
                OBSTACLE_COLOR
            } else if status.is_liquid() || params.visualized_attribute == VisualizedAttribute::Status {
                color_of_cell(i, j)
            } else {
                BACKGROUND_COLOR
            };

            let x0 = i as u32 * ppc;
            let y0 = (grid.y_dim() - 1 - j) as u32 * ppc;
            for y in y0..y0 + ppc {
                for x in x0..x0 + ppc {
                    image.set_pixel(x, y, color);
                }
            }
        }
    }

    if params.draw_particles {
        for position in &particles.position {
            let x = (position.x * ppc as FT).max(0.).min((width - 1) as FT) as u32;
            let y = ((grid.y_dim() as FT - position.y) * ppc as FT).max(0.).min((height - 1) as FT) as u32;
            image.set_pixel(x, y, PARTICLE_COLOR);
        }
    }

    image
}

pub fn write_png(path: &Path, image: &RgbImage) -> Result<(), png::EncodingError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.data())?;
    writer.finish()
}

use nalgebra::zero;
use rand::Rng;

use crate::{floating_type_mod::FT, grid::Grid, scene_config::Region, vec2f, V2};

macro_rules! decl_particle_vec {
    (pub struct $struct_name:ident { $(pub $field_name:ident: Vec<$field_type:ty> | $default_value:expr),*$(,)?  }) => {
        #[derive(Debug, Clone)]
        pub struct $struct_name {
            $(
                pub $field_name : Vec<$field_type>,
            )*
        }

        impl $struct_name {
            pub fn swap(&mut self, i: usize, j: usize) {
                $(
                    self.$field_name.swap(i, j);
                )*
            }

            pub fn truncate(&mut self, len: usize) {
                $(
                    self.$field_name.truncate(len);
                )*
            }

            pub fn extend(&mut self, num_elements: usize) {
                $(
                    self.$field_name.extend((0..num_elements).map::<$field_type, _>(|_| $default_value));
                )*
            }

            pub fn default(len: usize) -> Self {
                Self {
                    $(
                        $field_name: (0..len).map(|_| $default_value).collect::<Vec<$field_type>>(),
                    )*
                }
            }
        }
    }
}

decl_particle_vec! {
    pub struct Particles {
        // grid coordinates (cell (i, j) covers [i, i+1) x [j, j+1))
        pub position: Vec<V2> | zero(),

        // simulated time since the marker was created
        pub age: Vec<FT> | 0.,

        // cell the marker is counted in
        pub cell: Vec<(usize, usize)> | (0, 0),
    }
}

impl Particles {
    pub fn new() -> Self {
        Self::default(0)
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Adds a marker and counts it in the cell containing `position`.
    pub fn add(&mut self, position: V2, grid: &mut Grid) -> usize {
        let (i, j) = grid.cell_index_of(&position);
        assert!(
            !grid.cell(i, j).is_obstacle(),
            "particle at ({}, {}) placed inside an obstacle",
            position.x,
            position.y
        );

        let idx = self.len();
        self.extend(1);
        self.position[idx] = position;
        self.cell[idx] = (i, j);
        grid.cell_mut(i, j).increment_particles();
        idx
    }

    /// Adds `num` markers at uniformly random positions inside cell `(i, j)`.
    pub fn add_random_particles_to_cell<R: Rng>(
        &mut self,
        i: usize,
        j: usize,
        num: usize,
        rng: &mut R,
        grid: &mut Grid,
    ) {
        for _ in 0..num {
            let position = vec2f(i as FT + rng.gen::<FT>(), j as FT + rng.gen::<FT>());
            self.add(position, grid);
        }
    }

    /// Seeds `per_cell` random markers into every non-obstacle cell of the region. Returns the number added.
    pub fn seed_region<R: Rng>(&mut self, region: &Region, per_cell: usize, rng: &mut R, grid: &mut Grid) -> usize {
        let mut num_added = 0;
        for (i, j) in region.cells() {
            if grid.cell(i, j).is_obstacle() {
                continue;
            }
            self.add_random_particles_to_cell(i, j, per_cell, rng, grid);
            num_added += per_cell;
        }
        num_added
    }

    /// Adds markers to every non-obstacle cell of the region until it holds at least `per_cell`.
    pub fn top_up_region<R: Rng>(&mut self, region: &Region, per_cell: usize, rng: &mut R, grid: &mut Grid) -> usize {
        let mut num_added = 0;
        for (i, j) in region.cells() {
            let cell = grid.cell(i, j);
            if cell.is_obstacle() {
                continue;
            }
            let missing = per_cell.saturating_sub(cell.num_particles() as usize);
            self.add_random_particles_to_cell(i, j, missing, rng, grid);
            num_added += missing;
        }
        num_added
    }

    /// Removes marker `idx` (the last marker takes its place) and uncounts it from its cell.
    pub fn remove(&mut self, idx: usize, grid: &mut Grid) {
        let (i, j) = self.cell[idx];
        grid.cell_mut(i, j).decrement_particles();
        let last = self.len() - 1;
        self.swap(idx, last);
        self.truncate(last);
    }

    /// Removes all markers counted in a cell of the region. Returns the number removed.
    pub fn remove_in_region(&mut self, region: &Region, grid: &mut Grid) -> usize {
        let mut num_removed = 0;
        let mut idx = 0;
        while idx < self.len() {
            let (i, j) = self.cell[idx];
            if region.contains(i, j) {
                self.remove(idx, grid);
                num_removed += 1;
            } else {
                idx += 1;
            }
        }
        num_removed
    }
}

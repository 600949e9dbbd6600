/*!
Marker-and-cell liquid solver.

The grid classifies every cell from the marker particles it holds, computes tilde velocities for full cells,
relaxes pressure until the liquid is (approximately) divergence free, patches the velocities of surface cells
and finally moves the markers through the resulting velocity field.
*/

mod simulation;

pub use simulation::*;

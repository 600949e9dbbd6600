/*!
Headless runner for the liquid solver: loads a parameter file and a scene, steps the simulation and
optionally writes PNG snapshots and a statistics report.
*/

mod platform;

fn main() -> anyhow::Result<()> {
    platform::start()
}

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use liquid_mac::{
    floating_type_mod::FT, render_grid, write_png, write_statistics, CellStatus, LiquidEnvironment, LiquidParams,
    LogLevel, LogSink, SceneConfig, VisualizationParams, VisualizedAttribute, ALL_VISUALIZED_ATTRIBUTES,
};

const CARGO_PKG_AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");
const CARGO_PKG_VERSION: &'static str = env!("CARGO_PKG_VERSION");
const CARGO_PKG_DESCRIPTION: &'static str = env!("CARGO_PKG_DESCRIPTION");

pub fn start() -> Result<()> {
    let attribute_names: Vec<&str> = ALL_VISUALIZED_ATTRIBUTES.iter().map(|a| a.as_str_lowercase()).collect();

    let matches = App::new("Liquid MAC Simulation")
        .version(CARGO_PKG_VERSION)
        .author(CARGO_PKG_AUTHORS)
        .about(CARGO_PKG_DESCRIPTION)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Run simulation with given config")
                .arg(
                    Arg::with_name("SIMULATION_CONFIG")
                        .help("Sets the solver parameters")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("SCENE_CONFIG")
                        .help("Scene setup")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::with_name("MAX_SECONDS")
                        .long("max-seconds")
                        .short("s")
                        .required(false)
                        .takes_value(true)
                        .default_value("5")
                        .help("Stop simulation after the given amount of simulated seconds"),
                )
                .arg(
                    Arg::with_name("OVERWRITE_CONFIG_FILE")
                        .long("overwrite-config-file")
                        .short("c")
                        .required(false)
                        .takes_value(true)
                        .help("Overwrite single solver parameters"),
                )
                .arg(
                    Arg::with_name("STATISTICS_ENABLED")
                        .help("Track solver values and timings of the individual steps")
                        .short("p")
                        .long("statistics-enabled")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("STATISTICS_PATH")
                        .long("statistics-path")
                        .short("w")
                        .required(false)
                        .takes_value(true)
                        .help("Where to write statistics to"),
                )
                .arg(
                    Arg::with_name("SNAPSHOT_DIR")
                        .long("snapshot-dir")
                        .required(false)
                        .takes_value(true)
                        .help("Directory for PNG snapshots of the grid"),
                )
                .arg(
                    Arg::with_name("SNAPSHOT_EVERY")
                        .long("snapshot-every")
                        .required(false)
                        .takes_value(true)
                        .default_value("10")
                        .help("Write a snapshot every N steps"),
                )
                .arg(
                    Arg::with_name("VISUALIZED_ATTRIBUTE")
                        .long("visualize")
                        .required(false)
                        .takes_value(true)
                        .possible_values(&attribute_names)
                        .default_value("status")
                        .help("Cell attribute shown in the snapshots"),
                ),
        )
        .subcommand(
            SubCommand::with_name("default-params")
                .about("Write the default solver parameters to a file")
                .arg(
                    Arg::with_name("OUTPUT_YAML")
                        .help("YAML file where the parameters are written to")
                        .default_value("./liquid-params.yaml")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .get_matches();

    let verbosity = LogLevel::from_verbosity(matches.occurrences_of("v"));

    if let Some(run_matches) = matches.subcommand_matches("run") {
        run(run_matches, verbosity)
    } else if let Some(subcmd_matches) = matches.subcommand_matches("default-params") {
        let yaml_path = subcmd_matches.value_of("OUTPUT_YAML").unwrap_or("./liquid-params.yaml");
        let yaml = serde_yaml::to_string(&LiquidParams::default()).context("failed serializing parameters")?;
        std::fs::write(yaml_path, yaml).with_context(|| format!("failed writing `{}`", yaml_path))?;
        println!("Wrote default parameters to `{}`", yaml_path);
        Ok(())
    } else {
        unreachable!()
    }
}

/// Reads the parameter file and replaces single entries with the ones of the overwrite file.
fn load_params(parameter_file: &str, overwrite_file: Option<&str>) -> Result<LiquidParams> {
    let params_yaml = std::fs::read_to_string(parameter_file)
        .with_context(|| format!("failed reading parameter file `{}`", parameter_file))?;
    let mut params_serde: serde_yaml::Value =
        serde_yaml::from_str(&params_yaml).context("failed parsing simulation config file")?;

    if let Some(overwrite_file) = overwrite_file {
        let overwrite_str = std::fs::read_to_string(overwrite_file)
            .with_context(|| format!("failed reading overwrite file `{}`", overwrite_file))?;
        let overwrite: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&overwrite_str).context("failed parsing overwrite file")?;

        let mapping = match params_serde.as_mapping_mut() {
            Some(mapping) => mapping,
            None => bail!("parameter file `{}` is not a mapping", parameter_file),
        };
        for (k, v) in overwrite.into_iter() {
            match mapping.get_mut(&serde_yaml::Value::String(k.clone())) {
                Some(entry) => *entry = v,
                None => bail!("not able to find attribute `{}`", k),
            }
        }
    }

    let params: LiquidParams = serde_yaml::from_value(params_serde).context("failed to unpack LiquidParams")?;
    params.validate()?;
    Ok(params)
}

fn write_snapshot(environment: &LiquidEnvironment, dir: &Path, frame_number: usize, params: &VisualizationParams) -> Result<()> {
    let image = render_grid(environment.grid(), environment.particles(), params);
    let path = dir.join(format!("frame-{:06}.png", frame_number));
    write_png(&path, &image).with_context(|| format!("failed writing snapshot `{}`", path.display()))
}

fn run(run_matches: &ArgMatches, verbosity: LogLevel) -> Result<()> {
    let parameter_file = run_matches.value_of("SIMULATION_CONFIG").context("missing simulation config")?;
    let params = load_params(parameter_file, run_matches.value_of("OVERWRITE_CONFIG_FILE"))?;
    println!("{:?}", params);

    let scene_file_path = run_matches.value_of("SCENE_CONFIG").context("missing scene config")?;
    let scene_yaml = std::fs::read_to_string(scene_file_path)
        .with_context(|| format!("failed reading scene file `{}`", scene_file_path))?;
    let scene_config = SceneConfig::from_yaml(&scene_yaml).context("failed parsing scene config file")?;

    let max_seconds: FT = run_matches
        .value_of("MAX_SECONDS")
        .unwrap_or("5")
        .parse()
        .context("--max-seconds expects a number")?;
    let snapshot_every: usize = run_matches
        .value_of("SNAPSHOT_EVERY")
        .unwrap_or("10")
        .parse()
        .context("--snapshot-every expects a positive integer")?;
    if snapshot_every == 0 {
        bail!("--snapshot-every expects a positive integer");
    }
    let snapshot_dir: Option<PathBuf> = run_matches.value_of("SNAPSHOT_DIR").map(PathBuf::from);
    if let Some(dir) = &snapshot_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("failed creating `{}`", dir.display()))?;
    }
    let attribute_name = run_matches.value_of("VISUALIZED_ATTRIBUTE").unwrap_or("status");
    let visualized_attribute = VisualizedAttribute::from_str_lowercase(attribute_name)
        .with_context(|| format!("unknown visualized attribute `{}`", attribute_name))?;
    let visualization_params = VisualizationParams {
        visualized_attribute,
        ..VisualizationParams::default()
    };

    let counters_enabled = run_matches.is_present("STATISTICS_ENABLED");
    let statistics_path_opt = run_matches.value_of("STATISTICS_PATH").map(String::from);

    let mut environment = LiquidEnvironment::new(scene_config, params, LogSink::console(verbosity))?;
    environment.set_counters_enabled(counters_enabled);

    let mut total_duration: Duration = Duration::from_nanos(0);
    let mut frame_number = 0;
    let mut dt = params.initial_time_step;

    if let Some(dir) = &snapshot_dir {
        write_snapshot(&environment, dir, frame_number, &visualization_params)?;
    }

    while environment.time() < max_seconds {
        let a = Instant::now();
        dt = environment.step_forward(dt);
        let b = Instant::now();

        total_duration += b - a;
        frame_number += 1;

        let grid = environment.grid();
        let pressure_iterations = environment
            .last_outcome()
            .map(|outcome| outcome.pressure.iterations)
            .unwrap_or(0);
        println!(
            "{:05}: t={:.4}s next dt={:.5} {} particles {} full {} surface {} pressure sweeps {}msec ({}msec AVG)",
            frame_number,
            environment.time(),
            dt,
            environment.particles().len(),
            grid.count_cells_with_status(CellStatus::Full),
            grid.count_cells_with_status(CellStatus::Surface),
            pressure_iterations,
            (b - a).as_secs_f32() * 1000.,
            total_duration.as_secs_f32() * 1000. / frame_number as f32,
        );

        if let Some(dir) = &snapshot_dir {
            if frame_number % snapshot_every == 0 {
                write_snapshot(&environment, dir, frame_number, &visualization_params)?;
            }
        }
    }

    if counters_enabled {
        let s = write_statistics(&environment);
        print!("{}", s);
        if let Some(statistics_path) = statistics_path_opt {
            std::fs::write(&statistics_path, s)
                .with_context(|| format!("failed writing statistics to `{}`", statistics_path))?;
        }
    }

    Ok(())
}

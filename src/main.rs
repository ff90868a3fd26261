use clap::{App, AppSettings, Arg, SubCommand};
use tracing_subscriber::EnvFilter;

use grid_sph::{FluidSimulation, SimulationConfig};

const CARGO_PKG_VERSION: &'static str = env!("CARGO_PKG_VERSION");
const CARGO_PKG_DESCRIPTION: &'static str = env!("CARGO_PKG_DESCRIPTION");

fn main() {
    let matches = App::new("Grid SPH Simulation")
        .version(CARGO_PKG_VERSION)
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
                .about("Run a headless simulation with the given scenario")
                .arg(
                    Arg::with_name("SCENARIO_CONFIG")
                        .help("YAML scenario file with the simulation parameters")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("MAX_FRAMES")
                        .long("max-frames")
                        .short("n")
                        .takes_value(true)
                        .default_value("1000")
                        .help("Stop after the given number of frames"),
                )
                .arg(
                    Arg::with_name("TIME_STEP")
                        .long("dt")
                        .takes_value(true)
                        .default_value("0.01")
                        .help("Fixed time step per frame in seconds"),
                )
                .arg(
                    Arg::with_name("STATS_INTERVAL")
                        .long("stats-interval")
                        .takes_value(true)
                        .default_value("10")
                        .help("Print diagnostics every n-th frame"),
                ),
        )
        .get_matches();

    let default_level = match matches.occurrences_of("v") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Some(run_matches) = matches.subcommand_matches("run") {
        let scenario_file = run_matches
            .value_of("SCENARIO_CONFIG")
            .expect("missing scenario config");
        let scenario_yaml =
            std::fs::read_to_string(scenario_file).expect("failed reading scenario file");
        let config: SimulationConfig =
            serde_yaml::from_str(&scenario_yaml).expect("failed parsing scenario file");
        println!("{:?}", config);

        let max_frames: usize = run_matches
            .value_of("MAX_FRAMES")
            .unwrap()
            .parse()
            .expect("failed parsing --max-frames");
        let dt: f64 = run_matches
            .value_of("TIME_STEP")
            .unwrap()
            .parse()
            .expect("failed parsing --dt");
        let stats_interval: usize = run_matches
            .value_of("STATS_INTERVAL")
            .unwrap()
            .parse()
            .expect("failed parsing --stats-interval");
        assert!(dt > 0., "--dt must be positive");
        assert!(stats_interval > 0, "--stats-interval must be positive");

        let mut simulation = FluidSimulation::new(&config).unwrap_or_else(|err| {
            panic!("invalid scenario: {}", err);
        });

        let start = std::time::Instant::now();
        for _ in 0..max_frames {
            simulation.step(dt as grid_sph::floating_type_mod::FT);

            if simulation.frame() % stats_interval == 0 {
                println!(
                    "frame {:>6} | t={:8.3}s | kinetic energy {:12.4} | mean density {:10.2}",
                    simulation.frame(),
                    simulation.time(),
                    simulation.kinetic_energy(),
                    simulation.mean_density(),
                );
            }
        }

        let elapsed = start.elapsed();
        println!(
            "simulated {} frames of {} particles in {:.2}s ({:.1} frames/s)",
            max_frames,
            simulation.num_particles(),
            elapsed.as_secs_f64(),
            max_frames as f64 / elapsed.as_secs_f64(),
        );
    }
}

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{arg, ArgAction, ArgMatches, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use tsp_anneal::config::PointSource;
use tsp_anneal::experiment::{self, ExperimentConfig};
use tsp_anneal::harness;
use tsp_anneal::moves::MoveClass;
use tsp_anneal::pool::{PoolConfig, WalkerPool};
use tsp_anneal::problem::Problem;
use tsp_anneal::report::{self, DiagnosticsFormat};
use tsp_anneal::sa::{AnnealParams, CoolingSchedule};

fn problem_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(-f --dat <FILE> "Points file (CSV: label,x,y with a header line)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(--poly <N> "Use a regular polygon with N vertices instead of a file")
            .value_parser(clap::value_parser!(usize)),
    )
}

fn anneal_args(cmd: Command, walkers: &'static str, temperature: &'static str) -> Command {
    cmd.arg(
        arg!(--mc [MOVES] "Move class: reverse or swap")
            .default_value("reverse")
            .value_parser(clap::value_parser!(String)),
    )
    .arg(
        arg!(--sched [SCHEDULE] "Cooling schedule: std or sigmage")
            .default_value("std")
            .value_parser(clap::value_parser!(String)),
    )
    .arg(
        arg!(--temp [TEMP] "Initial temperature")
            .default_value(temperature)
            .value_parser(clap::value_parser!(f64)),
    )
    .arg(
        arg!(--cool [FACTOR] "Cooling factor")
            .default_value("0.9")
            .value_parser(clap::value_parser!(f64)),
    )
    .arg(
        arg!(--per [ITERS] "Iterations per temperature period")
            .default_value("10000")
            .value_parser(clap::value_parser!(usize)),
    )
    .arg(
        arg!(--nw [WALKERS] "Number of concurrent walkers")
            .default_value(walkers)
            .value_parser(clap::value_parser!(usize)),
    )
    .arg(arg!(--seed <SEED> "Base random seed").value_parser(clap::value_parser!(u64)))
}

fn cli() -> Command {
    Command::new("tsp-anneal")
        .about("Parallel simulated annealing for the travelling salesman problem")
        .arg_required_else_help(true)
        .arg(arg!(-v --verbose "Log per-period progress").global(true))
        .subcommand(anneal_args(
            problem_args(Command::new("search").about("Searches for a short tour")),
            "1",
            "4.0",
        )
        .arg(
            arg!(--niters [ITERS] "Iteration budget per walker")
                .default_value("1000000")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--cd [PERIODS] "Stop after this many periods without improvement (0 disables)")
                .default_value("400")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(-o --out [FILE] "Route output file")
                .default_value("route.txt")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(arg!(--pr "Print the route using point labels").action(ArgAction::SetTrue)))
        .subcommand(anneal_args(
            problem_args(Command::new("explore").about("Samples energies at fixed temperature stages")),
            "2",
            "1.0",
        )
        .arg(
            arg!(--nj [JOBS] "Temperature stages per walker")
                .default_value("1")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--burnin [ITERS] "Unsampled iterations before each stage")
                .default_value("0")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--srate [STRIDE] "Record the energy every STRIDE iterations")
                .default_value("100")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(-o --out [FILE] "Diagnostics CSV output file")
                .default_value("data.csv")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--route <FILE> "Also write the best route to FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(arg!(--iteration "Add an iteration column to the diagnostics").action(ArgAction::SetTrue)))
        .subcommand(
            Command::new("experiment")
                .about("Collects search results on random polygons with random parameters")
                .arg(
                    arg!(--runs [N] "Number of experiments")
                        .default_value("100")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--min [N] "Smallest polygon size")
                        .default_value("100")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--max [N] "Upper bound on polygon size")
                        .default_value("5000")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--niters [ITERS] "Iteration budget per experiment")
                        .default_value("100000000")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--mc [MOVES] "Move class: reverse or swap")
                        .default_value("reverse")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--sched [SCHEDULE] "Cooling schedule: std or sigmage")
                        .default_value("std")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(arg!(--seed <SEED> "Random seed").value_parser(clap::value_parser!(u64)))
                .arg(
                    arg!(-o --out [FILE] "Experiment CSV output file")
                        .default_value("polydata.csv")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("selftest")
                .about("Checks move deltas and times move operations")
                .arg(
                    arg!(-n --points [N] "Polygon size to test on")
                        .default_value("100")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--trials [N] "Random operations per check")
                        .default_value("1000000")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--tolerance [EPS] "Allowed delta disagreement")
                        .default_value("1e-9")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(arg!(--seed <SEED> "Random seed").value_parser(clap::value_parser!(u64))),
        )
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    if let Err(e) = match matches.subcommand() {
        Some(("search", sub_m)) => search(sub_m),
        Some(("explore", sub_m)) => explore(sub_m),
        Some(("experiment", sub_m)) => run_experiments(sub_m),
        Some(("selftest", sub_m)) => selftest(sub_m),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Reads an argument that has a default value.
fn value<T: Clone + Send + Sync + 'static>(m: &ArgMatches, id: &str) -> Result<T> {
    m.get_one::<T>(id)
        .cloned()
        .ok_or_else(|| anyhow!("missing argument --{id}"))
}

fn moves_arg(m: &ArgMatches) -> Result<MoveClass> {
    Ok(value::<String>(m, "mc")?.parse()?)
}

fn schedule_arg(m: &ArgMatches) -> Result<CoolingSchedule> {
    Ok(value::<String>(m, "sched")?.parse()?)
}

fn load_problem(m: &ArgMatches) -> Result<Problem> {
    let source = PointSource::resolve(m.get_one::<PathBuf>("dat").cloned(), m.get_one::<usize>("poly").copied())?;
    source
        .load()
        .with_context(|| format!("failed to load problem from {source}"))
}

fn anneal_params(m: &ArgMatches) -> Result<AnnealParams> {
    let mut params = AnnealParams::default()
        .with_temperature(value(m, "temp")?)
        .with_cooling(value(m, "cool")?)
        .with_period(value(m, "per")?)
        .with_schedule(schedule_arg(m)?);
    if let Some(&seed) = m.get_one::<u64>("seed") {
        params = params.with_seed(seed);
    }
    Ok(params)
}

/// Output files of a search or explore run, opened before any walker starts.
struct Outputs {
    main: (PathBuf, BufWriter<File>),
    route: Option<(PathBuf, BufWriter<File>)>,
}

fn open_output(path: &Path) -> Result<(PathBuf, BufWriter<File>)> {
    Ok((path.to_path_buf(), report::create(path)?))
}

fn prepare_outputs(main: &Path, route: Option<&Path>) -> Result<Outputs> {
    Ok(Outputs {
        main: open_output(main)?,
        route: route.map(open_output).transpose()?,
    })
}

fn search(m: &ArgMatches) -> Result<()> {
    let problem = load_problem(m)?;
    let params = anneal_params(m)?
        .with_max_iterations(value(m, "niters")?)
        .with_countdown(value(m, "cd")?);
    let config = PoolConfig::default()
        .with_walkers(value(m, "nw")?)
        .with_moves(moves_arg(m)?)
        .with_params(params);
    let out: PathBuf = value(m, "out")?;
    let (out, file) = prepare_outputs(&out, None)?.main;

    let result = WalkerPool::search(&problem, &config)?;
    report::write_route_to(file, &result.best_tour)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Best distance found: {}", result.best_energy);
    if m.get_flag("pr") {
        println!("{}", report::format_route(&result.best_tour, problem.labels()));
    }
    println!("Route written to {}", out.display());
    Ok(())
}

fn explore(m: &ArgMatches) -> Result<()> {
    let problem = load_problem(m)?;
    let params = anneal_params(m)?
        .with_burnin(value(m, "burnin")?)
        .with_sample_stride(value(m, "srate")?);
    let config = PoolConfig::default()
        .with_walkers(value(m, "nw")?)
        .with_jobs(value(m, "nj")?)
        .with_moves(moves_arg(m)?)
        .with_params(params);
    let format = if m.get_flag("iteration") {
        DiagnosticsFormat::WithIteration
    } else {
        DiagnosticsFormat::Plain
    };
    let out: PathBuf = value(m, "out")?;
    let outputs = prepare_outputs(&out, m.get_one::<PathBuf>("route").map(PathBuf::as_path))?;

    let result = WalkerPool::explore(&problem, &config)?;
    let (out, file) = outputs.main;
    report::write_diagnostics_to(file, &result.records, format)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Best distance found: {}", result.best_energy);
    println!("{} samples written to {}", result.records.len(), out.display());
    if let Some((route, file)) = outputs.route {
        report::write_route_to(file, &result.best_tour)
            .with_context(|| format!("failed to write {}", route.display()))?;
        println!("Route written to {}", route.display());
    }
    Ok(())
}

fn run_experiments(m: &ArgMatches) -> Result<()> {
    let mut config = ExperimentConfig::default()
        .with_runs(value(m, "runs")?)
        .with_points(value(m, "min")?, value(m, "max")?)
        .with_max_iterations(value(m, "niters")?)
        .with_moves(moves_arg(m)?)
        .with_schedule(schedule_arg(m)?);
    if let Some(&seed) = m.get_one::<u64>("seed") {
        config = config.with_seed(seed);
    }

    let out: PathBuf = value(m, "out")?;
    let summary = experiment::run_batch_to_path(&config, &out)?;
    println!(
        "{} experiments written to {} ({} failed)",
        summary.completed,
        out.display(),
        summary.failed
    );
    Ok(())
}

fn selftest(m: &ArgMatches) -> Result<()> {
    let n: usize = value(m, "points")?;
    let trials: usize = value(m, "trials")?;
    let tolerance: f64 = value(m, "tolerance")?;
    let problem = Problem::polygon(n)?;
    let mut rng = match m.get_one::<u64>("seed") {
        Some(&seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut failed = false;
    for moves in [MoveClass::Reverse, MoveClass::Swap] {
        let t = harness::self_test(&problem, moves, trials, tolerance, &mut rng);
        println!("{moves}: {} of {} deltas off (max error {:e})", t.deltas.errors, t.deltas.trials, t.deltas.max_error);
        println!("  moves:           {:?}", t.move_time);
        println!("  deltas:          {:?}", t.delta_time);
        println!("  moves + energy:  {:?}", t.move_and_energy_time);
        failed |= !t.deltas.is_clean();
    }
    if failed {
        bail!("delta check failed");
    }
    Ok(())
}

//! Solve one of the bundled games and print the average strategy.
//!
//! Usage:
//!   cargo run --release --bin solve -- <GAME> [OPTIONS]
//!
//! Games: signaling, kuhn, settlement
//!
//! Options:
//!   --config <FILE>      Configuration JSON file (optional)
//!   --iterations <N>     Number of iterations (default: 10000)
//!   --seed <N>           Random seed (optional)
//!   --output <FILE>      Write the strategy snapshot as JSON
//!   --checkpoint <FILE>  Write the solver state after training
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

use std::env;
use std::process::ExitCode;

use extensive_cfr::cfr::{CFRConfig, CFRSolver, Game, SolverError};
use extensive_cfr::games::kuhn::KuhnPoker;
use extensive_cfr::games::settlement::SettlementGame;
use extensive_cfr::games::signaling::SignalingGame;

struct Options {
    game: String,
    config_file: Option<String>,
    iterations: u64,
    seed: Option<u64>,
    output_file: Option<String>,
    checkpoint_file: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_args(env::args().skip(1).collect()) {
        Some(options) => options,
        None => {
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let result = match options.game.as_str() {
        "signaling" => run(SignalingGame::new(), &options),
        "kuhn" => run(KuhnPoker::new(), &options),
        "settlement" => run(SettlementGame::new(), &options),
        other => {
            eprintln!("Unknown game: {}", other);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Option<Options> {
    let mut options = Options {
        game: String::new(),
        config_file: None,
        iterations: 10_000,
        seed: None,
        output_file: None,
        checkpoint_file: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                options.config_file = Some(args.get(i)?.clone());
            }
            "--iterations" | "-i" => {
                i += 1;
                options.iterations = args.get(i)?.parse().ok()?;
            }
            "--seed" | "-s" => {
                i += 1;
                options.seed = Some(args.get(i)?.parse().ok()?);
            }
            "--output" | "-o" => {
                i += 1;
                options.output_file = Some(args.get(i)?.clone());
            }
            "--checkpoint" => {
                i += 1;
                options.checkpoint_file = Some(args.get(i)?.clone());
            }
            "--help" | "-h" => return None,
            name if options.game.is_empty() && !name.starts_with('-') => {
                options.game = name.to_string();
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                return None;
            }
        }
        i += 1;
    }

    (!options.game.is_empty()).then_some(options)
}

fn run<G: Game>(game: G, options: &Options) -> Result<(), SolverError> {
    let mut config = match &options.config_file {
        Some(path) => {
            log::info!("loading configuration from {}", path);
            CFRConfig::from_json_file(path)?
        }
        None => CFRConfig::default(),
    };
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    if config.report_interval == 0 {
        config.report_interval = (options.iterations / 10).max(1);
    }

    let mut solver = CFRSolver::new(game, config)?;
    let stats = solver.train(options.iterations);
    println!(
        "Trained {} iterations, {} info sets in {:.2}s ({:.0} it/s)",
        stats.iterations, stats.info_sets, stats.elapsed_seconds, stats.iterations_per_second
    );

    let values = solver.average_strategy_values();
    let exploitability = solver.calculate_exploitability();
    println!("Values: {:?}", values);
    println!("Exploitability: {:.6}", exploitability);
    println!();

    let snapshot = solver.snapshot();
    for entry in &snapshot.strategies {
        let decision = solver.game().catalog().decision(entry.decision_index);
        let actions: Vec<String> = decision
            .actions()
            .zip(&entry.average_strategy)
            .map(|(a, p)| format!("{}={:.3}", solver.game().action_name(entry.decision_index, a), p))
            .collect();
        println!("{:<24} {:<12} {}", entry.key.to_string(), decision.name, actions.join(" "));
    }

    if let Some(path) = &options.output_file {
        std::fs::write(path, snapshot.to_json()?)?;
        log::info!("strategy snapshot written to {}", path);
    }
    if let Some(path) = &options.checkpoint_file {
        solver.save_checkpoint(path)?;
        log::info!("checkpoint written to {}", path);
    }
    Ok(())
}

fn print_help() {
    println!("Usage: solve <signaling|kuhn|settlement> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config, -c <FILE>      Configuration JSON file");
    println!("  --iterations, -i <N>     Number of iterations (default: 10000)");
    println!("  --seed, -s <N>           Random seed");
    println!("  --output, -o <FILE>      Write the strategy snapshot as JSON");
    println!("  --checkpoint <FILE>      Write the solver state after training");
    println!("  --help, -h               Show this help");
}

//! One-shot CLI: read an analysis request as JSON, print the response.
//!
//! ```text
//! voltorb-analyze --input board.json --mode profit --seed 42 --pretty
//! ```
//!
//! With no `--input`, the request is read from stdin.

use std::io::Read;

use voltorb::engine;
use voltorb::types::{AnalyzeConfig, AnalyzeRequest, Mode};

struct Args {
    input: Option<String>,
    mode: Option<Mode>,
    seed: Option<u64>,
    budget: Option<usize>,
    wallclock_ms: Option<u64>,
    pretty: bool,
}

fn usage() -> ! {
    println!(
        "Usage: voltorb-analyze [--input FILE] [--mode level|profit] [--seed S] \
         [--budget N] [--wallclock MS] [--pretty]"
    );
    println!();
    println!("Options:");
    println!("  --input FILE   Request JSON file (default: stdin)");
    println!("  --mode MODE    Override the request's objective");
    println!("  --seed S       RNG seed for reproducible marginals");
    println!("  --budget N     Sampling attempt cap (default: 20000)");
    println!("  --wallclock MS Estimator deadline in ms (default: 2000)");
    println!("  --pretty       Pretty-print the response JSON");
    std::process::exit(0);
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args {
        input: None,
        mode: None,
        seed: None,
        budget: None,
        wallclock_ms: None,
        pretty: false,
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--input" => {
                i += 1;
                if i < argv.len() {
                    args.input = Some(argv[i].clone());
                }
            }
            "--mode" => {
                i += 1;
                args.mode = match argv.get(i).map(String::as_str) {
                    Some("level") => Some(Mode::Level),
                    Some("profit") => Some(Mode::Profit),
                    other => {
                        eprintln!("Invalid --mode value: {:?}", other.unwrap_or(""));
                        std::process::exit(1);
                    }
                };
            }
            "--seed" => {
                i += 1;
                if i < argv.len() {
                    args.seed = Some(argv[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --seed value: {}", argv[i]);
                        std::process::exit(1);
                    }));
                }
            }
            "--budget" => {
                i += 1;
                if i < argv.len() {
                    args.budget = Some(argv[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --budget value: {}", argv[i]);
                        std::process::exit(1);
                    }));
                }
            }
            "--wallclock" => {
                i += 1;
                if i < argv.len() {
                    args.wallclock_ms = Some(argv[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --wallclock value: {}", argv[i]);
                        std::process::exit(1);
                    }));
                }
            }
            "--pretty" => args.pretty = true,
            "--help" | "-h" => usage(),
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!(
                    "Usage: voltorb-analyze [--input FILE] [--mode level|profit] [--seed S] \
                     [--budget N] [--wallclock MS] [--pretty]"
                );
                std::process::exit(1);
            }
        }
        i += 1;
    }

    args
}

fn read_request(input: &Option<String>) -> AnalyzeRequest {
    let text = match input {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            if std::io::stdin().read_to_string(&mut buf).is_err() {
                eprintln!("Failed to read request from stdin");
                std::process::exit(1);
            }
            buf
        }
    };

    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Invalid request JSON: {}", e);
        std::process::exit(1);
    })
}

fn main() {
    let args = parse_args();
    voltorb::env_config::init_rayon_threads_lenient();

    let mut request = read_request(&args.input);
    if let Some(mode) = args.mode {
        request.mode = mode;
    }

    let mut config = AnalyzeConfig {
        seed: args.seed,
        ..AnalyzeConfig::default()
    };
    if let Some(budget) = args.budget {
        config.sample_budget = budget;
    }
    if let Some(wallclock_ms) = args.wallclock_ms {
        config.wallclock_ms = wallclock_ms;
    }

    match engine::analyze(&request, &config) {
        Ok(response) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&response)
            } else {
                serde_json::to_string(&response)
            };
            match json {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Failed to serialize response: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(error) => {
            eprintln!("Analysis failed: {}", error);
            std::process::exit(1);
        }
    }
}

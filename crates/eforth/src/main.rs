//! eForth terminal binary.
//!
//! Interactive REPL over stdin/stdout by default; `--eval` and `--file` run
//! scripted sessions.

use std::path::PathBuf;
use std::process;

use eforth::{Eforth, EforthConfig, ScriptConsole, StdioConsole};

struct CliArgs {
    eval: Option<String>,
    file: Option<PathBuf>,
    memory: usize,
    words: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        eval: None,
        file: None,
        memory: 0x1_0000,
        words: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--eval" | "-e" => {
                i += 1;
                cli.eval = args.get(i).cloned();
            }
            "--file" | "-f" => {
                i += 1;
                cli.file = args.get(i).map(PathBuf::from);
            }
            "--memory" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    match s.parse() {
                        Ok(n) => cli.memory = n,
                        Err(_) => {
                            eprintln!("Invalid --memory value: {s}");
                            process::exit(1);
                        }
                    }
                }
            }
            "--words" => {
                cli.words = true;
            }
            "--help" | "-h" => {
                eprintln!("Usage: eforth [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --eval <line>    Evaluate one line and print the output");
                eprintln!("  --file <path>    Evaluate a file, then read stdin");
                eprintln!("  --memory <n>     Memory image size in bytes, power of two [default: 65536]");
                eprintln!("  --words          List the kernel vocabulary and exit");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();
    let config = EforthConfig {
        memory_bytes: cli.memory,
        ..EforthConfig::default()
    };

    if !cli.memory.is_power_of_two() {
        eprintln!("--memory must be a power of two, got {}", cli.memory);
        process::exit(1);
    }

    if cli.words {
        let forth = Eforth::new(&config, ScriptConsole::new(""));
        for name in forth.words() {
            println!("{name}");
        }
        return;
    }

    if let Some(line) = cli.eval {
        let mut script = line;
        if !script.ends_with('\n') {
            script.push('\n');
        }
        let mut forth = Eforth::scripted(&config, &script);
        forth.run();
        print!("{}", forth.output());
        return;
    }

    let mut console = StdioConsole::new();
    if let Some(ref path) = cli.file {
        match std::fs::read(path) {
            Ok(bytes) => console.feed(&bytes),
            Err(e) => {
                eprintln!("Failed to read {}: {e}", path.display());
                process::exit(1);
            }
        }
    }

    let mut forth = Eforth::new(&config, console);
    forth.run();
}

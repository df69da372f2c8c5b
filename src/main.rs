//! Command-line interface for graphmaster-rs
//!
//! Usage:
//!   graphmaster --rules bot.tsv [OPTIONS] <INPUT>
//!   echo "my name is Bob" | graphmaster --rules bot.tsv
//!
//! Each input is matched against the loaded rules and the winning category is
//! printed as `template<TAB>path<TAB>stars`, or as JSON with `--json`.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use graphmaster_rs::{Graphmaster, GraphmasterBuilder, Match, Responder, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "graphmaster", version, about = "Match input against AIML categories")]
struct Args {
    /// Tab-separated rule file (repeatable)
    #[arg(short, long = "rules", value_name = "FILE")]
    rules: Vec<PathBuf>,

    /// JSON settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The bot's previous reply
    #[arg(long, default_value = "")]
    that: String,

    /// The current topic
    #[arg(long, default_value = "")]
    topic: String,

    /// Print each match as JSON
    #[arg(short, long)]
    json: bool,

    /// Evaluate templates and print replies instead of matches
    #[arg(long)]
    respond: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Input text; read one input per stdin line when omitted
    input: Option<String>,
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load(args: &Args) -> graphmaster_rs::Result<Graphmaster> {
    let settings = match &args.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };

    let mut builder = GraphmasterBuilder::new(settings);
    for path in &args.rules {
        builder.load_file(path)?;
    }

    let report = builder.report();
    if report.rejected > 0 {
        eprintln!("Warning: {} rule line(s) rejected", report.rejected);
    }
    Ok(builder.build())
}

fn print_match(m: &Match, json: bool) {
    if json {
        match serde_json::to_string(m) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}\t{}\t{}", m.template(), m.path(), m.input_stars().join("|"));
    }
}

fn handle(args: &Args, graphmaster: &Arc<Graphmaster>, responder: &Responder, input: &str) {
    if args.respond {
        match responder.respond(input, &args.that, &args.topic) {
            Ok(reply) => println!("{}", reply),
            Err(e) => eprintln!("Error: {}", e),
        }
        return;
    }

    match graphmaster.match_input(input, &args.that, &args.topic) {
        Ok(m) => print_match(&m, args.json),
        Err(e) if e.is_no_match() => println!(),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.rules.is_empty() {
        eprintln!("Error: at least one --rules file is required");
        process::exit(1);
    }

    let graphmaster = match load(&args) {
        Ok(gm) => Arc::new(gm),
        Err(e) => {
            eprintln!("Error loading rules: {}", e);
            process::exit(1);
        }
    };
    let responder = Responder::new(Arc::clone(&graphmaster));

    if let Some(input) = &args.input {
        handle(&args, &graphmaster, &responder, input);
        return;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(l) => handle(&args, &graphmaster, &responder, &l),
            Err(e) => {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
        }
    }
}

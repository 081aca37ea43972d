use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nvtrees::{Session, SessionConfig, TreePair};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "nvtrees", about = "Tree-pair arithmetic for the Thompson groups nV")]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Largest word length accepted by `\growth`.
    #[arg(long, global = true, default_value_t = 12)]
    max_growth_length: usize,
    /// Largest bound accepted by `\order`.
    #[arg(long, global = true, default_value_t = 64)]
    max_order: i64,
    /// Largest exponent magnitude accepted by `A^n`.
    #[arg(long, global = true, default_value_t = 1024)]
    max_power: i64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run session lines (statements separated by `;`, or `\` commands).
    Eval {
        /// Lines to execute in order.
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Run a script, one session line per line of input.
    Script {
        /// Script file (stdin when omitted).
        file: Option<PathBuf>,
    },
    /// Print a random tree pair.
    Random {
        /// Number of leaves in each tree.
        #[arg(long)]
        leaves: usize,
        /// Colours to draw carets from (1..=colors).
        #[arg(long, default_value_t = 2)]
        colors: usize,
        /// Seed for a reproducible pair.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the canonical form of a tree pair.
    Reduce {
        /// Pair as `left,right,perm` (braces optional).
        pair: String,
        /// Stop at the smallest grid instead of merging blocks.
        #[arg(long)]
        grid_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = SessionConfig {
        max_growth_length: cli.max_growth_length,
        max_order: cli.max_order,
        max_power: cli.max_power,
        ..SessionConfig::default()
    };

    match cli.command {
        Commands::Eval { lines } => run_eval(config, &lines)?,
        Commands::Script { file } => run_script(config, file)?,
        Commands::Random {
            leaves,
            colors,
            seed,
        } => run_random(leaves, colors, seed)?,
        Commands::Reduce { pair, grid_only } => run_reduce(&pair, grid_only)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn run_eval(config: SessionConfig, lines: &[String]) -> Result<()> {
    let mut session = Session::new(config);
    for line in lines {
        execute_line(&mut session, line)
            .with_context(|| format!("failed to execute `{}`", line))?;
    }
    Ok(())
}

fn run_script(config: SessionConfig, file: Option<PathBuf>) -> Result<()> {
    let reader: Box<dyn BufRead> = match &file {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("failed to open script {}", path.display())
        })?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut session = Session::new(config);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        execute_line(&mut session, line)
            .with_context(|| format!("script line {}: `{}`", idx + 1, line))?;
    }
    Ok(())
}

fn execute_line(session: &mut Session, line: &str) -> Result<()> {
    for outcome in session.execute(line)? {
        println!("{}", outcome);
    }
    Ok(())
}

fn run_random(leaves: usize, colors: usize, seed: Option<u64>) -> Result<()> {
    let pair = match seed {
        Some(seed) => TreePair::random_with(leaves, colors, &mut StdRng::seed_from_u64(seed)),
        None => TreePair::random(leaves, colors),
    }
    .context("failed to build random tree pair")?;
    println!("{}", pair.to_literal());
    Ok(())
}

fn run_reduce(text: &str, grid_only: bool) -> Result<()> {
    let pair: TreePair = text
        .parse()
        .with_context(|| format!("failed to parse tree pair `{}`", text))?;
    let reduced = pair
        .reduce_with(!grid_only)
        .context("reduction failed")?;
    println!("{}", reduced.to_literal());
    Ok(())
}

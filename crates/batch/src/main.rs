//! Circle packing CLI

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use u_circlepack_batch::{BatchConfig, BatchResult, BatchRunner};
use u_circlepack_core::{Initialization, StepSchedule};

#[derive(Parser)]
#[command(name = "circlepack")]
#[command(about = "Pack N identical circles into the smallest square")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a range of N
    Run {
        #[command(flatten)]
        range: RangeArgs,

        /// Optimizer steps per N
        #[arg(long)]
        steps: Option<usize>,

        /// Base learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// Overlap penalty weight
        #[arg(long)]
        penalty: Option<f64>,

        /// Base random seed (N runs with seed + N)
        #[arg(long)]
        seed: Option<u64>,

        /// Initial placement
        #[arg(long, value_enum)]
        init: Option<InitArg>,

        /// Learning-rate schedule
        #[arg(long, value_enum)]
        schedule: Option<ScheduleArg>,

        /// Worker threads (0 = all cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Output file for the JSON report
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Write the deterministic line layout for a range of N
    Baseline {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Print a default TOML configuration
    InitConfig,
}

#[derive(Args)]
struct RangeArgs {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Smallest N
    #[arg(long)]
    min_n: Option<usize>,

    /// Largest N
    #[arg(long)]
    max_n: Option<usize>,

    /// Only run min_n, multiples of stride, and max_n
    #[arg(long)]
    stride: Option<usize>,

    /// Circle radius
    #[arg(long)]
    radius: Option<f64>,

    /// Output file for CSV layouts
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RangeArgs {
    fn load(&self) -> anyhow::Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_toml_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => BatchConfig::default(),
        };
        if let Some(min_n) = self.min_n {
            config.min_n = min_n;
        }
        if let Some(max_n) = self.max_n {
            config.max_n = max_n;
        }
        if let Some(stride) = self.stride {
            config.stride = Some(stride);
        }
        if let Some(radius) = self.radius {
            config.pack.radius = radius;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InitArg {
    /// Random normal start, spread growing with N
    Gaussian,
    /// Objects on a line, 4r apart
    Line,
    /// Square grid, 2r apart
    Grid,
}

impl From<InitArg> for Initialization {
    fn from(arg: InitArg) -> Self {
        match arg {
            InitArg::Gaussian => Initialization::default(),
            InitArg::Line => Initialization::line(),
            InitArg::Grid => Initialization::grid(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScheduleArg {
    /// Fixed learning rate
    Constant,
    /// Cosine annealing to 1% of the base rate
    Cosine,
    /// Exponential decay to 1% of the base rate
    Exponential,
}

impl ScheduleArg {
    fn schedule(self, steps: usize) -> StepSchedule {
        match self {
            ScheduleArg::Constant => StepSchedule::Constant,
            ScheduleArg::Cosine => StepSchedule::Cosine { min_factor: 0.01 },
            ScheduleArg::Exponential => StepSchedule::Exponential {
                decay: 0.01f64.powf(1.0 / steps.max(1) as f64),
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            range,
            steps,
            lr,
            penalty,
            seed,
            init,
            schedule,
            threads,
            json,
        } => {
            let mut config = range.load()?;
            if let Some(steps) = steps {
                config.pack.steps = steps;
            }
            if let Some(lr) = lr {
                config.pack.learning_rate = lr;
            }
            if let Some(penalty) = penalty {
                config.pack.penalty_weight = penalty;
            }
            if let Some(seed) = seed {
                config.pack.seed = Some(seed);
            }
            if let Some(init) = init {
                config.pack.initialization = init.into();
            }
            if let Some(schedule) = schedule {
                config.pack.schedule = schedule.schedule(config.pack.steps);
            }
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if let Some(json) = json {
                config.json = Some(json);
            }

            let runner = BatchRunner::new(config);
            let result = runner.run()?;
            write_outputs(runner.config(), &result)?;
        }

        Commands::Baseline { range } => {
            let config = range.load()?;
            let runner = BatchRunner::new(config);
            let result = runner.run_baseline()?;
            write_outputs(runner.config(), &result)?;
        }

        Commands::InitConfig => {
            print!("{}", BatchConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}

fn write_outputs(config: &BatchConfig, result: &BatchResult) -> anyhow::Result<()> {
    result.print_summary();

    result
        .save_csv(&config.output)
        .with_context(|| format!("failed to write {}", config.output.display()))?;
    println!("CSV saved to: {}", config.output.display());

    if let Some(path) = &config.json {
        result
            .save_json(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

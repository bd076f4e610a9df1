//! dice-formula - roll dice formulas from the command line

use anyhow::{bail, Context, Result};
use clap::Parser;
use dice_formula::{is_valid, parse_with, ModeRoll, ParseOptions, RollMode};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "dice-formula", version, about = "Roll dice formulas such as 2d6+3 or 1d20-1d4")]
struct Args {
    /// Formula to roll
    formula: String,

    /// normal, advantage or disadvantage
    #[arg(short, long, env = "DICE_MODE", default_value_t = RollMode::Normal)]
    mode: RollMode,

    /// Fail on text that is not part of any term instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Seed for reproducible rolls
    #[arg(long, env = "DICE_SEED")]
    seed: Option<u64>,

    /// How many times to roll
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: u32,

    /// Print one JSON object per roll
    #[arg(long)]
    json: bool,

    /// Only check that the formula is usable, without rolling
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dice_formula=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let options = if args.strict {
        ParseOptions::strict()
    } else {
        ParseOptions::lenient()
    };

    let formula = parse_with(&args.formula, options)
        .with_context(|| format!("cannot parse '{}'", args.formula))?;

    if args.check {
        if !is_valid(&args.formula) {
            bail!("'{}' is not a usable formula", args.formula);
        }
        println!("{formula}");
        return Ok(());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    tracing::info!(formula = %formula, mode = %args.mode, seed = ?args.seed, "rolling");

    for _ in 0..args.repeat {
        let roll = formula.roll_with_mode(args.mode, &mut rng);

        if args.json {
            println!("{}", serde_json::to_string(&roll)?);
        } else {
            print_roll(&roll);
        }
    }

    Ok(())
}

fn print_roll(roll: &ModeRoll) {
    println!("{} = {}", roll.primary.breakdown, roll.primary.total);

    if let Some(secondary) = &roll.secondary {
        println!("  {} discarded: {} = {}", roll.mode, secondary.breakdown, secondary.total);
    }
}

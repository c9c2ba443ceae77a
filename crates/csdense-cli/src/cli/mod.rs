mod internal_text_size;
mod run;
mod sweep;

use anyhow::Context;
use internal_text_size::InternalTextSize;
use run::RunCommand;
use sweep::SweepCommand;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, clap::Parser)]
#[command(version, about, styles = clap::builder::Styles::styled())]
pub struct Cli {
    #[clap(flatten)]
    global_options: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let Cli {
            global_options,
            command,
        } = self;

        // The internal-text-size subcommand is invoked from the generated
        // interestingness predicate script, many times per iteration; it
        // has no use for structured logging and should stay as fast and
        // quiet as possible.
        match command {
            Command::InternalTextSize(cmd) => cmd.run(),
            Command::Run(cmd) => {
                setup_logger(&global_options).context("Setting up logger")?;
                cmd.run(global_options)
            }
            Command::Sweep(cmd) => {
                setup_logger(&global_options).context("Setting up logger")?;
                cmd.run(global_options)
            }
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct GlobalOptions {
    #[clap(long, default_value = "info")]
    pub default_log_level: LevelFilter,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Run a single density search.
    Run(RunCommand),
    /// Sweep one axis of the search configuration across several runs.
    Sweep(SweepCommand),
    /// Parse a compiled object's `.text` section size. Used internally by
    /// the interestingness predicate script; not part of the public CLI.
    #[command(hide = true, name = "internal-text-size")]
    InternalTextSize(InternalTextSize),
}

fn setup_logger(global_opts: &GlobalOptions) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_owned())))
        .with(
            EnvFilter::builder()
                .with_default_directive(global_opts.default_log_level.into())
                .from_env()
                .context("Constructing log filter from env.")?,
        )
        .init();

    Ok(())
}

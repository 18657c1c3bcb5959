/*!
 * Tether CLI - Command Line Interface
 */

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tether::{
    cli_style::{self, classes_table, format_step, members_table, section_header},
    config::TetherConfig,
    error::{Result, TetherError, EXIT_SUCCESS},
    logging,
    script::{self, Script},
    Session, SpecRegistry,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "tether")]
#[command(version, about = "Drive a supervised host through spec-driven remote object proxies", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Class/member specification (overrides config and TETHER_SPEC)
    #[arg(long, value_name = "FILE", global = true)]
    spec: Option<PathBuf>,

    /// Host executable (overrides config and TETHER_HOST_BIN)
    #[arg(long = "host-bin", value_name = "PATH", global = true)]
    host_bin: Option<PathBuf>,

    /// Root object kind: chromium, firefox or webkit
    #[arg(short = 't', long, global = true)]
    target: Option<String>,

    /// Fixed host port (default: pick a free one)
    #[arg(short = 'p', long, global = true)]
    port: Option<u16>,

    /// Launch with a visible window
    #[arg(long, global = true)]
    visible: bool,

    /// Debug logging for the client and the host
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the declared classes, or the members of one class
    Describe {
        /// Class to show
        class: Option<String>,
    },

    /// Launch a session and run a JSON script of steps against it
    Run {
        /// Script file
        script: PathBuf,

        /// Print each step result as a JSON line
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            cli_style::print_error(&e.to_string(), hint(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn hint(error: &TetherError) -> Option<&'static str> {
    match error {
        TetherError::Connect(e) if e.is_startup() => {
            Some("check --host-bin / TETHER_HOST_BIN and run with --debug to see host output")
        }
        TetherError::Spec(_) => Some("point --spec or TETHER_SPEC at a specification file"),
        _ => None,
    }
}

fn load_config(cli: &Cli) -> Result<TetherConfig> {
    let mut config = match cli.config {
        Some(ref path) => TetherConfig::from_file(path)?,
        None => TetherConfig::default(),
    };
    config.apply_env()?;

    if let Some(ref spec) = cli.spec {
        config.spec_path = spec.clone();
    }
    if let Some(ref program) = cli.host_bin {
        config.host_program = program.clone();
    }
    if let Some(ref target) = cli.target {
        config.target = target.clone();
    }
    if cli.port.is_some() {
        config.port = cli.port;
    }
    config.visible |= cli.visible;
    config.debug |= cli.debug;

    config.validate()?;
    Ok(config)
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init_logging(&config)?;

    let spec = SpecRegistry::load(&config.spec_path)?;
    info!(
        "Loaded {} classes from {}",
        spec.len(),
        config.spec_path.display()
    );

    match cli.command {
        Commands::Describe { class } => describe(&spec, class.as_deref()),
        Commands::Run { script, json } => run_script(&config, spec, &script, json),
    }
}

fn describe(spec: &SpecRegistry, class: Option<&str>) -> Result<()> {
    match class {
        None => {
            section_header("Classes");
            println!("{}", classes_table(spec));
        }
        Some(name) => {
            let class = spec
                .class(name)
                .ok_or_else(|| TetherError::Config(format!("Unknown class: {}", name)))?;
            section_header(&class.name);
            println!("{}", members_table(class));
        }
    }
    Ok(())
}

fn run_script(
    config: &TetherConfig,
    spec: SpecRegistry,
    path: &Path,
    as_json: bool,
) -> Result<()> {
    let script = Script::load(path)?;
    if script.is_empty() {
        cli_style::print_warning("Script has no steps");
    }

    let options = config.to_launch_options();
    let session_args = vec![json!({ "headless": !config.visible })];
    let root = Session::new(Arc::new(spec)).launch(&options, session_args)?;
    info!("Session root {} ({})", root.guid(), root.class_name());

    let outcome = script::run(&script, &root, |step| {
        if as_json {
            println!(
                "{}",
                json!({
                    "step": step.step,
                    "on": step.on,
                    "call": step.call,
                    "result": step.result,
                    "bind": step.bound,
                })
            );
        } else {
            println!("{}", format_step(step));
        }
    });

    // Close even when a step failed; the step error wins.
    let closed = root.close();
    outcome?;
    closed?;
    Ok(())
}

//! `dre` - terminal front-end for dispute resolution playback

mod config;
mod logging;
mod render;
mod session;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::{DreConfig, LoggingConfig};
use dre_core::{DisputeId, DisputeStatus, Snapshot};
use session::Session;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Largest accepted `--speed` factor
const MAX_SPEED: f64 = 100.0;

fn parse_speed(value: &str) -> Result<f64, String> {
    let speed: f64 = value.parse().map_err(|err| format!("{err}"))?;
    if (0.0..=MAX_SPEED).contains(&speed) {
        Ok(speed)
    } else {
        Err(format!("expected a factor between 0 and {MAX_SPEED}"))
    }
}

fn playback_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("speed")
            .long("speed")
            .value_parser(parse_speed)
            .help("Multiply every playback delay by this factor"),
    )
    .arg(
        Arg::new("instant")
            .long("instant")
            .action(ArgAction::SetTrue)
            .conflicts_with("speed")
            .help("Skip all playback delays"),
    )
}

fn cli() -> Command {
    Command::new("dre")
        .version(clap::crate_version!())
        .about("Invoice dispute resolution playback")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON snapshot to load instead of the built-in seed"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("list").about("List disputes").arg(
                Arg::new("status")
                    .long("status")
                    .value_parser(["open", "analyzing", "resolving", "resolved"])
                    .help("Only disputes with this status"),
            ),
        )
        .subcommand(
            Command::new("show")
                .about("Show a dispute, its invoice, and any correction")
                .arg(Arg::new("id").value_name("DISPUTE_ID").required(true)),
        )
        .subcommand(Command::new("stats").about("Dispute counts by status"))
        .subcommand(playback_args(
            Command::new("resolve")
                .about("Play the resolution for one dispute")
                .arg(Arg::new("id").value_name("DISPUTE_ID").required(true)),
        ))
        .subcommand(playback_args(
            Command::new("resolve-all").about("Resolve every open dispute in turn"),
        ))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<DreConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DreConfig::load(path)?,
        None => DreConfig::default(),
    };

    // only the playback subcommands define these
    if let Some((_, args)) = matches.subcommand() {
        let instant = args
            .try_get_one::<bool>("instant")
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false);
        if instant {
            config = config.with_time_scale(0.0);
        } else if let Ok(Some(speed)) = args.try_get_one::<f64>("speed") {
            config = config.with_time_scale(*speed);
        }
    }
    Ok(config)
}

fn load_snapshot(matches: &ArgMatches) -> anyhow::Result<Snapshot> {
    match matches.get_one::<PathBuf>("seed") {
        Some(path) => dre_fixtures::load_snapshot(path)
            .with_context(|| format!("loading seed {}", path.display())),
        None => dre_fixtures::embedded_snapshot().context("decoding built-in seed"),
    }
}

fn dispute_id(args: &ArgMatches) -> anyhow::Result<DisputeId> {
    args.get_one::<String>("id")
        .map(|id| DisputeId::new(id.as_str()))
        .context("missing dispute id")
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn run(matches: &ArgMatches, config: &DreConfig) -> anyhow::Result<()> {
    let mut session =
        Session::from_snapshot(load_snapshot(matches)?)?.with_script(config.playback.script());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match matches.subcommand() {
        Some(("list", args)) => {
            let status = args
                .get_one::<String>("status")
                .map(|s| s.parse::<DisputeStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            session.list(status, &mut out)?;
        }
        Some(("show", args)) => session.show(&dispute_id(args)?, &mut out)?,
        Some(("stats", _)) => session.stats(&mut out)?,
        Some(("resolve", args)) => {
            session.resolve(&dispute_id(args)?, &mut out, ctrl_c()).await?;
        }
        Some(("resolve-all", _)) => {
            let resolved = session.resolve_all(&mut out, ctrl_c).await?;
            writeln!(out, "Resolved {resolved} dispute(s).")?;
            session.stats(&mut out)?;
        }
        Some((other, _)) => anyhow::bail!("unknown command {other}"),
        None => anyhow::bail!("no command given"),
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(err) => {
            logging::init(&LoggingConfig::default());
            tracing::error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging);
    tracing::debug!(version = dre_core::VERSION, "dre starting");

    match run(&matches, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

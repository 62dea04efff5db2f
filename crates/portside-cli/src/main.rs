use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use portside::lifecycle;
use portside::options::{BuildInfo, ExternalTools, SessionOptions};
use portside::output::print_error;

/// Remote dev sessions over plain ssh
#[derive(Parser, Debug)]
#[command(name = "portside", version, about)]
struct Cli {
    /// Connection target: `user@host`, an ssh alias, or `gcp:<instance>`
    host: Option<String>,

    /// Remote directory to open the session in
    #[arg(default_value = "~")]
    dir: String,

    /// Skip settings and extensions sync
    #[arg(long)]
    skip_sync: bool,

    /// Mirror remote changes back to local datasets on shutdown
    #[arg(long)]
    sync_back: bool,

    /// Do not open a local viewer when the session is ready
    #[arg(long)]
    no_open: bool,

    /// Do not maintain a shared ssh connection for the session
    #[arg(long)]
    no_reuse_connection: bool,

    /// Local bind address, `host:port` with either side optional
    #[arg(short, long)]
    bind: Option<String>,

    /// Remote port for the server to listen on
    #[arg(long)]
    remote_port: Option<u16>,

    /// Extra flags passed to every ssh invocation
    #[arg(long, default_value = "", env = "PORTSIDE_SSH_FLAGS")]
    ssh_flags: String,

    /// Upload this local server binary instead of downloading a release
    #[arg(long)]
    upload_server: Option<std::path::PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let build = BuildInfo::current();
    tracing::debug!("portside {}", build.version);

    let Some(host) = cli.host else {
        print_error("no host provided; run `portside <host> [dir]`");
        std::process::exit(1);
    };

    let opts = SessionOptions {
        skip_sync: cli.skip_sync,
        sync_back: cli.sync_back,
        no_open: cli.no_open,
        reuse_connection: !cli.no_reuse_connection,
        bind_addr: cli.bind,
        remote_port: cli.remote_port,
        ssh_flags: cli.ssh_flags,
        upload_server: cli.upload_server,
    };
    let tools = ExternalTools::default();

    lifecycle::run_session(&host, &cli.dir, &opts, &tools)
        .await
        .with_context(|| format!("session against {} failed", host))?;
    Ok(())
}

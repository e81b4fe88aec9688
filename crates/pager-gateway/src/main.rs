use clap::Parser;
use pager_gateway::{GatewayArgs, Loops};

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    mode: Mode,
}

#[derive(clap::Subcommand, Debug)]
enum Mode {
    /// Deliver queued notifications to PagerDuty.
    Notifier(GatewayArgs),
    /// Acknowledge failing checks which were acknowledged on PagerDuty.
    AckFinder(GatewayArgs),
    /// Run both the notifier and the ack finder.
    Run(GatewayArgs),
}

fn main() -> Result<(), anyhow::Error> {
    // Use reasonable defaults for printing structured logs to stderr.
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(!matches!(std::env::var("NO_COLOR"), Ok(v) if v == "1"))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(runtime.spawn(async move {
        match cli.mode {
            Mode::Notifier(args) => pager_gateway::run(args, Loops::Notifier).await,
            Mode::AckFinder(args) => pager_gateway::run(args, Loops::AckFinder).await,
            Mode::Run(args) => pager_gateway::run(args, Loops::Both).await,
        }
    }));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    result?
}

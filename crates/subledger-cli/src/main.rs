use color_eyre::eyre::{Context, Result, eyre};
use owo_colors::OwoColorize;

use subledger_core::{ConfigStore, default_config_path};
use subledger_worker::SubledgerWorker;

mod app;
mod args;
mod modes;
mod output;
mod prompt;
mod setup;

use args::{Args, Mode, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .from_env_lossy()
                .add_directive("subledger_cli=info".parse()?)
                .add_directive("subledger_worker=info".parse()?)
                .add_directive("subledger_notify=info".parse()?)
                .add_directive("subledger_db=info".parse()?),
        )
        .init();

    let args = Args::from_env()?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path().wrap_err("Could not locate the config directory")?,
    };
    let mut config = ConfigStore::load(config_path);

    if args.mode == Mode::Setup {
        return setup::run(&mut config).await;
    }

    let settings = config
        .settings()
        .wrap_err_with(|| format!("Invalid configuration in {}", config.path().display()))?;

    let mut worker = SubledgerWorker::new(settings)
        .await
        .wrap_err("Failed to open the subscription database")?;

    let mut event_rx = worker
        .take_event_receiver()
        .ok_or_else(|| eyre!("Failed to get event receiver"))?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            output::event(event);
        }
    });

    println!("{}", "📈 Subscription register".bold().green());

    let result = match args.mode {
        Mode::App => app::run(&worker, &mut config).await,
        Mode::Scheduler => modes::scheduler(&worker).await,
        Mode::Test => modes::test(&worker).await,
        Mode::Setup => Ok(()),
    };

    worker.close().await;
    result
}

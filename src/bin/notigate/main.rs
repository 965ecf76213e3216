use anyhow::Result;
use notigate::harness::ModuleRunner;
use notigate::module::options::adopt_legacy_env;
use notigate::module::proxy::Proxy;
use options::{LogFormat, MainOptions};
use structopt::StructOpt;
use tracing::info;

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (options, runner) = init();

    let reason = runner.run(Proxy::new(options.proxy)).await;

    if reason.is_failure() {
        return Err(reason.into());
    }

    Ok(())
}

fn init() -> (MainOptions, ModuleRunner) {
    adopt_legacy_env();
    let options = MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log.as_str());

    match options.log_format {
        LogFormat::Text => formatter.init(),
        LogFormat::Compact => formatter.compact().init(),
        LogFormat::Json => formatter.json().init(),
    };

    let runner = match options.status_server {
        Some(port) => ModuleRunner::new_with_status_server(port),
        None => ModuleRunner::default(),
    };

    info!("notigate {}", env!("CARGO_PKG_VERSION"));

    (options, runner)
}

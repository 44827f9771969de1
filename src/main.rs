use handsort::cli::CliOverrides;
use handsort::run_with_overrides;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };

    let level = cli.log_level().and_then(|raw| raw.parse::<Level>().ok()).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(true).finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[log] failed to install subscriber: {err}");
    }

    let config_path = cli.config_path().cloned();
    if let Err(err) = run_with_overrides(config_path.as_deref(), cli.into_config_overrides()) {
        tracing::error!("Application error: {err:?}");
        std::process::exit(1);
    }
}

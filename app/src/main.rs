use flowpull_app::app::App;
use flowpull_app::config::AppConfig;
use flowpull_core::runner::Runner;
use std::env;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Install global log collector.
    tracing_subscriber::fmt::init();

    let config_path = env::var("CONFIG_PATH").expect("env variable CONFIG_PATH should be set");

    let config = config::Config::builder()
        .add_source(config::File::with_name(&config_path))
        .build()
        .and_then(|config| config.try_deserialize::<AppConfig>())
        .unwrap_or_else(|err| {
            error!("{:?}", err);
            process::exit(1);
        });

    if let Err(err) = (App { config }).run().await {
        error!("{:?}", err);
        process::exit(1);
    }
}

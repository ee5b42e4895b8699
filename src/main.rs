use log::error;
use macos_exporter_lib::config::EXPORTER_CONFIG;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = macos_exporter_lib::run(&EXPORTER_CONFIG).await {
        error!("{}", err);
        std::process::exit(1);
    }
}

use log::{error, info};

use serial_media::backend::select_backend;
use serial_media::banner::system_report;
use serial_media::command::Dispatcher;
use serial_media::config::BridgeConfig;
use serial_media::platform::Platform;
use serial_media::port::{list_ports, resolve_port};
use serial_media::serial::{PortSettings, SerialConnector, Supervisor};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BridgeConfig::default();
    let platform = Platform::current();
    let backend = select_backend(platform);
    for line in system_report(platform, &*backend) {
        info!("{}", line);
    }

    let port = match &config.port {
        Some(port) => port.clone(),
        None => resolve_port(&list_ports(), platform),
    };
    let settings = PortSettings::new(port).baud_rate(config.baud_rate);
    info!("Using {}", settings);

    let supervisor = Supervisor::new(
        SerialConnector::new(settings),
        Dispatcher::new(backend),
        config,
    );
    supervisor.run(shutdown_signal()).await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Interrupt received");
}

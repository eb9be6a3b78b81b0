use urprimary_transport::TcpTransport;

use crate::client::PrimaryClient;
use crate::config::ClientConfig;
use crate::dashboard::DashboardClient;
use crate::error::Result;

/// A primary client over TCP.
pub type TcpPrimaryClient = PrimaryClient<TcpTransport, DashboardClient>;

/// Connect to the controller at `host` on the default ports.
pub fn connect(host: impl Into<String>) -> Result<TcpPrimaryClient> {
    connect_with_config(ClientConfig::for_host(host))
}

/// Connect with explicit configuration. The returned client is started.
pub fn connect_with_config(config: ClientConfig) -> Result<TcpPrimaryClient> {
    let tcp = config.tcp_config();
    let stream = TcpTransport::with_config(config.host.clone(), config.primary_port, tcp.clone());
    let dashboard = DashboardClient::with_config(
        config.host.clone(),
        config.dashboard_port,
        tcp,
        config.dashboard_timeout(),
    );

    let mut client = PrimaryClient::new(stream, dashboard, config);
    client.start()?;
    Ok(client)
}

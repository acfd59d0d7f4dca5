//! Command-line arguments for the chat client.
use clap::Parser;
use notifier_common::net::{COMMAND_PORT, DATA_PORT};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Server IP address (IPv4 or IPv6) where the notifier is running.
    #[clap(long)]
    pub server_ip: String,

    /// Server TCP port for chat commands.
    #[clap(long, default_value_t = COMMAND_PORT)]
    pub command_port: u16,

    /// Server UDP port for keep-alive pings.
    #[clap(long, default_value_t = DATA_PORT)]
    pub data_port: u16,

    /// Local UDP port for receiving notifications; 0 picks a free one.
    #[clap(long, default_value_t = 0)]
    pub listen_port: u16,

    /// Chat handle to subscribe as.
    #[clap(long)]
    pub handle: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_ports_default_to_network_constants() {
        let args = Args::parse_from(["notifier_client", "--server-ip", "127.0.0.1", "--handle", "alice"]);
        assert_eq!(args.command_port, COMMAND_PORT);
        assert_eq!(args.data_port, DATA_PORT);
        assert_eq!(args.listen_port, 0);
    }

    #[test]
    fn server_ports_can_be_overridden() {
        let args = Args::parse_from([
            "notifier_client",
            "--server-ip",
            "10.0.0.2",
            "--handle",
            "bob",
            "--command-port",
            "9090",
            "--data-port",
            "9091",
        ]);
        assert_eq!(args.command_port, 9090);
        assert_eq!(args.data_port, 9091);
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use faultline_config::Config;

/// Faultline error-envelope server
#[derive(Debug, Parser)]
#[command(name = "faultline", about = "HTTP server that answers every failure with a uniform error envelope")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "faultline.toml", env = "FAULTLINE_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "FAULTLINE_LISTEN")]
    pub listen: Option<SocketAddr>,
}

impl Args {
    /// Apply command-line settings on top of the loaded configuration
    #[allow(clippy::missing_const_for_fn)]
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(listen) = self.listen {
            config.server.listen_address = Some(listen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["faultline"]).unwrap();
        assert_eq!(args.config, PathBuf::from("faultline.toml"));
        assert!(args.listen.is_none());
    }

    #[test]
    fn listen_override() {
        let args = Args::try_parse_from(["faultline", "-c", "/etc/faultline.toml", "--listen", "127.0.0.1:8080"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/faultline.toml"));
        assert_eq!(args.listen, Some(SocketAddr::from(([127, 0, 0, 1], 8080))));
    }

    #[test]
    fn listen_flag_overrides_config_file() {
        let mut config = Config::parse("[server]\nlisten_address = \"0.0.0.0:3000\"").unwrap();

        Args::try_parse_from(["faultline"]).unwrap().apply_overrides(&mut config);
        assert_eq!(config.server.listen_address, Some(SocketAddr::from(([0, 0, 0, 0], 3000))));

        Args::try_parse_from(["faultline", "--listen", "127.0.0.1:9090"])
            .unwrap()
            .apply_overrides(&mut config);
        assert_eq!(config.server.listen_address, Some(SocketAddr::from(([127, 0, 0, 1], 9090))));
    }
}

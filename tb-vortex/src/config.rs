//! Configuration for tb-vortex.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

use clap::Parser;
use thiserror::Error;

/// Vortex driver for the tb-rs TigerBeetle client.
///
/// Reads requests from stdin and writes responses to stdout. Logs go to
/// stderr.
#[derive(Parser, Debug)]
#[command(name = "tb-vortex")]
#[command(about = "Vortex driver for the tb-rs TigerBeetle client", long_about = None)]
pub struct Args {
    /// TigerBeetle cluster ID.
    pub cluster: u128,

    /// Comma-separated replica addresses. Each entry is `host:port`, an IP
    /// address with port, or a bare port on 127.0.0.1 (e.g. "3000,3001").
    pub addresses: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Startup errors. The driver exits before reading any request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The address list was empty.
    #[error("REPLICAS must list at least one address (comma-separated)")]
    NoAddresses,

    /// An address could not be parsed or resolved.
    #[error("invalid address '{address}': {source}")]
    InvalidAddress {
        /// The offending address.
        address: String,
        /// Parse or resolution failure.
        source: io::Error,
    },

    /// The host is big-endian.
    #[error("native byte order LITTLE_ENDIAN expected")]
    BigEndianHost,
}

/// Validated driver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TigerBeetle cluster ID.
    pub cluster: u128,
    /// Replica addresses, at least one.
    pub addresses: Vec<SocketAddr>,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        check_byte_order(cfg!(target_endian = "little"))?;
        Ok(Self {
            cluster: args.cluster,
            addresses: parse_addresses(&args.addresses)?,
        })
    }
}

/// The client serializes records in native byte order, so the wire's
/// little-endian layout only matches on little-endian hosts.
fn check_byte_order(little_endian: bool) -> Result<(), ConfigError> {
    if little_endian {
        Ok(())
    } else {
        Err(ConfigError::BigEndianHost)
    }
}

/// Parse a comma-separated address list, ignoring empty entries.
pub fn parse_addresses(addresses: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    let addresses = addresses
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            parse_address(s).map_err(|source| ConfigError::InvalidAddress {
                address: s.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<SocketAddr>, _>>()?;

    if addresses.is_empty() {
        return Err(ConfigError::NoAddresses);
    }
    Ok(addresses)
}

/// A bare port means the loopback host. Anything else must carry a port and
/// is resolved, keeping the first address.
fn parse_address(address: &str) -> io::Result<SocketAddr> {
    if let Ok(port) = address.parse::<u16>() {
        return Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, port)));
    }
    address.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no address found for host")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_positional() {
        let args = Args::try_parse_from([
            "tb-vortex",
            "340282366920938463463374607431768211455",
            "127.0.0.1:3000,127.0.0.1:3001",
        ])
        .unwrap();
        assert_eq!(args.cluster, u128::MAX);
        assert_eq!(args.log_level, "info");

        let config = Config::try_from(args).unwrap();
        assert_eq!(config.cluster, u128::MAX);
        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.addresses[1].port(), 3001);
    }

    #[test]
    fn test_args_require_both_positionals() {
        assert!(Args::try_parse_from(["tb-vortex", "0"]).is_err());
    }

    #[test]
    fn test_args_reject_non_decimal_cluster() {
        assert!(Args::try_parse_from(["tb-vortex", "0x10", "127.0.0.1:3000"]).is_err());
        assert!(Args::try_parse_from(["tb-vortex", "-1", "127.0.0.1:3000"]).is_err());
    }

    #[test]
    fn test_parse_addresses_empty() {
        assert!(matches!(parse_addresses(""), Err(ConfigError::NoAddresses)));
        assert!(matches!(parse_addresses(" , ,"), Err(ConfigError::NoAddresses)));
    }

    #[test]
    fn test_parse_addresses_invalid() {
        let err = parse_addresses("127.0.0.1:3000,not-an-address").unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::InvalidAddress { address, .. } if address == "not-an-address"
        ));
    }

    #[test]
    fn test_parse_addresses_bare_ports() {
        let addresses = parse_addresses("3000,3001").unwrap();
        assert_eq!(
            addresses,
            vec![
                "127.0.0.1:3000".parse::<SocketAddr>().unwrap(),
                "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_addresses_resolves_hostname() {
        let addresses = parse_addresses("localhost:3000").unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].port(), 3000);
        assert!(addresses[0].ip().is_loopback());
    }

    #[test]
    fn test_parse_addresses_rejects_out_of_range_port() {
        assert!(matches!(
            parse_addresses("70000"),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            parse_addresses("127.0.0.1:70000"),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_parse_addresses_trims() {
        let addresses = parse_addresses(" 127.0.0.1:3000 ,").unwrap();
        assert_eq!(addresses, vec!["127.0.0.1:3000".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_byte_order() {
        assert!(check_byte_order(true).is_ok());
        assert!(matches!(
            check_byte_order(false),
            Err(ConfigError::BigEndianHost)
        ));
    }
}

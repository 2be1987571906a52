//! Content store address normalization
//!
//! Store endpoints may be configured in multiaddr form
//! (`/dns/ipfs/tcp/5001`, `/dns/ipfs/tcp/5001/https`) or as a plain URL.
//! HTTP clients need the URL form, so multiaddrs are rewritten and
//! anything else is passed through untouched.

use crate::error::AddressError;

/// Normalize a store address into an HTTP(S) base URL
///
/// - `/dns/<host>/tcp/<port>` becomes `http://<host>:<port>`
/// - `/dns/<host>/tcp/<port>/https` becomes `https://<host>:<port>`
/// - a string not starting with `/` is returned unchanged
///
/// `dns4`, `dns6`, `ip4` and `ip6` are accepted in place of `dns`, and a
/// trailing `/http` is accepted explicitly.
pub fn normalize_store_address(address: &str) -> Result<String, AddressError> {
    let Some(rest) = address.strip_prefix('/') else {
        return Ok(address.to_string());
    };

    let segments: Vec<&str> = rest.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(AddressError::EmptySegment(address.to_string()));
    }

    let (protocol, host, transport, port, scheme) = match segments.as_slice() {
        [protocol, host, transport, port] => (*protocol, *host, *transport, *port, "http"),
        [protocol, host, transport, port, scheme] => (*protocol, *host, *transport, *port, *scheme),
        _ => return Err(AddressError::Unrecognized(address.to_string())),
    };

    if transport != "tcp" {
        return Err(AddressError::Unrecognized(address.to_string()));
    }

    let scheme = match scheme {
        "http" | "https" => scheme,
        _ => return Err(AddressError::Unrecognized(address.to_string())),
    };

    let host = match protocol {
        "dns" | "dns4" | "dns6" | "ip4" => host.to_string(),
        "ip6" => format!("[{}]", host),
        other => {
            return Err(AddressError::UnsupportedProtocol {
                protocol: other.to_string(),
                address: address.to_string(),
            })
        }
    };

    if port.parse::<u16>().is_err() {
        return Err(AddressError::InvalidPort {
            port: port.to_string(),
            address: address.to_string(),
        });
    }

    Ok(format!("{}://{}:{}", scheme, host, port))
}

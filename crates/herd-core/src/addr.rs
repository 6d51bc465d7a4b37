//! Address formatting helpers.

/// Format a host reference for use in a `host:port` endpoint.
///
/// IPv6 literals are bracketed so the port separator stays unambiguous;
/// hostnames and IPv4 addresses pass through unchanged.
pub fn scope_addr(addr: &str) -> String {
    if addr.contains(':') && !addr.starts_with('[') {
        format!("[{addr}]")
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_passes_through() {
        assert_eq!(scope_addr("worker-1.example.org"), "worker-1.example.org");
    }

    #[test]
    fn ipv4_passes_through() {
        assert_eq!(scope_addr("10.0.0.1"), "10.0.0.1");
    }

    #[test]
    fn ipv6_gets_bracketed() {
        assert_eq!(scope_addr("::1"), "[::1]");
        assert_eq!(scope_addr("fe80::1"), "[fe80::1]");
    }

    #[test]
    fn already_bracketed_left_alone() {
        assert_eq!(scope_addr("[::1]"), "[::1]");
    }
}

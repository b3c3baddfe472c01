//! IPv4 address and netmask helpers.

use std::net::Ipv4Addr;

pub fn is_valid_ipv4(text: &str) -> bool {
    text.parse::<Ipv4Addr>().is_ok()
}

/// True for a dotted netmask with contiguous leading one bits.
pub fn is_valid_netmask(text: &str) -> bool {
    match text.parse::<Ipv4Addr>() {
        Ok(mask) => {
            let bits = u32::from(mask);
            bits.leading_ones() + bits.trailing_zeros() == 32
        }
        Err(_) => false,
    }
}

/// Number of leading one bits in a dotted netmask.
pub fn mask_length(mask: &str) -> Option<u32> {
    if !is_valid_netmask(mask) {
        return None;
    }
    mask.parse::<Ipv4Addr>()
        .ok()
        .map(|mask| u32::from(mask).leading_ones())
}

/// Dotted netmask for a prefix length of at most 32.
pub fn netmask_from_length(length: u32) -> Option<String> {
    if length > 32 {
        return None;
    }
    let bits = if length == 0 {
        0
    } else {
        u32::MAX << (32 - length)
    };
    Some(Ipv4Addr::from(bits).to_string())
}

/// Network address of `ip` under `mask`.
pub fn network_of(ip: &str, mask: &str) -> Option<String> {
    let ip = u32::from(ip.parse::<Ipv4Addr>().ok()?);
    let mask = u32::from(mask.parse::<Ipv4Addr>().ok()?);
    Some(Ipv4Addr::from(ip & mask).to_string())
}

/// Split `a.b.c.d/len` into the address and a dotted netmask.
pub fn split_prefix(text: &str) -> Option<(String, String)> {
    let (addr, length) = text.split_once('/')?;
    if !is_valid_ipv4(addr) {
        return None;
    }
    let mask = netmask_from_length(length.parse().ok()?)?;
    Some((addr.to_string(), mask))
}

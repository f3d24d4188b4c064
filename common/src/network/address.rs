//! # Address Classification
//!
//! Decides which IPv4 addresses are worth a registry lookup.
//!
//! An address is **eligible** when it is globally reachable and not multicast.
//! Global reachability follows the IANA IPv4 special-purpose address registry:
//! an address is global unless it sits in the shared address space
//! (`100.64.0.0/10`) or in one of the non-global special-purpose blocks below.
//! Multicast (`224.0.0.0/4`) is not in that table, so it counts as global and has
//! to be excluded separately.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use pnet::ipnetwork::Ipv4Network;

use super::pair::PacketAddressPair;

type Block = (Ipv4Addr, u8);

const NON_GLOBAL_BLOCKS: &[Block] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 0, 0, 0), 24),
    (Ipv4Addr::new(192, 0, 0, 170), 31),
    (Ipv4Addr::new(192, 0, 2, 0), 24),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(198, 18, 0, 0), 15),
    (Ipv4Addr::new(198, 51, 100, 0), 24),
    (Ipv4Addr::new(203, 0, 113, 0), 24),
    (Ipv4Addr::new(240, 0, 0, 0), 4),
    (Ipv4Addr::new(255, 255, 255, 255), 32),
];

// PCP/NAT anycast and TURN relay anycast, carved out of 192.0.0.0/24.
const GLOBAL_EXCEPTIONS: &[Block] = &[
    (Ipv4Addr::new(192, 0, 0, 9), 32),
    (Ipv4Addr::new(192, 0, 0, 10), 32),
];

const SHARED_BLOCK: Block = (Ipv4Addr::new(100, 64, 0, 0), 10);

static NON_GLOBAL: OnceLock<Vec<Ipv4Network>> = OnceLock::new();
static EXCEPTIONS: OnceLock<Vec<Ipv4Network>> = OnceLock::new();

fn to_networks(blocks: &[Block]) -> Vec<Ipv4Network> {
    blocks
        .iter()
        .filter_map(|&(addr, prefix)| Ipv4Network::new(addr, prefix).ok())
        .collect()
}

fn in_any(networks: &[Ipv4Network], addr: Ipv4Addr) -> bool {
    networks.iter().any(|net| net.contains(addr))
}

/// Membership in a non-global special-purpose block (private, loopback,
/// link-local, documentation, benchmarking, reserved, broadcast, ...).
pub fn is_private(addr: Ipv4Addr) -> bool {
    let non_global = NON_GLOBAL.get_or_init(|| to_networks(NON_GLOBAL_BLOCKS));
    let exceptions = EXCEPTIONS.get_or_init(|| to_networks(GLOBAL_EXCEPTIONS));
    in_any(non_global, addr) && !in_any(exceptions, addr)
}

/// Carrier-grade NAT space. Neither private nor global.
pub fn is_shared(addr: Ipv4Addr) -> bool {
    let (base, prefix) = SHARED_BLOCK;
    Ipv4Network::new(base, prefix).is_ok_and(|net| net.contains(addr))
}

pub fn is_global(addr: Ipv4Addr) -> bool {
    !is_shared(addr) && !is_private(addr)
}

pub fn is_multicast(addr: Ipv4Addr) -> bool {
    addr.is_multicast()
}

/// Only eligible addresses are ever submitted to a registry lookup.
pub fn is_eligible(addr: Ipv4Addr) -> bool {
    is_global(addr) && !is_multicast(addr)
}

/// Collects the eligible source and destination addresses of `pairs`,
/// deduplicated, in the order they are first seen.
pub fn eligible_addresses(pairs: &[PacketAddressPair]) -> Vec<Ipv4Addr> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    pairs
        .iter()
        .flat_map(|pair| [pair.source, pair.destination])
        .filter(|addr| is_eligible(*addr))
        .filter(|addr| seen.insert(*addr))
        .collect()
}

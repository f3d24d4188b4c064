use std::fmt;
use std::net::Ipv4Addr;

/// Source and destination of one IPv4 packet, in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketAddressPair {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl PacketAddressPair {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn address(&self, role: Role) -> Ipv4Addr {
        match role {
            Role::Source => self.source,
            Role::Destination => self.destination,
        }
    }
}

/// The side of a packet an address is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    Destination,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "Source IP"),
            Role::Destination => write!(f, "Destination IP"),
        }
    }
}

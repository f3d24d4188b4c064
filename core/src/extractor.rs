use geotally_common::network::pair::PacketAddressPair;

use crate::capture::PacketRecord;

/// Address pairs of a capture together with the number of packets they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// All packet records processed, IPv4 or not.
    pub packet_count: usize,
    /// One pair per IPv4 packet, in capture order.
    pub pairs: Vec<PacketAddressPair>,
}

/// Keeps the address pairs of records that carry an IPv4 layer.
///
/// Records without one are skipped silently but still counted.
pub fn extract(records: &[PacketRecord]) -> Extraction {
    let pairs: Vec<PacketAddressPair> = records.iter().filter_map(|record| record.ipv4).collect();
    Extraction {
        packet_count: records.len(),
        pairs,
    }
}

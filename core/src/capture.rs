//! Capture file adapter.
//!
//! Reads legacy pcap and pcapng files and reduces every frame to an optional
//! IPv4 source/destination pair. Frames without an IPv4 network layer are kept
//! as records (they count as packets) but carry no addresses.

use std::fs::File;
use std::path::Path;

use geotally_common::error::CaptureError;
use geotally_common::network::pair::PacketAddressPair;
use pcap_parser::data::{PacketData, get_packetdata};
use pcap_parser::{Block, Linktype, PcapBlockOwned, PcapError, create_reader};
use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::vlan::VlanPacket;
use tracing::debug;

const READ_BUFFER_SIZE: usize = 1 << 16;

/// One packet of the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRecord {
    pub ipv4: Option<PacketAddressPair>,
}

impl PacketRecord {
    pub fn decode(frame: &[u8], linktype: Linktype) -> Self {
        Self {
            ipv4: network_layer(frame, linktype),
        }
    }
}

/// Reads at most `limit` packet records from the capture at `path`.
///
/// Any failure to open or parse the file is fatal; no partial result is returned.
pub fn read_capture(path: &Path, limit: Option<usize>) -> Result<Vec<PacketRecord>, CaptureError> {
    let file = File::open(path).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = create_reader(READ_BUFFER_SIZE, file).map_err(|e| malformed(&e))?;

    let mut legacy_linktype = Linktype::ETHERNET;
    let mut interfaces: Vec<Linktype> = Vec::new();
    let mut records: Vec<PacketRecord> = Vec::new();

    while limit.is_none_or(|max| records.len() < max) {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::LegacyHeader(header) => legacy_linktype = header.network,
                    PcapBlockOwned::Legacy(packet) => {
                        records.push(PacketRecord::decode(packet.data, legacy_linktype));
                    }
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => interfaces.clear(),
                    PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                        interfaces.push(idb.linktype);
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                        let linktype = interface_linktype(&interfaces, epb.if_id);
                        let frame = truncate(epb.data, epb.caplen);
                        records.push(PacketRecord::decode(frame, linktype));
                    }
                    PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                        let linktype = interface_linktype(&interfaces, 0);
                        let frame = truncate(spb.data, spb.origlen);
                        records.push(PacketRecord::decode(frame, linktype));
                    }
                    _ => {}
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => reader.refill().map_err(|e| malformed(&e))?,
            Err(e) => return Err(malformed(&e)),
        }
    }

    debug!("read {} packet records from {}", records.len(), path.display());
    Ok(records)
}

fn interface_linktype(interfaces: &[Linktype], if_id: u32) -> Linktype {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or(Linktype::ETHERNET)
}

// pcapng block data is padded to 32 bits
fn truncate(data: &[u8], caplen: u32) -> &[u8] {
    let len = (caplen as usize).min(data.len());
    &data[..len]
}

fn malformed<I>(err: &PcapError<I>) -> CaptureError {
    let reason = match err {
        PcapError::HeaderNotRecognized => "not a pcap or pcapng file".to_string(),
        PcapError::UnexpectedEof => "capture ends in the middle of a block".to_string(),
        PcapError::BufferTooSmall => "block larger than the read buffer".to_string(),
        PcapError::NomError(_, kind) | PcapError::OwnedNomError(_, kind) => {
            format!("invalid block ({kind:?})")
        }
        _ => "unreadable block".to_string(),
    };
    CaptureError::Malformed(reason)
}

fn network_layer(frame: &[u8], linktype: Linktype) -> Option<PacketAddressPair> {
    match get_packetdata(frame, linktype, frame.len())? {
        PacketData::L2(ethernet) => from_ethernet(ethernet),
        PacketData::L3(ethertype, payload) if ethertype == EtherTypes::Ipv4.0 => from_ipv4(payload),
        _ => None,
    }
}

fn from_ethernet(frame: &[u8]) -> Option<PacketAddressPair> {
    let eth_packet = EthernetPacket::new(frame)?;
    match eth_packet.get_ethertype() {
        EtherTypes::Ipv4 => from_ipv4(eth_packet.payload()),
        EtherTypes::Vlan => {
            let vlan = VlanPacket::new(eth_packet.payload())?;
            if vlan.get_ethertype() == EtherTypes::Ipv4 {
                from_ipv4(vlan.payload())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn from_ipv4(payload: &[u8]) -> Option<PacketAddressPair> {
    let ipv4 = Ipv4Packet::new(payload)?;
    if ipv4.get_version() != 4 {
        return None;
    }
    Some(PacketAddressPair::new(ipv4.get_source(), ipv4.get_destination()))
}

//! Per-role country distributions.
//!
//! Every packet contributes once to the source distribution and once to the
//! destination distribution. Endpoints without a resolved country are counted
//! as `LOCAL`, and percentages are taken over all IPv4 packets.

use std::cmp::Ordering;
use std::collections::HashMap;

use geotally_common::network::country::Attribution;
use geotally_common::network::pair::{PacketAddressPair, Role};

use crate::pool::AddressCountryMap;

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRow {
    pub attribution: Attribution,
    pub count: usize,
    pub percentage: f64,
}

impl DistributionRow {
    /// Percentage rounded to two decimals for display.
    pub fn rounded_percentage(&self) -> f64 {
        (self.percentage * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    /// Number of packet address pairs the percentages are relative to.
    pub total: usize,
    pub source: Vec<DistributionRow>,
    pub destination: Vec<DistributionRow>,
}

impl Distribution {
    pub fn rows(&self, role: Role) -> &[DistributionRow] {
        match role {
            Role::Source => &self.source,
            Role::Destination => &self.destination,
        }
    }
}

pub fn aggregate(pairs: &[PacketAddressPair], mapping: &AddressCountryMap) -> Distribution {
    Distribution {
        total: pairs.len(),
        source: aggregate_role(pairs, mapping, Role::Source),
        destination: aggregate_role(pairs, mapping, Role::Destination),
    }
}

pub fn attribute(pair: &PacketAddressPair, role: Role, mapping: &AddressCountryMap) -> Attribution {
    Attribution::from(mapping.country(&pair.address(role)).cloned())
}

fn aggregate_role(
    pairs: &[PacketAddressPair],
    mapping: &AddressCountryMap,
    role: Role,
) -> Vec<DistributionRow> {
    let mut counts: HashMap<Attribution, usize> = HashMap::new();
    for pair in pairs {
        *counts.entry(attribute(pair, role, mapping)).or_insert(0) += 1;
    }

    let total = pairs.len() as f64;
    let mut rows: Vec<DistributionRow> = counts
        .into_iter()
        .map(|(attribution, count)| DistributionRow {
            attribution,
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect();
    rows.sort_by(rank);
    rows
}

// Most frequent first; equal counts by label.
fn rank(a: &DistributionRow, b: &DistributionRow) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.attribution.label().cmp(b.attribution.label()))
}

use std::path::Path;
use std::sync::{Arc, Mutex};

use geotally_common::config::Config;
use geotally_common::error::CaptureError;
use geotally_common::network::pair::Role;
use geotally_core::distribution::DistributionRow;
use geotally_core::extractor::Extraction;
use geotally_core::pipeline::{Pipeline, PipelineObserver, Report};
use geotally_core::pool::AddressCountryMap;

use crate::fixtures::{self, StubRegistry, arp_frame, ip, ipv4_frame};

fn run(path: &Path, registry: &Arc<StubRegistry>, cfg: &Config) -> Result<Report, CaptureError> {
    Pipeline::new(cfg, Arc::clone(registry)).run(path, &())
}

fn rows(report: &Report, role: Role) -> Vec<(String, usize, f64)> {
    report
        .distribution
        .rows(role)
        .iter()
        .map(|row: &DistributionRow| {
            (row.attribution.label().to_string(), row.count, row.rounded_percentage())
        })
        .collect()
}

/// Two packets from 1.1.1.1 and eight from a private host, all towards a private host.
fn ten_packet_capture() -> Vec<Vec<u8>> {
    let mut frames = vec![ipv4_frame("1.1.1.1", "10.0.0.1")];
    frames.extend((0..8).map(|_| ipv4_frame("10.0.0.5", "10.0.0.1")));
    frames.push(ipv4_frame("1.1.1.1", "10.0.0.1"));
    frames
}

#[test]
fn ten_packet_scenario() {
    let capture = fixtures::pcap(&ten_packet_capture());
    let registry = Arc::new(StubRegistry::new().with_country("1.1.1.1", "AU"));

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(report.packet_count, 10);
    assert_eq!(report.pair_count, 10);
    assert_eq!(report.unique_addresses, 1);
    assert_eq!(registry.calls(), vec![ip("1.1.1.1")]);
    assert_eq!(
        rows(&report, Role::Source),
        vec![("LOCAL".to_string(), 8, 80.0), ("AU".to_string(), 2, 20.0)]
    );
    assert_eq!(
        rows(&report, Role::Destination),
        vec![("LOCAL".to_string(), 10, 100.0)]
    );
}

#[test]
fn pcapng_and_pcap_agree() {
    let frames = ten_packet_capture();
    let legacy = fixtures::pcap(&frames);
    let ng = fixtures::pcapng(&frames);
    let registry = Arc::new(StubRegistry::new().with_country("1.1.1.1", "AU"));

    let a = run(legacy.path(), &registry, &fixtures::config()).unwrap();
    let b = run(ng.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(a.distribution, b.distribution);
    assert_eq!(a.mapping, b.mapping);
}

#[test]
fn each_address_is_looked_up_once() {
    let mut frames = Vec::new();
    for _ in 0..25 {
        frames.push(ipv4_frame("8.8.8.8", "192.168.1.20"));
        frames.push(ipv4_frame("192.168.1.20", "8.8.8.8"));
        frames.push(ipv4_frame("1.1.1.1", "8.8.4.4"));
    }
    let capture = fixtures::pcap(&frames);
    let registry = Arc::new(
        StubRegistry::new()
            .with_country("8.8.8.8", "US")
            .with_country("8.8.4.4", "US")
            .with_country("1.1.1.1", "AU"),
    );

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(registry.calls().len(), 3);
    for addr in ["8.8.8.8", "8.8.4.4", "1.1.1.1"] {
        assert_eq!(registry.calls_for(addr), 1, "{addr}");
    }
    assert_eq!(report.unique_addresses, 3);
    let order: Vec<_> = report.mapping.iter().map(|(addr, _)| addr).collect();
    assert_eq!(order, vec![ip("8.8.8.8"), ip("1.1.1.1"), ip("8.8.4.4")]);
}

#[test]
fn repeated_runs_give_the_same_report() {
    let frames: Vec<Vec<u8>> = (1..=30u8)
        .map(|i| ipv4_frame(&format!("{}.0.0.1", i % 5 + 1), &format!("10.0.{i}.1")))
        .collect();
    let capture = fixtures::pcap(&frames);
    let registry = Arc::new(
        StubRegistry::new()
            .with_country("1.0.0.1", "AU")
            .with_country("2.0.0.1", "FR")
            .with_country("3.0.0.1", "US")
            .with_country("4.0.0.1", "CN")
            .with_country("5.0.0.1", "DE"),
    );

    let first = run(capture.path(), &registry, &fixtures::config()).unwrap();
    let second = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(first.distribution, second.distribution);
    assert_eq!(first.mapping, second.mapping);
}

#[test]
fn percentages_sum_to_one_hundred() {
    let frames = vec![
        ipv4_frame("1.1.1.1", "8.8.8.8"),
        ipv4_frame("8.8.8.8", "1.1.1.1"),
        ipv4_frame("9.9.9.9", "10.1.1.1"),
        ipv4_frame("172.16.5.4", "9.9.9.9"),
        ipv4_frame("1.1.1.1", "224.0.0.251"),
        ipv4_frame("100.64.0.7", "255.255.255.255"),
        arp_frame(),
    ];
    let capture = fixtures::pcap(&frames);
    let registry = Arc::new(
        StubRegistry::new()
            .with_country("1.1.1.1", "AU")
            .with_country("8.8.8.8", "US")
            .with_country("9.9.9.9", "CH"),
    );

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(report.packet_count, 7);
    assert_eq!(report.pair_count, 6);
    for role in [Role::Source, Role::Destination] {
        let rows = report.distribution.rows(role);
        let sum: f64 = rows.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9, "{role}: {sum}");
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 6);
    }
}

#[test]
fn non_global_addresses_are_never_looked_up() {
    let frames = vec![
        ipv4_frame("10.0.0.1", "224.0.0.251"),
        ipv4_frame("100.64.0.7", "255.255.255.255"),
        ipv4_frame("169.254.3.3", "127.0.0.1"),
        ipv4_frame("192.0.2.1", "198.51.100.2"),
        ipv4_frame("192.0.0.9", "239.255.255.250"),
    ];
    let capture = fixtures::pcap(&frames);
    let registry = Arc::new(StubRegistry::new().with_country("192.0.0.9", "US"));

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(registry.calls(), vec![ip("192.0.0.9")]);
    assert!(!report.mapping.contains(&ip("224.0.0.251")));
    assert!(!report.mapping.contains(&ip("239.255.255.250")));
}

#[test]
fn failed_lookups_only_affect_their_address() {
    let frames = vec![
        ipv4_frame("1.1.1.1", "10.0.0.1"),
        ipv4_frame("9.9.9.9", "10.0.0.1"),
        ipv4_frame("8.8.8.8", "10.0.0.1"),
        ipv4_frame("9.9.9.9", "10.0.0.1"),
    ];
    let capture = fixtures::pcap(&frames);
    let registry = Arc::new(
        StubRegistry::new()
            .with_country("1.1.1.1", "AU")
            .with_country("8.8.8.8", "US")
            .failing("9.9.9.9"),
    );

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(report.mapping.len(), 3);
    assert_eq!(report.mapping.resolved_count(), 2);
    assert_eq!(report.mapping.country(&ip("9.9.9.9")), None);
    assert_eq!(
        rows(&report, Role::Source),
        vec![
            ("LOCAL".to_string(), 2, 50.0),
            ("AU".to_string(), 1, 25.0),
            ("US".to_string(), 1, 25.0),
        ]
    );
    assert_eq!(registry.calls_for("9.9.9.9"), 1);
}

#[test]
fn answer_without_country_counts_as_local() {
    let capture = fixtures::pcap(&[ipv4_frame("203.0.114.1", "1.1.1.1")]);
    let registry = Arc::new(StubRegistry::new().with_country("1.1.1.1", "AU"));

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert!(report.mapping.contains(&ip("203.0.114.1")));
    assert_eq!(rows(&report, Role::Source), vec![("LOCAL".to_string(), 1, 100.0)]);
    assert_eq!(rows(&report, Role::Destination), vec![("AU".to_string(), 1, 100.0)]);
}

#[test]
fn all_local_capture() {
    let frames: Vec<Vec<u8>> = (1..=4u8)
        .map(|i| ipv4_frame(&format!("192.168.0.{i}"), "192.168.0.254"))
        .collect();
    let capture = fixtures::pcap(&frames);
    let registry = Arc::new(StubRegistry::new());

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert!(registry.calls().is_empty());
    assert!(report.mapping.is_empty());
    assert_eq!(rows(&report, Role::Source), vec![("LOCAL".to_string(), 4, 100.0)]);
    assert_eq!(rows(&report, Role::Destination), vec![("LOCAL".to_string(), 4, 100.0)]);
}

#[test]
fn capture_without_ipv4_has_empty_distributions() {
    let capture = fixtures::pcap(&[arp_frame(), arp_frame()]);
    let registry = Arc::new(StubRegistry::new());

    let report = run(capture.path(), &registry, &fixtures::config()).unwrap();

    assert_eq!(report.packet_count, 2);
    assert_eq!(report.pair_count, 0);
    assert!(report.distribution.source.is_empty());
    assert!(report.distribution.destination.is_empty());
}

#[test]
fn packet_limit_reads_only_leading_packets() {
    let capture = fixtures::pcap(&ten_packet_capture());
    let registry = Arc::new(StubRegistry::new().with_country("1.1.1.1", "AU"));
    let cfg = Config {
        packet_limit: Some(5),
        ..fixtures::config()
    };

    let report = run(capture.path(), &registry, &cfg).unwrap();

    assert_eq!(report.packet_count, 5);
    assert_eq!(
        rows(&report, Role::Source),
        vec![("LOCAL".to_string(), 4, 80.0), ("AU".to_string(), 1, 20.0)]
    );
}

#[test]
fn zero_packet_limit_reads_everything() {
    let capture = fixtures::pcap(&ten_packet_capture());
    let registry = Arc::new(StubRegistry::new().with_country("1.1.1.1", "AU"));
    let cfg = Config {
        packet_limit: Some(0),
        ..fixtures::config()
    };

    let report = run(capture.path(), &registry, &cfg).unwrap();

    assert_eq!(report.packet_count, 10);
    assert_eq!(
        rows(&report, Role::Source),
        vec![("LOCAL".to_string(), 8, 80.0), ("AU".to_string(), 2, 20.0)]
    );
}

#[test]
fn missing_capture_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(StubRegistry::new());

    let err = run(&dir.path().join("absent.pcap"), &registry, &fixtures::config()).unwrap_err();

    assert!(matches!(err, CaptureError::Io { .. }), "{err:?}");
    assert!(registry.calls().is_empty());
}

#[test]
fn corrupt_capture_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.pcap");
    std::fs::write(&path, b"this is not a packet capture at all").unwrap();
    let registry = Arc::new(StubRegistry::new());

    let err = run(&path, &registry, &fixtures::config()).unwrap_err();

    assert!(matches!(err, CaptureError::Malformed(_)), "{err:?}");
    assert!(registry.calls().is_empty());
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
    progress: Mutex<Vec<(usize, usize)>>,
}

impl PipelineObserver for RecordingObserver {
    fn reading(&self, _path: &Path) {
        self.events.lock().unwrap().push("reading".into());
    }

    fn extracted(&self, extraction: &Extraction) {
        self.events
            .lock()
            .unwrap()
            .push(format!("extracted {}", extraction.packet_count));
    }

    fn resolving(&self, unique: usize, workers: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("resolving {unique} on {workers}"));
    }

    fn resolution_progress(&self, completed: usize, total: usize) {
        self.progress.lock().unwrap().push((completed, total));
    }

    fn resolved(&self, mapping: &AddressCountryMap) {
        self.events
            .lock()
            .unwrap()
            .push(format!("resolved {}", mapping.len()));
    }
}

#[test]
fn observer_sees_every_stage() {
    let frames = vec![
        ipv4_frame("1.1.1.1", "8.8.8.8"),
        ipv4_frame("9.9.9.9", "10.0.0.1"),
    ];
    let capture = fixtures::pcap(&frames);
    let observer = RecordingObserver::default();
    let cfg = Config {
        workers: Some(2),
        ..Config::default()
    };

    Pipeline::new(&cfg, StubRegistry::new())
        .run(capture.path(), &observer)
        .unwrap();

    assert_eq!(
        observer.events.into_inner().unwrap(),
        vec!["reading", "extracted 2", "resolving 3 on 2", "resolved 3"]
    );
    let mut progress = observer.progress.into_inner().unwrap();
    progress.sort();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
}

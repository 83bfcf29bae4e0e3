use quietscan_lib::{
    config::{DEFAULT_TIMEOUT_MS, MAX_CONCURRENCY, MAX_TIMEOUT_MS},
    scanner::DeviceEntry,
};
use std::{io::Write, time::Duration};
use tempfile::NamedTempFile;

use super::*;

fn parse(extra: &[&str]) -> Args {
    Args::parse_from(std::iter::once("quietscan").chain(extra.iter().copied()))
}

fn yaml(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn sample_result() -> ScanResult {
    let mut result = ScanResult::empty("eth0", "192.168.1.0/24");
    result.devices.push(DeviceEntry {
        ip: Ipv4Addr::new(192, 168, 1, 20),
        mac: "AA:BB:CC:DD:EE:FF".to_string(),
        vendor: "Vendor A".to_string(),
        hostname: "printer.lan".to_string(),
    });
    result.devices.push(DeviceEntry {
        ip: Ipv4Addr::new(192, 168, 1, 3),
        mac: String::new(),
        vendor: "Unknown Vendor".to_string(),
        hostname: String::new(),
    });
    result
}

#[test]
fn parses_comma_separated_targets() {
    let args = parse(&["--targets", "10.0.0.1,10.0.0.5-7", "--sort"]);
    assert_eq!(args.targets, vec!["10.0.0.1", "10.0.0.5-7"]);
    assert!(args.sort);
    assert!(args.concurrency.is_none());
}

#[test]
fn rejects_targets_with_targets_file() {
    let res = Args::try_parse_from([
        "quietscan",
        "--targets",
        "10.0.0.1",
        "--targets-file",
        "hosts.txt",
    ]);
    assert!(res.is_err());
}

#[test]
fn initializes_logger() {
    let args = parse(&["--debug"]);
    initialize_logger(&args).unwrap();
}

#[test]
fn prints_args() {
    let args = parse(&["--targets", "192.168.1.1", "--interface", "eth0"]);
    let config = build_settings(&args).snapshot();
    print_args(&args, &config);
}

#[test]
fn loads_settings_file() {
    let file = yaml(
        "concurrency: 8\n\
         delay_ms: 150\n\
         active_arp: true\n\
         targets:\n  - 192.168.1.0/28\n",
    );

    let settings = load_file_settings(file.path()).unwrap();

    assert_eq!(settings.concurrency, Some(8));
    assert_eq!(settings.delay_ms, Some(150));
    assert_eq!(settings.active_arp, Some(true));
    assert_eq!(settings.targets, vec!["192.168.1.0/28"]);
    assert_eq!(settings.timeout_ms, None);
}

#[test]
fn rejects_unknown_settings_keys() {
    let file = yaml("concurency: 8\n");
    assert!(load_file_settings(file.path()).is_err());
}

#[test]
fn missing_settings_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_file_settings(&dir.path().join("nope.yaml")).is_err());
}

#[test]
fn explicit_flags_override_file_settings() {
    let mut args = parse(&["--concurrency", "4", "--interface", "wlan0"]);

    apply_file_settings(
        &mut args,
        FileSettings {
            concurrency: Some(16),
            delay_ms: Some(100),
            interface: Some("eth0".to_string()),
            json: Some(true),
            targets: vec!["10.0.0.0/30".to_string()],
            ..Default::default()
        },
    );

    assert_eq!(args.concurrency, Some(4));
    assert_eq!(args.interface.as_deref(), Some("wlan0"));
    assert_eq!(args.delay_ms, Some(100));
    assert!(args.json);
    assert_eq!(args.targets, vec!["10.0.0.0/30"]);
}

#[test]
fn file_targets_do_not_replace_explicit_targets_file() {
    let mut args = parse(&["--targets-file", "hosts.txt"]);

    apply_file_settings(
        &mut args,
        FileSettings {
            targets: vec!["10.0.0.0/30".to_string()],
            ..Default::default()
        },
    );

    assert!(args.targets.is_empty());
    assert_eq!(args.targets_file, Some(PathBuf::from("hosts.txt")));
}

#[test]
fn builds_settings_with_defaults() {
    let config = build_settings(&parse(&[])).snapshot();
    assert_eq!(config, ScanConfig::default());
}

#[test]
fn builds_settings_with_clamping() {
    let args = parse(&[
        "--concurrency",
        "500",
        "--timeout-ms",
        "90000",
        "--delay-ms",
        "25",
        "--allow-large-ranges",
        "--active-arp",
    ]);

    let config = build_settings(&args).snapshot();

    assert_eq!(config.concurrency, MAX_CONCURRENCY);
    assert_eq!(config.timeout, Duration::from_millis(MAX_TIMEOUT_MS));
    assert_eq!(config.delay, Duration::from_millis(25));
    assert!(config.allow_large_ranges);
    assert!(config.active_arp);
}

#[test]
fn negative_values_fall_back() {
    let mut args = parse(&[]);
    args.concurrency = Some(-3);
    args.delay_ms = Some(-10);
    args.timeout_ms = Some(-1);

    let config = build_settings(&args).snapshot();

    assert_eq!(config.concurrency, 1);
    assert_eq!(config.delay, Duration::ZERO);
    assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
}

#[test]
fn expands_and_deduplicates_targets() {
    let entries = vec![
        "10.0.0.1-3".to_string(),
        "10.0.0.2".to_string(),
        "10.0.0.8/30".to_string(),
    ];

    let ips = expand_targets(&entries, &ScanConfig::default()).unwrap();

    assert_eq!(
        ips,
        vec![
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 3),
            Ipv4Addr::new(10, 0, 0, 8),
            Ipv4Addr::new(10, 0, 0, 9),
            Ipv4Addr::new(10, 0, 0, 10),
            Ipv4Addr::new(10, 0, 0, 11),
        ]
    );
}

#[test]
fn combined_targets_respect_ceiling() {
    let entries = vec!["10.0.0.0/24".to_string(), "10.0.1.0/24".to_string()];

    assert!(expand_targets(&entries, &ScanConfig::default()).is_err());

    let config = ScanConfig::builder()
        .allow_large_ranges(true)
        .build()
        .unwrap();
    assert_eq!(expand_targets(&entries, &config).unwrap().len(), 512);
}

#[test]
fn invalid_target_is_an_error() {
    let entries = vec!["10.0.0.300".to_string()];
    assert!(expand_targets(&entries, &ScanConfig::default()).is_err());
}

#[test]
fn reads_targets_file() {
    let file = yaml("# lab hosts\n10.0.0.7\n\nnot-an-ip\n10.0.0.9\n10.0.0.7\n");
    let scanner = PoliteScanner::system(ScanConfig::default());

    let ips = read_targets_file(file.path(), &scanner).unwrap();

    assert_eq!(
        ips,
        vec![Ipv4Addr::new(10, 0, 0, 7), Ipv4Addr::new(10, 0, 0, 9)]
    );
}

#[test]
fn targets_file_without_valid_entries_is_an_error() {
    let file = yaml("# nothing here\nbogus\n");
    let scanner = PoliteScanner::system(ScanConfig::default());

    assert!(read_targets_file(file.path(), &scanner).is_err());
}

#[test]
fn renders_result_table() {
    let table = render_table(&sample_result());

    assert_eq!(table.len(), 3);

    let header = table.get_row(0).unwrap();
    assert_eq!(header.get_cell(0).unwrap().get_content(), "IP");
    assert_eq!(header.get_cell(3).unwrap().get_content(), "HOSTNAME");

    let first = table.get_row(1).unwrap();
    assert_eq!(first.get_cell(0).unwrap().get_content(), "192.168.1.20");
    assert_eq!(first.get_cell(1).unwrap().get_content(), "AA:BB:CC:DD:EE:FF");
    assert_eq!(first.get_cell(2).unwrap().get_content(), "Vendor A");
    assert_eq!(first.get_cell(3).unwrap().get_content(), "printer.lan");
}

#[test]
fn renders_empty_result_table() {
    let table = render_table(&ScanResult::empty("eth0", "10.0.0.0/30"));
    assert_eq!(table.len(), 1);
}

#[test]
fn prints_table_results() {
    let args = parse(&[]);
    print_results(&args, &sample_result()).unwrap();
}

#[test]
fn prints_json_results() {
    let args = parse(&["--json"]);
    print_results(&args, &sample_result()).unwrap();
}

#[test]
fn progress_logger_accepts_any_count() {
    let cb = progress_logger();
    cb(1, 64);
    cb(32, 64);
    cb(64, 64);
}

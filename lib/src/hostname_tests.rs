use super::*;
use crate::command::{CommandOutput, MockCommandRunner};
use std::time::Instant;

const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

const NBTSTAT_OUTPUT: &str = "
Ethernet:
Node IpAddress: [192.168.1.10] Scope Id: []

           NetBIOS Remote Machine Name Table

       Name               Type         Status
    ---------------------------------------------
    OFFICE-PC      <00>  UNIQUE      Registered
    WORKGROUP      <00>  GROUP       Registered
    OFFICE-PC      <20>  UNIQUE      Registered
";

fn config() -> ScanConfig {
    ScanConfig::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap()
}

fn resolver(runner: MockCommandRunner, lookup: ReverseLookup) -> HostnameResolver {
    HostnameResolver::new(Arc::new(runner), &config()).with_reverse_lookup(lookup)
}

fn no_ptr() -> ReverseLookup {
    Arc::new(|_: Ipv4Addr| -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no record"))
    })
}

#[test]
fn cleans_dns_answers() {
    assert_eq!(
        clean_dns_name("printer.local.", IP),
        Some("printer.local".to_string())
    );
    assert_eq!(clean_dns_name("192.168.1.20", IP), None);
    assert_eq!(clean_dns_name("  ", IP), None);
}

#[test]
fn parses_nbtstat_output() {
    assert_eq!(parse_nbt_name(NBTSTAT_OUTPUT), Some("OFFICE-PC".to_string()));
    assert_eq!(parse_nbt_name("Host not found."), None);
    assert_eq!(parse_nbt_name(""), None);
}

#[test]
fn returns_reverse_dns_name() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().never();

    let lookup: ReverseLookup =
        Arc::new(|_: Ipv4Addr| -> io::Result<String> {
            Ok("nas.home.arpa.".to_string())
        });
    let resolver = resolver(runner, lookup).with_netbios(true);

    assert_eq!(resolver.resolve_hostname(IP), "nas.home.arpa");
}

#[test]
fn numeric_answer_is_a_miss() {
    let resolver = resolver(
        MockCommandRunner::new(),
        Arc::new(|ip: Ipv4Addr| -> io::Result<String> { Ok(ip.to_string()) }),
    )
    .with_netbios(false);

    assert_eq!(resolver.resolve_hostname(IP), "");
    assert!(matches!(
        resolver.reverse_dns(IP),
        Err(QuietScanError::ResolutionUnavailable { .. })
    ));
}

#[test]
fn slow_lookup_times_out() {
    let resolver = resolver(
        MockCommandRunner::new(),
        Arc::new(|_: Ipv4Addr| -> io::Result<String> {
            thread::sleep(Duration::from_secs(2));
            Ok("late.example".to_string())
        }),
    )
    .with_netbios(false);

    let started = Instant::now();
    assert_eq!(resolver.resolve_hostname(IP), "");
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn falls_back_to_netbios() {
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run()
        .withf(|program, args, _| {
            program == "nbtstat" && args == ["-A", "192.168.1.20"]
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(CommandOutput {
                stdout: NBTSTAT_OUTPUT.to_string(),
                success: true,
            })
        });

    let resolver = resolver(runner, no_ptr()).with_netbios(true);
    assert_eq!(resolver.resolve_hostname(IP), "OFFICE-PC");
}

#[test]
fn netbios_failure_is_empty() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().returning(|_, _, _| {
        Ok(CommandOutput {
            stdout: String::new(),
            success: false,
        })
    });

    let resolver = resolver(runner, no_ptr()).with_netbios(true);
    assert_eq!(resolver.resolve_hostname(IP), "");
}

#[test]
fn skips_netbios_when_disabled() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().never();

    let resolver = resolver(runner, no_ptr()).with_netbios(false);
    assert_eq!(resolver.resolve_hostname(IP), "");
}

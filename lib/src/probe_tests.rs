use super::*;
use crate::{
    command::{CommandOutput, MockCommandRunner},
    error::QuietScanError,
};

fn output(stdout: &str, success: bool) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        success,
    }
}

fn config() -> ScanConfig {
    ScanConfig::builder()
        .timeout(Duration::from_millis(8000))
        .build()
        .unwrap()
}

#[test]
fn builds_platform_arguments() {
    let ip = Ipv4Addr::new(192, 168, 1, 1);
    let wait = Duration::from_millis(2500);

    assert_eq!(
        PingFlavor::Windows.args(ip, wait),
        vec!["-n", "1", "-w", "2500", "192.168.1.1"]
    );
    assert_eq!(
        PingFlavor::Bsd.args(ip, wait),
        vec!["-c", "1", "-W", "2500", "192.168.1.1"]
    );
    assert_eq!(
        PingFlavor::Linux.args(ip, wait),
        vec!["-c", "1", "-W", "3", "192.168.1.1"]
    );
    assert_eq!(
        PingFlavor::Linux.args(ip, Duration::ZERO),
        vec!["-c", "1", "-W", "1", "192.168.1.1"]
    );
}

#[test]
fn detects_ttl_marker() {
    assert!(has_ttl_marker(
        "64 bytes from 192.168.1.1: icmp_seq=0 ttl=64 time=1.2 ms"
    ));
    assert!(has_ttl_marker(
        "Reply from 192.168.1.1: bytes=32 time<1ms TTL=128"
    ));
    assert!(!has_ttl_marker("Request timed out."));
    assert!(!has_ttl_marker(""));
}

#[test]
fn reachable_when_ttl_present() {
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run()
        .withf(|program, args, timeout| {
            program == "ping"
                && args.last().map(String::as_str) == Some("10.0.0.5")
                && args.contains(&"5000".to_string())
                && *timeout == Duration::from_millis(8000)
        })
        .times(1)
        .returning(|_, _, _| Ok(output("bytes=32 time=1ms TTL=64", true)));

    let prober =
        PingProber::with_flavor(Arc::new(runner), &config(), PingFlavor::Bsd);
    assert!(prober.probe("10.0.0.5"));
}

#[test]
fn marker_wins_over_exit_status() {
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run()
        .returning(|_, _, _| Ok(output("64 bytes ttl=63\n50% packet loss", false)));

    let prober = PingProber::new(Arc::new(runner), &config());
    assert!(prober.probe("10.0.0.5"));
}

#[test]
fn unreachable_without_marker() {
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run()
        .returning(|_, _, _| Ok(output("Request timed out.", true)));

    let prober = PingProber::new(Arc::new(runner), &config());
    assert!(!prober.probe("10.0.0.5"));
}

#[test]
fn unreachable_on_timeout() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().returning(|program, _, timeout| {
        Err(QuietScanError::CommandTimeout {
            program: program.to_string(),
            timeout,
        })
    });

    let prober = PingProber::new(Arc::new(runner), &config());
    assert!(!prober.probe("10.0.0.5"));
}

#[test]
fn never_runs_command_for_malformed_target() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().never();

    let prober = PingProber::new(Arc::new(runner), &config());
    assert!(!prober.probe("10.0.0.5; rm -rf /"));
    assert!(!prober.probe("-f"));
    assert!(!prober.probe(""));
    assert!(!prober.probe("::1"));
}

use super::*;
use crate::{
    command::{CommandOutput, MockCommandRunner},
    error::QuietScanError,
};

const MACOS_OUTPUT: &str = "\
? (192.168.2.1) at 0:11:22:33:44:55 on en8 ifscope [ethernet]
? (192.168.2.15) at 14:cb:19:96:e6:1 on en8 ifscope [ethernet]
? (192.168.2.20) at (incomplete) on en8 ifscope [ethernet]
? (224.0.0.251) at 1:0:5e:0:0:fb on en8 ifscope permanent [ethernet]
";

const LINUX_OUTPUT: &str = "\
? (10.0.0.1) at aa:bb:cc:dd:ee:ff [ether] on eth0
? (10.0.0.7) at <incomplete> on eth0
gateway (10.0.0.254) at 00:00:00:00:00:00 [ether] on eth0
";

const WINDOWS_OUTPUT: &str = "
Interface: 192.168.1.10 --- 0x4
  Internet Address      Physical Address      Type
  192.168.1.1           00-11-22-33-44-55     dynamic
  192.168.1.20          a4-5e-60-01-02-03     dynamic
  192.168.1.255         ff-ff-ff-ff-ff-ff     static
";

#[test]
fn parses_macos_cache() {
    let table = parse_arp_cache(MACOS_OUTPUT, CacheFormat::Unix);
    assert_eq!(table.len(), 3);
    assert_eq!(table[&Ipv4Addr::new(192, 168, 2, 1)], "00:11:22:33:44:55");
    assert_eq!(table[&Ipv4Addr::new(192, 168, 2, 15)], "14:CB:19:96:E6:01");
    assert!(!table.contains_key(&Ipv4Addr::new(192, 168, 2, 20)));
}

#[test]
fn parses_linux_cache() {
    let table = parse_arp_cache(LINUX_OUTPUT, CacheFormat::Unix);
    assert_eq!(table.len(), 1);
    assert_eq!(table[&Ipv4Addr::new(10, 0, 0, 1)], "AA:BB:CC:DD:EE:FF");
}

#[test]
fn parses_windows_cache() {
    let table = parse_arp_cache(WINDOWS_OUTPUT, CacheFormat::Windows);
    assert_eq!(table.len(), 3);
    assert_eq!(table[&Ipv4Addr::new(192, 168, 1, 1)], "00:11:22:33:44:55");
    assert_eq!(table[&Ipv4Addr::new(192, 168, 1, 20)], "A4:5E:60:01:02:03");
}

#[test]
fn ignores_garbage() {
    assert!(parse_arp_cache("", CacheFormat::Unix).is_empty());
    assert!(parse_arp_cache("no entries", CacheFormat::Unix).is_empty());
    assert!(parse_arp_cache("No ARP Entries Found.", CacheFormat::Windows).is_empty());
}

#[test]
fn parses_proc_net_arp() {
    let contents = "\
IP address       HW type     Flags       HW address            Mask     Device
192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
192.168.1.9      0x1         0x0         00:00:00:00:00:00     *        eth0
";
    let table = parse_proc_net_arp(contents);
    assert_eq!(table.len(), 1);
    assert_eq!(table[&Ipv4Addr::new(192, 168, 1, 1)], "AA:BB:CC:DD:EE:FF");
}

#[test]
fn reads_cache_through_runner() {
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run()
        .withf(|program, _, _| program == "arp")
        .times(1)
        .returning(|_, _, _| {
            Ok(CommandOutput {
                stdout: if cfg!(windows) {
                    WINDOWS_OUTPUT.to_string()
                } else {
                    LINUX_OUTPUT.to_string()
                },
                success: true,
            })
        });

    let table = read_arp_cache(&runner, Duration::from_secs(1));
    assert!(!table.is_empty());
}

#[cfg(not(target_os = "linux"))]
#[test]
fn failed_read_yields_empty_table() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().returning(|program, _, timeout| {
        Err(QuietScanError::CommandTimeout {
            program: program.to_string(),
            timeout,
        })
    });

    assert!(read_arp_cache(&runner, Duration::from_millis(10)).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn failed_read_falls_back_without_panicking() {
    let mut runner = MockCommandRunner::new();
    runner.expect_run().returning(|program, _, timeout| {
        Err(QuietScanError::CommandTimeout {
            program: program.to_string(),
            timeout,
        })
    });

    // whatever the kernel table holds must already be normalized
    for mac in read_arp_cache(&runner, Duration::from_millis(10)).values() {
        assert_eq!(mac, &normalize_mac(mac));
    }
}

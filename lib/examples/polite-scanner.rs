use std::{env, sync::Arc};

use quietscan_lib::{
    config::ScanSettings,
    network,
    scanner::{PoliteScanner, ProgressCallback},
};

fn main() {
    let adapter = env::args().nth(1);

    let mut settings = ScanSettings::new();
    settings.set_concurrency(16);
    settings.set_delay_ms(25);
    settings.set_active_arp(false);

    let subnet = network::get_local_cidr(adapter.as_deref())
        .expect("cannot find a usable network adapter");
    println!("scanning {}", subnet);

    let progress: ProgressCallback = Arc::new(|current, total| {
        if current == total {
            println!("probed {}/{}", current, total);
        }
    });

    let scanner = PoliteScanner::system(settings.snapshot());
    let mut result = scanner.scan_adapter(adapter.as_deref(), Some(progress));
    result.sort_by_ip();

    for device in &result.devices {
        println!(
            "{:<16} {:<18} {:<30} {}",
            device.ip, device.mac, device.vendor, device.hostname
        );
    }

    println!("{} hosts reachable", result.devices.len());
}

//! MAC address text normalization

/// Normalizes MAC text to uppercase colon-delimited sextets
/// (`AA:BB:CC:DD:EE:FF`).
///
/// Accepts colon or dash separators, the single-digit octets macOS prints
/// (`a:b:c:d:e:f`), Cisco dotted form (`aabb.ccdd.eeff`) and bare 12 digit
/// hex. Anything else is returned uppercased with dashes turned into colons
/// but otherwise untouched, so callers can spot low-confidence entries by
/// their shape. Normalizing twice gives the same result as normalizing once.
pub fn normalize_mac(mac: &str) -> String {
    let mac = mac.trim().replace('-', ":").to_uppercase();

    if mac.contains(':') {
        let parts: Vec<&str> = mac.split(':').collect();
        let well_formed = parts.len() == 6
            && parts.iter().all(|p| {
                (1..=2).contains(&p.len())
                    && p.chars().all(|c| c.is_ascii_hexdigit())
            });

        if well_formed {
            return parts
                .iter()
                .map(|p| format!("{:0>2}", p))
                .collect::<Vec<_>>()
                .join(":");
        }

        return mac;
    }

    let digits = mac.replace('.', "");

    if digits.len() == 12 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return digits
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(":");
    }

    mac
}

/// Returns true if the text is a canonical `AA:BB:CC:DD:EE:FF` address
pub fn is_canonical_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts.iter().all(|p| {
            p.len() == 2
                && p.chars()
                    .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())
        })
}

/// Extracts the organizational prefix (`XX:XX:XX`) from MAC text. Returns
/// None when fewer than three well-formed octets are present.
pub fn oui_prefix(mac: &str) -> Option<String> {
    let normalized = normalize_mac(mac);
    let octets: Vec<&str> = normalized.split(':').take(3).collect();

    let valid = octets.len() == 3
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

    valid.then(|| octets.join(":"))
}

#[cfg(test)]
#[path = "./mac_tests.rs"]
mod tests;

//! Line grammar for `ip link show` output
//!
//! Device lines look like
//!
//! ```text
//! 5: tap0: <NO-CARRIER,BROADCAST,MULTICAST,UP> mtu 1500 qdisc fq_codel master tapbr0 state DOWN ...
//! ```
//!
//! with arbitrary flag/attribute tokens between the fixed parts.
//! Continuation lines (link-layer addresses) and anything else that does
//! not match the grammar are skipped, never fatal: listings mix device
//! types this tool does not care about.

use serde::Serialize;

/// One parsed device line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEntry {
    pub index: u32,
    pub name: String,
    /// Bridge this device is enslaved to, if any
    pub master: Option<String>,
}

/// Parse a full listing, one entry per parseable device line
pub fn parse_listing(text: &str) -> Vec<LinkEntry> {
    text.lines().filter_map(parse_line).collect()
}

/// Extract the `master <name>` relation from a device description block
///
/// Used for the single-device query, where the relation may sit on any
/// line of the block.
pub fn find_master(text: &str) -> Option<String> {
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "master" {
                if let Some(name) = tokens.next() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

fn parse_line(line: &str) -> Option<LinkEntry> {
    let mut tokens = line.split_whitespace();
    let index = tokens.next()?.strip_suffix(':')?.parse().ok()?;
    let name_token = tokens.next()?.strip_suffix(':')?;
    // veth-style names carry an `@peer` suffix that is not part of the name
    let name = name_token.split('@').next()?.to_string();

    let mut master = None;
    while let Some(token) = tokens.next() {
        if token == "master" {
            master = tokens.next().map(str::to_string);
            break;
        }
    }

    Some(LinkEntry {
        index,
        name,
        master,
    })
}

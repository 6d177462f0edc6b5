//! TL1 response formatting.
//!
//! Every response starts with a header naming the node and the time of the
//! answer:
//!
//! ```text
//!
//!    "NODE" 2024-01-31 12:00:00
//! M  1 COMPLD
//! ```
//!
//! Retrieve responses split their entries over pages of at most
//! [`ENTRIES_PER_PAGE`] entries. Every page repeats the header; all but the
//! last end with `>` and a blank line, the last one with `;`. Page sizes are
//! drawn from the caller's RNG so that a seeded session pages
//! deterministically.

use chrono::{Local, NaiveDateTime};
use rand::Rng;

use crate::entry::Tl1Entry;
use crate::error::ErrorCode;

/// Indentation of body lines.
pub const TAB: &str = "   ";

/// Upper bound on entries per page.
pub const ENTRIES_PER_PAGE: usize = 10;

/// Response type of normal (non-autonomous) messages.
pub const RESPONSE_TYPE: &str = "M";

/// Verb of a successful response.
pub const COMPLD: &str = "COMPLD";

/// Verb of a rejected command.
pub const DENY: &str = "DENY";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Response header stamped with the current local time.
pub fn header(node_name: &str, ctag: &str, verb: &str) -> String {
    header_at(node_name, ctag, verb, Local::now().naive_local())
}

/// Response header stamped with `at`.
pub fn header_at(node_name: &str, ctag: &str, verb: &str, at: NaiveDateTime) -> String {
    format!(
        "\r\n{TAB}\"{}\" {}\r\n{}  {} {}",
        node_name,
        at.format(TIMESTAMP_FORMAT),
        RESPONSE_TYPE,
        ctag,
        verb
    )
}

/// Complete `DENY` envelope for `code`.
pub fn error(node_name: &str, code: ErrorCode, ctag: &str) -> String {
    format!(
        "{}\r\n{TAB}{}\r\n{TAB}{}\r\n;\r\n",
        header(node_name, ctag, DENY),
        code.as_str(),
        code.comment()
    )
}

/// Successful response with one comment line, e.g. `/*AUTHTYPE=FAKE*/`.
pub fn completed_with_comment(tid: &str, ctag: &str, comment: &str) -> String {
    format!("{}\r\n{TAB}{}\r\n;\r\n", header(tid, ctag, COMPLD), comment)
}

/// Successful response without a body.
pub fn completed(tid: &str, ctag: &str) -> String {
    format!("{}\r\n;\r\n", header(tid, ctag, COMPLD))
}

/// Split `total` entries into page sizes, each in `1..=ENTRIES_PER_PAGE`.
pub fn page_sizes<R: Rng + ?Sized>(total: usize, rng: &mut R) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut remaining = total;
    while remaining > 0 {
        let size = rng.gen_range(1..=remaining.min(ENTRIES_PER_PAGE));
        sizes.push(size);
        remaining -= size;
    }
    sizes
}

/// Paginated retrieve response. No entries produce no output.
pub fn generate<R: Rng + ?Sized>(
    entries: &[Tl1Entry],
    tid: &str,
    ctag: &str,
    rng: &mut R,
) -> String {
    let sizes = page_sizes(entries.len(), rng);
    let last = sizes.len().saturating_sub(1);

    let mut response = String::new();
    let mut remaining = entries;
    for (index, size) in sizes.into_iter().enumerate() {
        let (page, rest) = remaining.split_at(size);
        remaining = rest;

        response.push_str(&header(tid, ctag, COMPLD));
        response.push_str("\r\n");
        for entry in page {
            response.push_str(&format!("{TAB}\"{}\"\r\n", entry));
        }
        response.push_str(if index == last { ";\r\n" } else { ">\r\n\r\n" });
    }
    response
}

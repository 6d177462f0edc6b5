//! TL1 command tokenising.
//!
//! A TL1 command is a list of colon separated blocks terminated by `;`:
//!
//! ```text
//! VERB:TID:AID:CTAG:ARG1:ARG2:KEYWORDS...;
//! ```
//!
//! The first four blocks are mandatory (they may be empty, except the CTAG).

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{ErrorCode, Tl1Fault};

/// Verbs accepted before login. Logout succeeds even without a login.
pub const LOGGED_OUT_COMMANDS: [&str; 2] = ["ACT-USER", "CANC-USER"];

/// A well formed TL1 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Verb as typed, e.g. `RTRV-EQPT`.
    pub verb: String,
    /// Target identifier with surrounding quotes removed.
    pub tid: String,
    pub aid: String,
    pub ctag: String,
    /// Blocks 5 and 6, quotes removed.
    pub args: Vec<String>,
    /// Blocks 7 onwards, raw.
    pub keywords: Vec<String>,
}

impl Invocation {
    /// Tokenise `line`. Surrounding whitespace and one trailing `;` are
    /// ignored.
    ///
    /// Checks run in order and the first failing one wins: an empty line or a
    /// line without `:` is `IITA`, fewer than four blocks is `IBMS`, an empty
    /// or quoted CTAG is `IICT`. None of these carry the CTAG.
    pub fn parse(line: &str) -> Result<Invocation, Tl1Fault> {
        let line = line.trim();
        let line = line.strip_suffix(';').unwrap_or(line).trim();
        if line.is_empty() {
            return Err(Tl1Fault::new(ErrorCode::Iita));
        }

        let blocks: Vec<&str> = line.split(':').collect();
        match blocks.len() {
            1 => return Err(Tl1Fault::new(ErrorCode::Iita)),
            2 | 3 => return Err(Tl1Fault::new(ErrorCode::Ibms)),
            _ => {}
        }

        let ctag = blocks[3];
        if ctag.is_empty() || ctag.contains('"') {
            return Err(Tl1Fault::new(ErrorCode::Iict));
        }

        Ok(Invocation {
            verb: blocks[0].to_string(),
            tid: strip_quotes(blocks[1]).to_string(),
            aid: blocks[2].to_string(),
            ctag: ctag.to_string(),
            args: blocks
                .iter()
                .skip(4)
                .take(2)
                .map(|arg| strip_quotes(arg).to_string())
                .collect(),
            keywords: blocks.iter().skip(6).map(|k| k.to_string()).collect(),
        })
    }

    /// Registry key of the verb: `RTRV-EQPT` becomes `rtrv_eqpt`.
    pub fn handler_name(&self) -> String {
        self.verb.replace('-', "_").to_lowercase()
    }

    /// Whether the verb may be used without an active login.
    pub fn allowed_logged_out(&self) -> bool {
        LOGGED_OUT_COMMANDS.contains(&self.verb.as_str())
    }

    /// Whether the AID selects everything.
    pub fn aid_is_all(&self) -> bool {
        self.aid.is_empty() || self.aid == "ALL"
    }

    /// Keyword blocks parsed into a map. `K=V` gives `Some(V)`, a bare `K`
    /// gives `None`. Pairs are separated by `,` within and across blocks.
    pub fn keyword_map(&self) -> BTreeMap<String, Option<String>> {
        let mut result = BTreeMap::new();
        for block in &self.keywords {
            for pair in block.split(',').filter(|p| !p.is_empty()) {
                let parts: Vec<&str> = pair.split('=').collect();
                match parts.as_slice() {
                    [key, value] => {
                        result.insert(key.to_string(), Some(value.to_string()));
                    }
                    [key] => {
                        result.insert(key.to_string(), None);
                    }
                    [key, ..] => {
                        warn!("Failed to parse keyword: {}", pair);
                        result.insert(key.to_string(), None);
                    }
                    [] => {}
                }
            }
        }
        result
    }
}

fn strip_quotes(block: &str) -> &str {
    block.trim_matches('"')
}

//! TL1 command processor.
//!
//! [`Tl1`] is the protocol half of a [`Processor`]: it tokenises lines,
//! enforces the login gate and owns the per-session state (identity, MOTD
//! flag, paging RNG). The handlers below implement the supported verbs.

use std::sync::Arc;
use std::time::Duration;

use fakeswitch_engine::{Parsed, Processor, Protocol, Registry, Terminal};
use fakeswitch_model::SwitchConfiguration;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::command::Invocation;
use crate::entry::Tl1Entry;
use crate::error::{ErrorCode, Tl1Fault, NO_CTAG};
use crate::response;

/// Banner shown before the first prompt of a session, as the 6500 prints it.
pub const MOTD: &str = concat!(
    "\n",
    "\n",
    "This computer system may be accessed only by authorized users.\n",
    "The data and programs in this system are private, proprietary,\n",
    "confidential and protected by copyright law and international\n",
    "treaties. Unauthorized access, use, knowledge, duplication,\n",
    "reproduction, modification, distribution, retransmission,\n",
    "download or disclosure of any of the data and programs in this\n",
    "system or any portion of it may result in severe civil and\n",
    "criminal penalties and will be enforced and prosecuted to the\n",
    "maximum extent possible under law. Employees or other Company\n",
    "authorized users exceeding their authorizations subject\n",
    "themselves to Company initiated disciplinary proceedings.\n",
    "\n",
    "--- Copyright (c) 2000 - 2020 Ciena (R) Corporation. All Rights Reserved ---\n",
    "|  NOTICE: This is a private computer system.                              |\n",
    "|  Unauthorized access or use may lead to prosecution.                     |\n",
    "|                                                                          |\n",
    "|  Ciena 6500-7 PACKET-OPTICAL                                             |\n",
    "----------------------------------------------------------------------------\n",
    "\n",
    "/*\n",
    " * Starting Interactive TL1 Command Mode.\n",
    " * Type ? for help while constructing TL1 commands.\n",
    " * Type .? for specific parameter/keyword help.\n",
    " */\n",
    "\n",
);

/// Comment line of a successful login.
pub const AUTHTYPE_COMMENT: &str = "/*AUTHTYPE=FAKE*/";

/// Default time a login takes to complete.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_secs(1);

/// Settings shared by every TL1 session of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tl1Options {
    /// Pause before answering a successful `ACT-USER`.
    pub login_delay: Duration,
    /// Base seed for response paging; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for Tl1Options {
    fn default() -> Self {
        Tl1Options {
            login_delay: DEFAULT_LOGIN_DELAY,
            seed: None,
        }
    }
}

/// Per-session TL1 protocol state.
#[derive(Debug)]
pub struct Tl1 {
    node_name: String,
    config: Arc<SwitchConfiguration>,
    motd_shown: bool,
    authed: Option<String>,
    rng: ChaCha8Rng,
    login_delay: Duration,
}

impl Tl1 {
    /// Fresh session state for connection `connection_id`.
    pub fn new(config: Arc<SwitchConfiguration>, options: &Tl1Options, connection_id: u64) -> Self {
        let rng = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(connection_id)),
            None => ChaCha8Rng::from_entropy(),
        };
        Tl1 {
            node_name: config.node_name.clone(),
            config,
            motd_shown: false,
            authed: None,
            rng,
            login_delay: options.login_delay,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Identity of the logged in user, if any.
    pub fn authed(&self) -> Option<&str> {
        self.authed.as_deref()
    }

    /// Write a `DENY` envelope.
    pub fn error(&self, terminal: &mut Terminal, code: ErrorCode, ctag: &str) {
        terminal.write(&response::error(&self.node_name, code, ctag));
    }
}

impl Protocol for Tl1 {
    type Request = Invocation;
    type Fault = Tl1Fault;

    fn name(&self) -> &'static str {
        "tl1"
    }

    fn parse(&self, line: &str) -> Parsed<Invocation, Tl1Fault> {
        let invocation = match Invocation::parse(line) {
            Ok(invocation) => invocation,
            Err(fault) => return Parsed::Fault(fault),
        };

        if self.authed.is_none() && !invocation.allowed_logged_out() {
            return Parsed::Fault(Tl1Fault::with_ctag(ErrorCode::Plna, &invocation.ctag));
        }

        info!(
            "exec tokens: verb={}, tid={}, aid={}, ctag={}, args={:?}, keywords={:?}",
            invocation.verb,
            invocation.tid,
            invocation.aid,
            invocation.ctag,
            invocation.args,
            invocation.keywords
        );
        Parsed::Command {
            verb: invocation.handler_name(),
            request: invocation,
        }
    }

    fn reject(processor: &mut Processor<Self>, terminal: &mut Terminal, fault: Tl1Fault) {
        debug!("rejecting line: {}", fault);
        processor.protocol().error(terminal, fault.code, &fault.ctag);
    }

    fn prompt(&mut self) -> String {
        if self.motd_shown {
            return "< ".to_string();
        }
        self.motd_shown = true;
        format!("{}\r\n< ", MOTD)
    }

    fn unknown_command(processor: &mut Processor<Self>, terminal: &mut Terminal, _line: &str) {
        processor.protocol().error(terminal, ErrorCode::Icnv, NO_CTAG);
    }
}

/// Handlers of the supported TL1 verbs.
pub fn registry() -> Registry<Tl1> {
    Registry::new()
        .with("act_user", do_act_user)
        .with("canc_user", do_canc_user)
        .with("rtrv_eqpt", do_rtrv_eqpt)
}

/// A TL1 processor for one session.
pub fn new_processor(
    config: Arc<SwitchConfiguration>,
    options: &Tl1Options,
    connection_id: u64,
) -> Processor<Tl1> {
    Processor::new(Tl1::new(config, options, connection_id), registry())
}

/// `ACT-USER:TID:USER:CTAG::PASSWORD;`
fn do_act_user(processor: &mut Processor<Tl1>, terminal: &mut Terminal, invocation: Invocation) {
    let password = match invocation.args.as_slice() {
        [_, password] => password,
        _ => return processor.protocol().error(terminal, ErrorCode::Ipms, &invocation.ctag),
    };
    if password.is_empty() {
        return processor.protocol().error(terminal, ErrorCode::Ipms, &invocation.ctag);
    }

    let tl1 = processor.protocol_mut();
    info!("user {} logged in", invocation.aid);
    tl1.authed = Some(invocation.aid.clone());

    terminal.pause(tl1.login_delay);
    terminal.write(&response::completed_with_comment(
        &invocation.tid,
        &invocation.ctag,
        AUTHTYPE_COMMENT,
    ));
}

/// `CANC-USER:TID:USER:CTAG;`
fn do_canc_user(processor: &mut Processor<Tl1>, terminal: &mut Terminal, invocation: Invocation) {
    if let Some(user) = processor.protocol_mut().authed.take() {
        info!("user {} logged out", user);
    }
    terminal.write(&response::completed(&invocation.tid, &invocation.ctag));
}

/// `RTRV-EQPT:TID:AID:CTAG;`, AID empty or `ALL` for every card, otherwise
/// the cards whose full AID starts with it.
fn do_rtrv_eqpt(processor: &mut Processor<Tl1>, terminal: &mut Terminal, invocation: Invocation) {
    let tl1 = processor.protocol_mut();
    let entries: Vec<Tl1Entry> = tl1
        .config
        .cards()
        .filter_map(|card| {
            let aid = card.full_aid();
            if !invocation.aid_is_all() && !aid.starts_with(&invocation.aid) {
                return None;
            }
            Some(Tl1Entry {
                aid,
                type_tag: String::new(),
                fields: card.fields.clone(),
                statuses: card.statuses.clone(),
            })
        })
        .collect();

    debug!("{} entries match {:?}", entries.len(), invocation.aid);
    let listing = response::generate(&entries, &invocation.tid, &invocation.ctag, &mut tl1.rng);
    terminal.write(&listing);
}

//! Statement sessions: assemble query text (with `?` placeholders) through
//! `send`, then stream one value per query back through `recv`.

pub mod context;
pub mod protocol;
pub mod remote;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::records::Record;

pub use context::Context;
pub use remote::{RemoteSession, serve};

/// Flags carried by `send` and by every [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CtxFlags(pub u8);

impl CtxFlags {
    pub const NONE: u8 = 0;
    /// More values follow for this statement (on send: more text follows).
    pub const MORE: u8 = 0x01;
    /// Last value of a statement.
    pub const TAIL: u8 = 0x02;
    /// First value of a statement.
    pub const HEAD: u8 = 0x04;
    /// Suppress the statement's values.
    pub const QUIET: u8 = 0x08;
    /// The session has ended.
    pub const QUIT: u8 = 0x10;

    pub fn new() -> Self {
        Self(Self::NONE)
    }

    pub fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }

    pub fn is_more(&self) -> bool {
        self.0 & Self::MORE != 0
    }

    pub fn is_tail(&self) -> bool {
        self.0 & Self::TAIL != 0
    }

    pub fn is_head(&self) -> bool {
        self.0 & Self::HEAD != 0
    }

    pub fn is_quiet(&self) -> bool {
        self.0 & Self::QUIET != 0
    }

    pub fn is_quit(&self) -> bool {
        self.0 & Self::QUIT != 0
    }
}

/// One value of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// JSON-encoded [`QueryResult`], empty for quiet or quit responses
    pub body: String,
    pub flags: CtxFlags,
}

impl Response {
    /// Decode the body, `None` when it is empty.
    pub fn value(&self) -> Result<Option<QueryResult>> {
        if self.body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&self.body)?))
    }
}

/// Result of one query, as carried in a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub nhits: usize,
    pub records: Vec<Record>,
}

/// A place to send statements and receive their values.
pub trait Session {
    /// Append `fragment` to the pending statement, or substitute it for the
    /// oldest open placeholder.
    ///
    /// Returns true when this completed a statement whose values are now
    /// waiting for [`recv`](Session::recv).
    fn send(&mut self, fragment: &str, flags: CtxFlags) -> Result<bool>;

    /// Next value of the oldest completed statement.
    fn recv(&mut self) -> Result<Response>;

    /// Send `fragments` in order and collect the values of every statement
    /// they complete.
    ///
    /// Each completed statement is drained before the next fragment is sent.
    /// Fails with `Protocol` if the last fragment leaves a statement open.
    fn exec(&mut self, fragments: &[&str]) -> Result<Vec<Response>> {
        let mut values = Vec::new();
        let mut open = false;
        for fragment in fragments {
            if !self.send(fragment, CtxFlags::new())? {
                open = true;
                continue;
            }
            open = false;
            loop {
                let response = self.recv()?;
                let more = response.flags.is_more();
                values.push(response);
                if !more {
                    break;
                }
            }
        }
        if open || fragments.is_empty() {
            return Err(Error::protocol("exec ended with no complete statement"));
        }
        Ok(values)
    }
}

//! Diagnostic triggers.
//!
//! # Data Flow
//! ```text
//! kill -RTMIN+N      → signal handler   → pipe    ┐
//! registrar.request  → api channel                ├→ Dispatcher → callback
//! panic (panic_hook) → api channel (exception)    ┘
//! ```
//!
//! Each action carries a `TriggerSet` in the options file
//! (`"nodereport": "api+signal+exception"`) naming the sources allowed to
//! request it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod panic_hook;

pub use panic_hook::install_panic_trigger;

/// Where a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// Programmatic request through the registrar.
    Api,
    /// Real-time signal delivered by the OS.
    Signal,
    /// Panic hook.
    Exception,
}

impl TriggerSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Api => "api",
            TriggerSource::Signal => "signal",
            TriggerSource::Exception => "exception",
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trigger {0:?} (expected api, signal or exception)")]
pub struct TriggerParseError(pub String);

/// Set of sources allowed to request one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerSet {
    api: bool,
    signal: bool,
    exception: bool,
}

impl TriggerSet {
    pub const NONE: TriggerSet = TriggerSet { api: false, signal: false, exception: false };

    /// `api+signal`, the default for every action.
    pub const API_AND_SIGNAL: TriggerSet = TriggerSet { api: true, signal: true, exception: false };

    pub fn contains(&self, source: TriggerSource) -> bool {
        match source {
            TriggerSource::Api => self.api,
            TriggerSource::Signal => self.signal,
            TriggerSource::Exception => self.exception,
        }
    }

    pub fn with(mut self, source: TriggerSource) -> Self {
        match source {
            TriggerSource::Api => self.api = true,
            TriggerSource::Signal => self.signal = true,
            TriggerSource::Exception => self.exception = true,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl FromStr for TriggerSet {
    type Err = TriggerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::NONE);
        }

        s.split('+').try_fold(Self::NONE, |set, token| {
            let source = match token.trim().to_ascii_lowercase().as_str() {
                "api" => TriggerSource::Api,
                "signal" => TriggerSource::Signal,
                "exception" => TriggerSource::Exception,
                _ => return Err(TriggerParseError(token.trim().to_string())),
            };
            Ok(set.with(source))
        })
    }
}

impl TryFrom<String> for TriggerSet {
    type Error = TriggerParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TriggerSet> for String {
    fn from(set: TriggerSet) -> Self {
        set.to_string()
    }
}

impl fmt::Display for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for source in [TriggerSource::Api, TriggerSource::Signal, TriggerSource::Exception] {
            if self.contains(source) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(source.as_str())?;
                first = false;
            }
        }
        Ok(())
    }
}

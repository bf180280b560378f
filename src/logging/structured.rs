// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Rich diagnostic payload that can be attached to a log call.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Structured diagnostic attached to a log record
///
/// Each field is rendered only when non-empty. Instances are usually kept
/// as templates and specialised per failure with [`RichError::with_err`].
#[derive(Clone, Default)]
pub struct RichError {
    /// Additional information, e.g. a link to a page describing the error
    pub more_info: String,
    /// Likely impact on system function
    pub impact: String,
    /// Next step the operator should take
    pub action: String,
    /// Likely cause of the error
    pub likely_cause: String,
    err: Option<SharedError>,
}

impl RichError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn more_info(mut self, more_info: impl Into<String>) -> Self {
        self.more_info = more_info.into();
        self
    }

    pub fn impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn likely_cause(mut self, likely_cause: impl Into<String>) -> Self {
        self.likely_cause = likely_cause.into();
        self
    }

    /// Copy of this template wrapping `err`; the template is left untouched
    pub fn with_err<E>(&self, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let mut out = self.clone();
        out.err = Some(Arc::new(err));
        out
    }

    /// Copy of this template wrapping a plain message as the underlying error
    pub fn with_err_msg(&self, msg: impl Into<String>) -> Self {
        self.with_err(MessageError(msg.into()))
    }

    /// Rendered form of the wrapped error, empty when there is none
    pub fn err_string(&self) -> String {
        self.err.as_ref().map(|e| e.to_string()).unwrap_or_default()
    }

    /// Non-empty `(key, value)` pairs in rendering order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("moreInfo", self.more_info.clone()),
            ("impact", self.impact.clone()),
            ("action", self.action.clone()),
            ("likelyCause", self.likely_cause.clone()),
            ("err", self.err_string()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

impl fmt::Debug for RichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichError")
            .field("more_info", &self.more_info)
            .field("impact", &self.impact)
            .field("action", &self.action)
            .field("likely_cause", &self.likely_cause)
            .field("err", &self.err_string())
            .finish()
    }
}

impl fmt::Display for RichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\tmoreInfo={} impact={} action={} likelyCause={} err={}",
            self.more_info,
            self.impact,
            self.action,
            self.likely_cause,
            self.err_string()
        )
    }
}

impl StdError for RichError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.err.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

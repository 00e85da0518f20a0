use crate::core::targets::error::TargetError;
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::str::FromStr;
use thiserror::Error;

/// Restart-builder errors: the persisted fragment could not be read or resolved.
///
/// Any of these aborts the read of the current fragment; whether that is fatal
/// to the whole restore is decided by the caller.
#[derive(Debug, Error)]
pub enum RestartError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Restart data ended early while reading {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Malformed {expected} on line {line}: '{token}'")]
    Malformed {
        line: usize,
        expected: &'static str,
        token: String,
    },

    #[error("Negative {field} on line {line}: {value}")]
    Negative {
        line: usize,
        field: &'static str,
        value: i64,
    },

    #[error("Invalid {field} on line {line}: {reason}")]
    Invalid {
        line: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Unknown {category} kind '{keyword}' on line {line}")]
    UnknownKind {
        line: usize,
        category: &'static str,
        keyword: String,
    },

    #[error("Restart stream is invalid after an earlier read error")]
    StreamInvalid,

    #[error("Bead id {0} does not exist in the entity store")]
    UnknownBead(usize),

    #[error("Polymer id {0} does not exist in the entity store")]
    UnknownPolymer(usize),

    #[error("Target id {0} is not defined in the restart data")]
    UnknownTarget(usize),

    #[error("Decorated target '{0}' is not defined in the restart data")]
    UnknownTargetLabel(String),

    #[error("Target id {0} is defined more than once")]
    DuplicateTargetId(usize),

    #[error("Child target id {id} is not labelled '{label}'")]
    ChildMismatch { id: usize, label: String },

    #[error("Restored data violates a target invariant: {0}")]
    Target(#[from] TargetError),

    #[error("Label '{0}' cannot be persisted: labels must be non-empty and free of whitespace")]
    UnwritableLabel(String),
}

/// Pulls whitespace-separated scalars out of a line-oriented restart stream.
///
/// Once a read fails, the reader is flagged bad and every further read fails
/// with [`RestartError::StreamInvalid`].
pub struct RestartReader<'a> {
    source: &'a mut dyn BufRead,
    pending: VecDeque<String>,
    line: usize,
    good: bool,
}

impl<'a> RestartReader<'a> {
    pub fn new(source: &'a mut dyn BufRead) -> Self {
        Self {
            source,
            pending: VecDeque::new(),
            line: 0,
            good: true,
        }
    }

    pub fn is_good(&self) -> bool {
        self.good
    }

    /// Line number of the most recently consumed token.
    pub fn line(&self) -> usize {
        self.line
    }

    fn guard<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, RestartError>,
    ) -> Result<T, RestartError> {
        if !self.good {
            return Err(RestartError::StreamInvalid);
        }
        let result = read(self);
        if result.is_err() {
            self.good = false;
        }
        result
    }

    fn next_raw(&mut self, expected: &'static str) -> Result<String, RestartError> {
        while self.pending.is_empty() {
            let mut buf = String::new();
            if self.source.read_line(&mut buf)? == 0 {
                return Err(RestartError::UnexpectedEnd { expected });
            }
            self.line += 1;
            self.pending
                .extend(buf.split_whitespace().map(str::to_string));
        }
        self.pending
            .pop_front()
            .ok_or(RestartError::UnexpectedEnd { expected })
    }

    fn parse_raw<T: FromStr>(&mut self, expected: &'static str) -> Result<T, RestartError> {
        let token = self.next_raw(expected)?;
        token.parse().map_err(|_| RestartError::Malformed {
            line: self.line,
            expected,
            token,
        })
    }

    fn non_negative_raw(&mut self, field: &'static str) -> Result<usize, RestartError> {
        let value: i64 = self.parse_raw(field)?;
        if value < 0 {
            return Err(RestartError::Negative {
                line: self.line,
                field,
                value,
            });
        }
        usize::try_from(value).map_err(|_| RestartError::Malformed {
            line: self.line,
            expected: field,
            token: value.to_string(),
        })
    }

    /// Reads the next token verbatim.
    pub fn read_token(&mut self, expected: &'static str) -> Result<String, RestartError> {
        self.guard(|r| r.next_raw(expected))
    }

    /// Reads a count or id; negative values are rejected.
    pub fn read_count(&mut self, field: &'static str) -> Result<usize, RestartError> {
        self.guard(|r| r.non_negative_raw(field))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, RestartError> {
        self.guard(|r| r.non_negative_raw(field).map(|v| v as u64))
    }

    pub fn read_f64(&mut self, field: &'static str) -> Result<f64, RestartError> {
        self.guard(|r| r.parse_raw(field))
    }

    /// Reads `count` non-negative integers.
    pub fn read_counts(
        &mut self,
        count: usize,
        field: &'static str,
    ) -> Result<Vec<usize>, RestartError> {
        // Counts come from the stream, so the buffer grows with what is actually read.
        let mut values = Vec::new();
        for _ in 0..count {
            values.push(self.read_count(field)?);
        }
        Ok(values)
    }

    /// Flags the stream bad and returns an [`RestartError::Invalid`] for the current line.
    pub fn invalid(&mut self, field: &'static str, reason: impl Into<String>) -> RestartError {
        self.good = false;
        RestartError::Invalid {
            line: self.line,
            field,
            reason: reason.into(),
        }
    }

    /// Flags the stream bad and returns an [`RestartError::UnknownKind`].
    pub fn unknown_kind(&mut self, category: &'static str, keyword: String) -> RestartError {
        self.good = false;
        RestartError::UnknownKind {
            line: self.line,
            category,
            keyword,
        }
    }
}

/// Checks that a label can be written as a single whitespace-free token.
pub fn check_label(label: &str) -> Result<&str, RestartError> {
    if label.is_empty() || label.chars().any(char::is_whitespace) {
        Err(RestartError::UnwritableLabel(label.to_string()))
    } else {
        Ok(label)
    }
}

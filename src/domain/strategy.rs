//! Strategy variants and their textual configuration form.
//!
//! Grammar (case-insensitive, whitespace-tolerant):
//! ```text
//! list     := spec ("," spec)*
//! spec     := "SMA" "(" int ")" | "CROSS" "(" int "," int ")"
//! ```

use std::fmt;
use std::num::NonZeroUsize;

use crate::domain::error::{SmacrossError, StrategyParseError};

pub const DEFAULT_STRATEGIES: &str = "SMA(10), SMA(30), CROSS(10,30)";

/// One strategy variant together with its parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategySpec {
    /// Long while the close is above a single moving average.
    ThresholdCross { window: NonZeroUsize },
    /// Long from an upward short/long average cross to the next downward cross.
    DualCross {
        short: NonZeroUsize,
        long: NonZeroUsize,
    },
}

impl StrategySpec {
    pub fn threshold(window: usize) -> Result<Self, SmacrossError> {
        Ok(StrategySpec::ThresholdCross {
            window: positive_window(window, "window")?,
        })
    }

    pub fn dual_cross(short: usize, long: usize) -> Result<Self, SmacrossError> {
        let short_w = positive_window(short, "short window")?;
        let long_w = positive_window(long, "long window")?;
        if short >= long {
            return Err(SmacrossError::invalid(
                "strategies",
                "list",
                format!("CROSS short window {short} must be less than long window {long}"),
            ));
        }
        Ok(StrategySpec::DualCross {
            short: short_w,
            long: long_w,
        })
    }

    /// Label written to the trade ledger's strategy column.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Largest window, i.e. bars needed before the first computed value.
    pub fn warmup_bars(&self) -> usize {
        match self {
            StrategySpec::ThresholdCross { window } => window.get(),
            StrategySpec::DualCross { long, .. } => long.get(),
        }
    }
}

impl fmt::Display for StrategySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategySpec::ThresholdCross { window } => write!(f, "SMA({})", window),
            StrategySpec::DualCross { short, long } => write!(f, "CROSS({},{})", short, long),
        }
    }
}

fn positive_window(value: usize, what: &str) -> Result<NonZeroUsize, SmacrossError> {
    NonZeroUsize::new(value).ok_or_else(|| {
        SmacrossError::invalid("strategies", "list", format!("{what} must be positive"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecKind {
    Sma,
    Cross,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> StrategyParseError {
        StrategyParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), StrategyParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn parse_word(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_kind(&mut self) -> Result<SpecKind, StrategyParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let word = self.parse_word();
        match word.to_ascii_uppercase().as_str() {
            "SMA" => Ok(SpecKind::Sma),
            "CROSS" => Ok(SpecKind::Cross),
            _ => {
                self.pos = start;
                let found = if word.is_empty() {
                    self.peek()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "end of input".to_string())
                } else {
                    word
                };
                Err(self.error(format!("expected 'SMA' or 'CROSS', found '{}'", found)))
            }
        }
    }

    fn parse_integer(&mut self) -> Result<usize, StrategyParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if start == self.pos {
            return Err(self.error("expected integer"));
        }
        let digits = &self.input[start..self.pos];
        digits.parse::<usize>().map_err(|_| StrategyParseError {
            message: format!("invalid integer: {}", digits),
            position: start,
        })
    }

    fn parse_spec(&mut self) -> Result<(SpecKind, Vec<usize>), StrategyParseError> {
        let kind = self.parse_kind()?;
        self.expect_char('(')?;
        let mut args = vec![self.parse_integer()?];
        if kind == SpecKind::Cross {
            self.expect_char(',')?;
            args.push(self.parse_integer()?);
        }
        self.expect_char(')')?;
        Ok((kind, args))
    }

    fn parse_list(&mut self) -> Result<Vec<(SpecKind, Vec<usize>)>, StrategyParseError> {
        let mut specs = vec![self.parse_spec()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(specs),
                Some(',') => {
                    self.advance();
                    specs.push(self.parse_spec()?);
                }
                Some(ch) => return Err(self.error(format!("expected ',', found '{}'", ch))),
            }
        }
    }
}

/// Parse a comma-separated strategy list such as `SMA(10), CROSS(10,30)`.
///
/// Syntax problems surface as [`SmacrossError::StrategyParse`]; well-formed
/// specs with unusable windows surface as [`SmacrossError::ConfigInvalid`].
pub fn parse_strategy_list(input: &str) -> Result<Vec<StrategySpec>, SmacrossError> {
    let raw = Parser::new(input).parse_list()?;
    raw.into_iter()
        .map(|(kind, args)| match kind {
            SpecKind::Sma => StrategySpec::threshold(args[0]),
            SpecKind::Cross => StrategySpec::dual_cross(args[0], args[1]),
        })
        .collect()
}

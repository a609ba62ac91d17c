//! Domain error types.

/// A strategy-spec parse error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("strategy parse error at position {position}: {message}")]
pub struct StrategyParseError {
    pub message: String,
    pub position: usize,
}

impl StrategyParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!("{input}\n{caret}\n{err}", err = self)
    }
}

/// Why a prospective order could not be sized on this step. Never fatal:
/// the instance stays where it is and tries again on the next bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("insufficient funds: cash {cash:.2} does not exceed cost {cost:.2}")]
    InsufficientFunds { cash: f64, cost: f64 },

    #[error("order size rounds to zero (equity {equity:.2}, price {price:.2})")]
    ZeroQuantity { equity: f64, price: f64 },
}

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    StrategyParse(#[from] StrategyParseError),

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmacrossError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SmacrossError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error class.
    pub fn exit_status(&self) -> u8 {
        match self {
            SmacrossError::Io(_) | SmacrossError::Report { .. } => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. } => 2,
            SmacrossError::StrategyParse(_) => 4,
            SmacrossError::NoData { .. }
            | SmacrossError::InsufficientData { .. }
            | SmacrossError::Data { .. } => 5,
        }
    }
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

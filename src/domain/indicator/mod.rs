//! Indicator engine.
//!
//! Indicators are updated one bar at a time and report either a computed
//! value or an explicit not-ready state while their window is still filling:
//! - `IndicatorState`: current value plus the value from the prior bar
//! - `IndicatorReading`: ready/not-ready wrapper returned by every update
//! - `SmaWindow`: trailing simple moving average (see [`sma`])

pub mod sma;

pub use sma::SmaWindow;

/// Current and previous value of a rolling indicator.
///
/// `previous` is `None` on the first bar the indicator becomes ready, since
/// the indicator was undefined one bar earlier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorState {
    pub current: f64,
    pub previous: Option<f64>,
}

impl IndicatorState {
    /// Both values, when the indicator has at least one bar of history.
    pub fn pair(&self) -> Option<(f64, f64)> {
        self.previous.map(|prev| (self.current, prev))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorReading {
    NotReady { observed: usize, required: usize },
    Ready(IndicatorState),
}

impl IndicatorReading {
    pub fn is_ready(&self) -> bool {
        matches!(self, IndicatorReading::Ready(_))
    }

    pub fn state(&self) -> Option<IndicatorState> {
        match self {
            IndicatorReading::Ready(state) => Some(*state),
            IndicatorReading::NotReady { .. } => None,
        }
    }
}

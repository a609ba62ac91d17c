//! Signal evaluation.
//!
//! Both evaluators are pure: they read indicator readings, the close and
//! whether a position is open, and return what to do. All comparisons are
//! strict, so equal values never trigger anything.

use std::fmt;

use crate::domain::indicator::IndicatorReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Open,
    Close,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Open => write!(f, "OPEN"),
            Signal::Close => write!(f, "CLOSE"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Indicator readings for one bar, shaped by strategy variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalInputs {
    Threshold {
        price: f64,
        sma: IndicatorReading,
    },
    DualCross {
        short: IndicatorReading,
        long: IndicatorReading,
    },
}

impl SignalInputs {
    /// True while any window still lacks the history needed for a decision.
    pub fn is_warming_up(&self) -> bool {
        let history = |r: &IndicatorReading| r.state().and_then(|s| s.pair()).is_some();
        match self {
            SignalInputs::Threshold { sma, .. } => !history(sma),
            SignalInputs::DualCross { short, long } => !(history(short) && history(long)),
        }
    }

    pub fn evaluate(&self, position_open: bool) -> Signal {
        match *self {
            SignalInputs::Threshold { price, sma } => evaluate_threshold(price, sma, position_open),
            SignalInputs::DualCross { short, long } => {
                evaluate_dual_cross(short, long, position_open)
            }
        }
    }
}

/// Close vs. a single moving average.
///
/// OPEN when `price > sma` and flat, CLOSE when `price < sma` and long.
/// The average must have one bar of history (`previous` defined) first.
pub fn evaluate_threshold(price: f64, sma: IndicatorReading, position_open: bool) -> Signal {
    let Some((current, _)) = sma.state().and_then(|s| s.pair()) else {
        return Signal::Hold;
    };

    if !position_open && price > current {
        Signal::Open
    } else if position_open && price < current {
        Signal::Close
    } else {
        Signal::Hold
    }
}

/// Strict crossing between a short and a long moving average, judged on
/// this bar against the previous one only.
pub fn evaluate_dual_cross(
    short: IndicatorReading,
    long: IndicatorReading,
    position_open: bool,
) -> Signal {
    let (Some((short_now, short_prev)), Some((long_now, long_prev))) = (
        short.state().and_then(|s| s.pair()),
        long.state().and_then(|s| s.pair()),
    ) else {
        return Signal::Hold;
    };

    let crossed_up = short_now > long_now && short_prev < long_prev;
    let crossed_down = short_now < long_now && short_prev > long_prev;

    if !position_open && crossed_up {
        Signal::Open
    } else if position_open && crossed_down {
        Signal::Close
    } else {
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorState, SmaWindow};
    use std::num::NonZeroUsize;

    fn ready(current: f64, previous: f64) -> IndicatorReading {
        IndicatorReading::Ready(IndicatorState {
            current,
            previous: Some(previous),
        })
    }

    fn first_ready(current: f64) -> IndicatorReading {
        IndicatorReading::Ready(IndicatorState {
            current,
            previous: None,
        })
    }

    const NOT_READY: IndicatorReading = IndicatorReading::NotReady {
        observed: 1,
        required: 2,
    };

    #[test]
    fn threshold_opens_above_average_when_flat() {
        assert_eq!(evaluate_threshold(12.0, ready(11.5, 10.5), false), Signal::Open);
    }

    #[test]
    fn threshold_closes_below_average_when_long() {
        assert_eq!(evaluate_threshold(11.0, ready(11.5, 10.5), true), Signal::Close);
    }

    #[test]
    fn threshold_equality_holds() {
        assert_eq!(evaluate_threshold(11.5, ready(11.5, 10.5), false), Signal::Hold);
        assert_eq!(evaluate_threshold(11.5, ready(11.5, 10.5), true), Signal::Hold);
    }

    #[test]
    fn threshold_respects_position_state() {
        assert_eq!(evaluate_threshold(12.0, ready(11.5, 10.5), true), Signal::Hold);
        assert_eq!(evaluate_threshold(11.0, ready(11.5, 10.5), false), Signal::Hold);
    }

    #[test]
    fn threshold_holds_without_history() {
        assert_eq!(evaluate_threshold(100.0, NOT_READY, false), Signal::Hold);
        assert_eq!(evaluate_threshold(100.0, first_ready(10.0), false), Signal::Hold);
    }

    #[test]
    fn threshold_opens_on_third_bar_not_second() {
        let mut sma = SmaWindow::new(NonZeroUsize::new(2).unwrap());
        let signals: Vec<Signal> = [10.0, 11.0, 12.0]
            .iter()
            .map(|&close| evaluate_threshold(close, sma.update(close), false))
            .collect();
        assert_eq!(signals, vec![Signal::Hold, Signal::Hold, Signal::Open]);
    }

    #[test]
    fn dual_cross_opens_on_strict_upward_cross() {
        assert_eq!(
            evaluate_dual_cross(ready(7.0, 5.0), ready(6.0, 6.0), false),
            Signal::Open
        );
    }

    #[test]
    fn dual_cross_from_equal_is_not_a_cross() {
        // short 5,6,7 against long 6,6,6: at the last bar short[t-1] == long[t-1]
        assert_eq!(
            evaluate_dual_cross(ready(7.0, 6.0), ready(6.0, 6.0), false),
            Signal::Hold
        );
        assert_eq!(
            evaluate_dual_cross(ready(6.0, 5.0), ready(6.0, 6.0), false),
            Signal::Hold
        );
    }

    #[test]
    fn dual_cross_above_without_crossing_holds() {
        assert_eq!(
            evaluate_dual_cross(ready(9.0, 8.0), ready(6.0, 6.0), false),
            Signal::Hold
        );
    }

    #[test]
    fn dual_cross_closes_on_strict_downward_cross() {
        assert_eq!(
            evaluate_dual_cross(ready(5.0, 7.0), ready(6.0, 6.0), true),
            Signal::Close
        );
        assert_eq!(
            evaluate_dual_cross(ready(5.0, 7.0), ready(6.0, 6.0), false),
            Signal::Hold
        );
    }

    #[test]
    fn dual_cross_upward_cross_while_long_holds() {
        assert_eq!(
            evaluate_dual_cross(ready(7.0, 5.0), ready(6.0, 6.0), true),
            Signal::Hold
        );
    }

    #[test]
    fn dual_cross_holds_while_either_window_warms_up() {
        assert_eq!(evaluate_dual_cross(ready(7.0, 5.0), NOT_READY, false), Signal::Hold);
        assert_eq!(
            evaluate_dual_cross(ready(7.0, 5.0), first_ready(6.0), false),
            Signal::Hold
        );
    }

    #[test]
    fn inputs_dispatch_by_variant() {
        let threshold = SignalInputs::Threshold {
            price: 12.0,
            sma: ready(11.5, 10.5),
        };
        assert!(!threshold.is_warming_up());
        assert_eq!(threshold.evaluate(false), Signal::Open);

        let cross = SignalInputs::DualCross {
            short: ready(7.0, 5.0),
            long: first_ready(6.0),
        };
        assert!(cross.is_warming_up());
        assert_eq!(cross.evaluate(false), Signal::Hold);
    }

    #[test]
    fn evaluation_is_repeatable_on_identical_inputs() {
        let inputs = SignalInputs::DualCross {
            short: ready(7.0, 5.0),
            long: ready(6.0, 6.0),
        };
        assert_eq!(inputs.evaluate(false), inputs.evaluate(false));
        // once the position is open the same inputs no longer signal
        assert_eq!(inputs.evaluate(true), Signal::Hold);
    }
}

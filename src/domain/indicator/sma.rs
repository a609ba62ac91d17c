//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: the first (n-1) bars are not ready. A partial window is never
//! averaged.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use super::{IndicatorReading, IndicatorState};

/// Trailing buffer of at most `period` closes.
#[derive(Debug, Clone)]
pub struct SmaWindow {
    period: usize,
    closes: VecDeque<f64>,
    last: Option<IndicatorState>,
}

impl SmaWindow {
    pub fn new(period: NonZeroUsize) -> Self {
        SmaWindow {
            period: period.get(),
            closes: VecDeque::with_capacity(period.get()),
            last: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Push one close and return the reading for this bar.
    pub fn update(&mut self, close: f64) -> IndicatorReading {
        self.closes.push_back(close);
        if self.closes.len() > self.period {
            self.closes.pop_front();
        }

        if self.closes.len() < self.period {
            return IndicatorReading::NotReady {
                observed: self.closes.len(),
                required: self.period,
            };
        }

        let current = self.closes.iter().sum::<f64>() / self.period as f64;
        let state = IndicatorState {
            current,
            previous: self.last.map(|s| s.current),
        };
        self.last = Some(state);
        IndicatorReading::Ready(state)
    }

    /// Reading as of the last update, without consuming a bar.
    pub fn reading(&self) -> IndicatorReading {
        match self.last {
            Some(state) => IndicatorReading::Ready(state),
            None => IndicatorReading::NotReady {
                observed: self.closes.len(),
                required: self.period,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window(n: usize) -> SmaWindow {
        SmaWindow::new(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn sma_warmup_is_not_ready() {
        let mut sma = window(3);
        assert_eq!(
            sma.update(10.0),
            IndicatorReading::NotReady {
                observed: 1,
                required: 3
            }
        );
        assert_eq!(
            sma.update(20.0),
            IndicatorReading::NotReady {
                observed: 2,
                required: 3
            }
        );
        assert!(sma.update(30.0).is_ready());
    }

    #[test]
    fn sma_never_averages_partial_window() {
        let mut sma = window(5);
        for close in [0.0, 0.0, 0.0, 0.0] {
            assert_eq!(sma.update(close).state(), None);
        }
    }

    #[test]
    fn sma_first_ready_bar_has_no_previous() {
        let mut sma = window(2);
        sma.update(10.0);
        let state = sma.update(11.0).state().unwrap();
        assert_relative_eq!(state.current, 10.5);
        assert_eq!(state.previous, None);
    }

    #[test]
    fn sma_previous_tracks_prior_current() {
        let mut sma = window(2);
        let closes = [10.0, 11.0, 12.0, 15.0];
        let mut last_current = None;
        for &close in &closes {
            if let Some(state) = sma.update(close).state() {
                assert_eq!(state.previous, last_current);
                last_current = Some(state.current);
            }
        }
        assert_relative_eq!(last_current.unwrap(), 13.5);
    }

    #[test]
    fn sma_rolls_oldest_close_out() {
        let mut sma = window(3);
        sma.update(1.0);
        sma.update(2.0);
        sma.update(3.0);
        let state = sma.update(10.0).state().unwrap();
        assert_relative_eq!(state.current, 5.0);
        assert_relative_eq!(state.previous.unwrap(), 2.0);
    }

    #[test]
    fn sma_period_one_tracks_close() {
        let mut sma = window(1);
        assert_relative_eq!(sma.update(42.0).state().unwrap().current, 42.0);
        let state = sma.update(43.0).state().unwrap();
        assert_relative_eq!(state.current, 43.0);
        assert_eq!(state.previous, Some(42.0));
    }

    #[test]
    fn independent_windows_keep_own_buffers() {
        let mut short = window(2);
        let mut long = window(4);
        for close in [1.0, 2.0, 3.0, 4.0] {
            short.update(close);
            long.update(close);
        }
        assert_eq!(short.period(), 2);
        assert_eq!(long.period(), 4);
        assert_relative_eq!(short.reading().state().unwrap().current, 3.5);
        assert_relative_eq!(long.reading().state().unwrap().current, 2.5);
    }
}

//! Technical indicators over price and volume columns
//!
//! Every function here is pure: it takes a column slice and returns an
//! `IndicatorSeries` of the same length, with `None` for indices still inside
//! the indicator's warm-up window.
//!
//! - RSI (simple-average gains/losses)
//! - SMA / EMA (EMA seeded with the SMA of its first window)
//! - MACD line, signal line and histogram
//! - Bollinger Bands (population standard deviation)
//! - Volume SMA and fractional change

use crate::domain::market::indicator_series::IndicatorSeries;
use ta::Next;
use ta::indicators::{BollingerBands, SimpleMovingAverage};

/// MACD output columns, all aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// Bollinger Bands output columns, all aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Calculate the Relative Strength Index
///
/// Average gain and average loss are simple means of the last `window`
/// close-to-close deltas, so the first defined value is at index `window`.
///
/// # Returns
/// * A series in [0, 100]; 100 whenever the average loss is exactly zero
pub fn rsi(closes: &[f64], window: usize) -> IndicatorSeries {
    let name = format!("rsi_{}", window);
    if window == 0 {
        return IndicatorSeries::undefined(name, closes.len());
    }

    let mut values = vec![None; closes.len()];
    for (i, value) in values.iter_mut().enumerate().skip(window) {
        let (gain_sum, loss_sum) = closes[i - window..=i]
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold((0.0, 0.0), |(gain, loss), delta| {
                if delta > 0.0 {
                    (gain + delta, loss)
                } else {
                    (gain, loss - delta)
                }
            });

        let avg_gain = gain_sum / window as f64;
        let avg_loss = loss_sum / window as f64;

        // Zero losses saturate instead of dividing by zero
        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        *value = Some(rsi.clamp(0.0, 100.0));
    }

    IndicatorSeries::new(name, values)
}

/// Simple moving average, defined from index `window - 1`.
pub fn sma(values: &[f64], window: usize) -> IndicatorSeries {
    IndicatorSeries::new(format!("sma_{}", window), sma_values(values, window))
}

/// Simple moving average of volume instead of close.
pub fn volume_sma(volumes: &[f64], window: usize) -> IndicatorSeries {
    IndicatorSeries::new(format!("volume_sma_{}", window), sma_values(volumes, window))
}

fn sma_values(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let Ok(mut indicator) = SimpleMovingAverage::new(window) else {
        return vec![None; values.len()];
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let avg = indicator.next(v);
            (i + 1 >= window).then_some(avg)
        })
        .collect()
}

/// Exponential moving average
///
/// The seed at index `window - 1` is the SMA of the first `window` values;
/// afterwards `ema = alpha * value + (1 - alpha) * prev` with
/// `alpha = 2 / (window + 1)`.
pub fn ema(values: &[f64], window: usize) -> IndicatorSeries {
    let input: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    IndicatorSeries::new(format!("ema_{}", window), ema_over(&input, window))
}

/// EMA over a column that may start undefined. Seeding begins at the first
/// defined entry; undefined entries after that are skipped.
fn ema_over(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let alpha = 2.0 / (window as f64 + 1.0);
    let mut seed_sum = 0.0;
    let mut seed_count = 0;
    let mut prev: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = *value else { continue };
        match prev {
            Some(p) => {
                let next = alpha * x + (1.0 - alpha) * p;
                prev = Some(next);
                out[i] = Some(next);
            }
            None => {
                seed_sum += x;
                seed_count += 1;
                if seed_count == window {
                    let seed = seed_sum / window as f64;
                    prev = Some(seed);
                    out[i] = Some(seed);
                }
            }
        }
    }

    out
}

/// Moving Average Convergence Divergence
///
/// Line = EMA(fast) - EMA(slow), defined from index `slow - 1`.
/// Signal = EMA(signal) of the line, defined from `slow + signal - 2`.
/// Histogram = line - signal.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let line: Vec<Option<f64>> = (0..closes.len())
        .map(|i| Some(fast_ema.get(i)? - slow_ema.get(i)?))
        .collect();
    let signal_line = ema_over(&line, signal);
    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(signal_line.iter())
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line: IndicatorSeries::new("macd", line),
        signal: IndicatorSeries::new("macd_signal", signal_line),
        histogram: IndicatorSeries::new("macd_hist", histogram),
    }
}

/// Bollinger Bands: SMA(window) plus/minus `k` population standard deviations.
pub fn bollinger_bands(closes: &[f64], window: usize, k: f64) -> BollingerSeries {
    let len = closes.len();
    let Ok(mut bands) = BollingerBands::new(window, k) else {
        return BollingerSeries {
            upper: IndicatorSeries::undefined("bb_upper", len),
            middle: IndicatorSeries::undefined("bb_middle", len),
            lower: IndicatorSeries::undefined("bb_lower", len),
        };
    };

    let mut upper = vec![None; len];
    let mut middle = vec![None; len];
    let mut lower = vec![None; len];
    for (i, &close) in closes.iter().enumerate() {
        let out = bands.next(close);
        if i + 1 >= window {
            upper[i] = Some(out.upper);
            middle[i] = Some(out.average);
            lower[i] = Some(out.lower);
        }
    }

    BollingerSeries {
        upper: IndicatorSeries::new("bb_upper", upper),
        middle: IndicatorSeries::new("bb_middle", middle),
        lower: IndicatorSeries::new("bb_lower", lower),
    }
}

/// Fractional change `values[i] / values[i-1] - 1`.
///
/// Undefined at index 0 and wherever the previous value is zero.
pub fn pct_change(name: &str, values: &[f64]) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        let prev = values[i - 1];
        if prev != 0.0 {
            out[i] = Some(values[i] / prev - 1.0);
        }
    }
    IndicatorSeries::new(name, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::statistics::Statistics;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + (i % 3) as f64)
            .collect()
    }

    #[test]
    fn test_warmup_short_series_is_undefined() {
        let closes = rising(10);

        assert!(rsi(&closes, 14).values().iter().all(Option::is_none));
        assert!(sma(&closes, 20).values().iter().all(Option::is_none));
        assert!(ema(&closes, 20).values().iter().all(Option::is_none));
        assert!(volume_sma(&closes, 11).values().iter().all(Option::is_none));
        let bb = bollinger_bands(&closes, 20, 2.0);
        assert!(bb.upper.values().iter().all(Option::is_none));
        let m = macd(&closes, 12, 26, 9);
        assert!(m.line.values().iter().all(Option::is_none));
    }

    #[test]
    fn test_outputs_are_index_aligned() {
        let closes = zigzag(80);
        assert_eq!(rsi(&closes, 14).len(), 80);
        assert_eq!(sma(&closes, 20).len(), 80);
        assert_eq!(ema(&closes, 20).len(), 80);
        let m = macd(&closes, 12, 26, 9);
        assert_eq!(m.signal.len(), 80);
        assert_eq!(bollinger_bands(&closes, 20, 2.0).lower.len(), 80);
    }

    #[test]
    fn test_rsi_first_defined_index() {
        let series = rsi(&zigzag(40), 14);
        assert_eq!(series.first_defined(), Some(14));
    }

    #[test]
    fn test_rsi_bounds() {
        let closes = zigzag(200);
        for value in rsi(&closes, 14).values().iter().flatten() {
            assert!((0.0..=100.0).contains(value), "RSI out of range: {}", value);
        }
    }

    #[test]
    fn test_rsi_saturates_without_losses() {
        let series = rsi(&rising(30), 14);
        for value in series.values().iter().flatten() {
            assert_eq!(*value, 100.0);
        }
    }

    #[test]
    fn test_rsi_zero_without_gains() {
        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let series = rsi(&falling, 14);
        assert_eq!(series.get(20), Some(0.0));
    }

    #[test]
    fn test_rsi_known_value() {
        // 2 gains of 2.0, 2 losses of 1.0 -> avg gain 1.0, avg loss 0.5, RS = 2
        let closes = vec![10.0, 12.0, 11.0, 13.0, 12.0];
        let series = rsi(&closes, 4);
        let expected = 100.0 - 100.0 / 3.0;
        assert!((series.get(4).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sma_matches_mean() {
        let closes = zigzag(30);
        let series = sma(&closes, 20);
        assert_eq!(series.first_defined(), Some(19));

        let expected = closes[5..25].iter().sum::<f64>() / 20.0;
        assert!((series.get(24).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ema_seed_equals_sma() {
        let closes = zigzag(40);
        let e = ema(&closes, 10);
        let s = sma(&closes, 10);

        assert_eq!(e.first_defined(), Some(9));
        assert!((e.get(9).unwrap() - s.get(9).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_ema_recurrence() {
        let closes = zigzag(40);
        let e = ema(&closes, 10);
        let alpha = 2.0 / 11.0;
        let expected = alpha * closes[10] + (1.0 - alpha) * e.get(9).unwrap();
        assert!((e.get(10).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let closes = vec![50.0; 30];
        let e = ema(&closes, 5);
        for value in e.values().iter().flatten() {
            assert!((value - 50.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_macd_warmup_and_histogram() {
        let closes = zigzag(100);
        let m = macd(&closes, 12, 26, 9);

        assert_eq!(m.line.first_defined(), Some(25));
        assert_eq!(m.signal.first_defined(), Some(33));
        assert_eq!(m.histogram.first_defined(), Some(33));

        let i = 60;
        let expected = m.line.get(i).unwrap() - m.signal.get(i).unwrap();
        assert!((m.histogram.get(i).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_macd_line_is_ema_difference() {
        let closes = zigzag(60);
        let m = macd(&closes, 12, 26, 9);
        let fast = ema(&closes, 12);
        let slow = ema(&closes, 26);
        let expected = fast.get(40).unwrap() - slow.get(40).unwrap();
        assert!((m.line.get(40).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_population_std() {
        let closes = zigzag(50);
        let bb = bollinger_bands(&closes, 20, 2.0);
        assert_eq!(bb.middle.first_defined(), Some(19));

        let window = &closes[20..40];
        let std = window.population_std_dev();
        let mean = window.mean();

        let i = 39;
        assert!((bb.middle.get(i).unwrap() - mean).abs() < 1e-6);
        assert!((bb.upper.get(i).unwrap() - (mean + 2.0 * std)).abs() < 1e-6);
        assert!((bb.lower.get(i).unwrap() - (mean - 2.0 * std)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_window_is_undefined() {
        let closes = zigzag(10);
        assert!(sma(&closes, 0).values().iter().all(Option::is_none));
        assert!(ema(&closes, 0).values().iter().all(Option::is_none));
        assert!(rsi(&closes, 0).values().iter().all(Option::is_none));
        assert!(
            bollinger_bands(&closes, 0, 2.0)
                .middle
                .values()
                .iter()
                .all(Option::is_none)
        );
    }

    #[test]
    fn test_pct_change_skips_zero_base() {
        let series = pct_change("volume_change", &[0.0, 10.0, 15.0]);
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), None);
        assert!((series.get(2).unwrap() - 0.5).abs() < 1e-12);
    }
}

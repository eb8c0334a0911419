//! Append-only storage for an instrument's OHLCV history.
//!
//! Every indicator, feature and signal is index-aligned with the buffer that
//! produced it, so the buffer never reorders or drops observations.

use super::observation::Observation;
use crate::domain::errors::SeriesError;

#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    observations: Vec<Observation>,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            observations: Vec::with_capacity(capacity),
        }
    }

    /// Builds a buffer by appending each observation in turn.
    ///
    /// Fails on the first observation whose timestamp is not strictly greater
    /// than its predecessor's.
    pub fn from_observations<I>(observations: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = Observation>,
    {
        let iter = observations.into_iter();
        let mut buffer = Self::with_capacity(iter.size_hint().0);
        for obs in iter {
            buffer.append(obs)?;
        }
        Ok(buffer)
    }

    /// Appends an observation. Timestamps must be strictly increasing.
    pub fn append(&mut self, observation: Observation) -> Result<(), SeriesError> {
        if let Some(last) = self.observations.last()
            && observation.timestamp <= last.timestamp
        {
            return Err(SeriesError::OutOfOrder {
                timestamp: observation.timestamp,
                last: last.timestamp,
            });
        }
        self.observations.push(observation);
        Ok(())
    }

    /// Returns the `size` most recent observations ending at `end_index` (inclusive).
    pub fn window(&self, end_index: usize, size: usize) -> Result<&[Observation], SeriesError> {
        let available = if end_index < self.observations.len() {
            end_index + 1
        } else {
            self.observations.len()
        };

        if end_index >= self.observations.len() || size > available {
            return Err(SeriesError::InsufficientHistory {
                end_index,
                requested: size,
                available,
            });
        }

        let start = end_index + 1 - size;
        Ok(&self.observations[start..=end_index])
    }

    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.volume).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ts: i64, close: f64) -> Observation {
        Observation::new(ts, close, close + 1.0, close - 1.0, close, 1000.0)
    }

    fn buffer_of(n: usize) -> SeriesBuffer {
        SeriesBuffer::from_observations((0..n).map(|i| obs(i as i64 * 60_000, 100.0 + i as f64)))
            .unwrap()
    }

    #[test]
    fn test_append_rejects_duplicate_timestamp() {
        let mut buffer = SeriesBuffer::new();
        buffer.append(obs(1000, 100.0)).unwrap();

        let err = buffer.append(obs(1000, 101.0)).unwrap_err();
        assert_eq!(
            err,
            SeriesError::OutOfOrder {
                timestamp: 1000,
                last: 1000
            }
        );
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_append_rejects_older_timestamp() {
        let mut buffer = SeriesBuffer::new();
        buffer.append(obs(2000, 100.0)).unwrap();

        assert!(matches!(
            buffer.append(obs(1000, 99.0)),
            Err(SeriesError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_from_observations_stops_on_disorder() {
        let result = SeriesBuffer::from_observations(vec![obs(1, 1.0), obs(3, 1.0), obs(2, 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_window_returns_trailing_slice() {
        let buffer = buffer_of(10);

        let window = buffer.window(5, 3).unwrap();
        let closes: Vec<f64> = window.iter().map(|o| o.close).collect();
        assert_eq!(closes, vec![103.0, 104.0, 105.0]);
    }

    #[test]
    fn test_window_covering_whole_prefix() {
        let buffer = buffer_of(10);
        assert_eq!(buffer.window(4, 5).unwrap().len(), 5);
    }

    #[test]
    fn test_window_insufficient_history() {
        let buffer = buffer_of(10);

        let err = buffer.window(2, 4).unwrap_err();
        assert_eq!(
            err,
            SeriesError::InsufficientHistory {
                end_index: 2,
                requested: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_window_past_end_is_insufficient() {
        let buffer = buffer_of(3);
        assert!(matches!(
            buffer.window(3, 1),
            Err(SeriesError::InsufficientHistory { available: 3, .. })
        ));
    }

    #[test]
    fn test_column_accessors_are_aligned() {
        let buffer = buffer_of(4);
        assert_eq!(buffer.closes(), vec![100.0, 101.0, 102.0, 103.0]);
        assert_eq!(buffer.volumes().len(), buffer.len());
    }
}

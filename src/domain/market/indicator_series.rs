use serde::{Deserialize, Serialize};

/// A named derived series aligned 1:1 with its source buffer.
///
/// `None` marks an index the indicator cannot produce yet (warm-up) or at all
/// (e.g. a percentage change from a zero base).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    name: String,
    values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A series of `len` undefined entries.
    pub fn undefined(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, vec![None; len])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value at `index`, `None` if undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn is_defined(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Index of the first defined value, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_out_of_range_is_undefined() {
        let series = IndicatorSeries::new("x", vec![None, Some(1.0)]);
        assert_eq!(series.get(1), Some(1.0));
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(5), None);
        assert_eq!(series.first_defined(), Some(1));
    }
}

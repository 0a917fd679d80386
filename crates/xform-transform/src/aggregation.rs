//! Aggregation functions used by the point-wise reducers

/// Supported aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Count of values
    Count,
    /// Sum of values
    Sum,
    /// Mean (average) of values
    Mean,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

/// Streaming aggregator for one group of values
#[derive(Debug, Clone)]
pub struct Aggregator {
    function: AggregateFunction,
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Aggregator {
    /// Create a new aggregator
    pub fn new(function: AggregateFunction) -> Self {
        Self {
            function,
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add a value to the aggregation; NaN is ignored
    pub fn add(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Compute the aggregate result
    pub fn result(&self) -> Option<f64> {
        if self.count == 0 {
            return match self.function {
                AggregateFunction::Count => Some(0.0),
                _ => None,
            };
        }

        match self.function {
            AggregateFunction::Count => Some(self.count as f64),
            AggregateFunction::Sum => Some(self.sum),
            AggregateFunction::Mean => Some(self.sum / self.count as f64),
            AggregateFunction::Min => Some(self.min),
            AggregateFunction::Max => Some(self.max),
        }
    }
}

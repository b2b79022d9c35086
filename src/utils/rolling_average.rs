use std::collections::VecDeque;

#[derive(Debug, Clone)]
/// The average of the most recent values pushed into it, older values fall out of the window.
pub struct RollingAverage {
    window: usize,
    values: VecDeque<f64>,
}

impl RollingAverage {
    /// # Panics
    ///
    /// Panics if the window is empty.
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "a rolling average needs a window of at least one value");

        RollingAverage {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// None until something is pushed.
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }

        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn reset(&mut self) {
        self.values.clear();
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
    use super::RollingAverage;

    #[test]
    fn should_only_average_the_most_recent_values() {
        let mut average = RollingAverage::new(3);
        assert_eq!(average.average(), None);

        for value in [10.0, 1.0, 2.0, 3.0] {
            average.push(value);
        }

        assert_eq!(average.len(), 3);
        assert_eq!(average.average(), Some(2.0));
    }

    #[test]
    fn should_forget_everything_when_reset() {
        let mut average = RollingAverage::new(2);
        average.push(4.0);
        average.reset();

        assert!(average.is_empty());
        assert_eq!(average.average(), None);
    }
}

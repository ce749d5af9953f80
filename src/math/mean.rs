/// Running arithmetic mean, `NaN` when nothing was pushed.
#[derive(Default, Copy, Clone)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Root mean square of pushed residuals.
#[derive(Default, Copy, Clone)]
pub struct RootMeanSquare {
    sum: f64,
    count: usize,
}

impl RootMeanSquare {
    #[inline]
    pub fn push(&mut self, residual: f64) {
        self.sum += residual * residual;
        self.count += 1;
    }

    #[must_use]
    pub fn finalise(&self) -> f64 {
        (self.sum / self.count as f64).sqrt()
    }
}

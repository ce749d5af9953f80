use std::slice::Iter;

/// Single training example.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<U, I> {
    pub user_id: U,
    pub item_id: I,
    pub value: f32,
}

/// Ordered, append-only collection of observations.
#[derive(Debug, Clone)]
pub struct Dataset<U, I> {
    observations: Vec<Observation<U, I>>,
}

impl<U, I> Default for Dataset<U, I> {
    fn default() -> Self {
        Self {
            observations: Vec::new(),
        }
    }
}

impl<U, I> Dataset<U, I> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            observations: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, user_id: U, item_id: I, value: f32) {
        self.observations.push(Observation {
            user_id,
            item_id,
            value,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Observation<U, I>> {
        self.observations.iter()
    }
}

impl<'a, U, I> IntoIterator for &'a Dataset<U, I> {
    type Item = &'a Observation<U, I>;
    type IntoIter = Iter<'a, Observation<U, I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<U, I> Extend<(U, I, f32)> for Dataset<U, I> {
    fn extend<T: IntoIterator<Item = (U, I, f32)>>(&mut self, iter: T) {
        for (user_id, item_id, value) in iter {
            self.push(user_id, item_id, value);
        }
    }
}

impl<U, I> FromIterator<(U, I, f32)> for Dataset<U, I> {
    fn from_iter<T: IntoIterator<Item = (U, I, f32)>>(iter: T) -> Self {
        let mut dataset = Self::new();
        dataset.extend(iter);
        dataset
    }
}

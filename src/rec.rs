use serde::Serialize;

/// Recommended identifier with its score.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Rec<T> {
    pub id: T,
    pub score: f32,
}

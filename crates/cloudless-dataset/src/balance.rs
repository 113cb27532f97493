use cloudless_core::TrainingExample;

/// Hook for rebalancing the classes of the training set.
pub trait ClassBalancer {
    /// Whether this balancer changes anything; reported in the statistics.
    fn is_active(&self) -> bool;

    fn balance(&self, train: Vec<TrainingExample>) -> Vec<TrainingExample>;
}

/// Leaves the training set as it is.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbalanced;

impl ClassBalancer for Unbalanced {
    fn is_active(&self) -> bool {
        false
    }

    fn balance(&self, train: Vec<TrainingExample>) -> Vec<TrainingExample> {
        train
    }
}

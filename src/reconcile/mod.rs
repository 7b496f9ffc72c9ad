mod engine;

pub use engine::{
    derived_price, oracle_ratio, reconcile, redenominate, redenominate_back, total_value,
    ReconcileInputs,
};

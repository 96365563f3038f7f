// ============================================================================
// spark-observe - Observable Collections
// ============================================================================
//
// The membership-change contract the observer consumes, plus ObservableVec,
// a ready-made list that honors it.
// ============================================================================

mod change;
mod vec;

pub use change::{ChangeKind, CollectionChange, ObservableCollection};
pub use vec::ObservableVec;

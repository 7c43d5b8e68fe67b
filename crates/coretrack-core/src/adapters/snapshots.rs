use std::collections::HashMap;

use crate::data_source::{FinancialSnapshot, SnapshotProvider};
use crate::StockCode;

/// Snapshot provider backed by figures handed over once per run by the
/// external quote/fundamentals engine. Lookup only; this type never fetches.
#[derive(Debug, Default, Clone)]
pub struct StaticSnapshots {
    snapshots: HashMap<StockCode, FinancialSnapshot>,
}

impl StaticSnapshots {
    pub fn new(snapshots: Vec<FinancialSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|snapshot| (snapshot.code.clone(), snapshot))
                .collect(),
        }
    }
}

impl SnapshotProvider for StaticSnapshots {
    fn snapshot(&self, code: &StockCode) -> Option<FinancialSnapshot> {
        self.snapshots.get(code).cloned()
    }
}

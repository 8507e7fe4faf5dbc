//! The resource view a sizing run clamps against (spec.md §4.7). Distinct
//! from `bx_metrics::ResourceProbe`, which reports *active* usage during a
//! run — this is a point-in-time *capacity* reading taken before one starts.

#[derive(Debug, Clone, Copy)]
pub struct ResourceSnapshot {
    pub available_db_connections: u32,
}

impl ResourceSnapshot {
    pub fn new(available_db_connections: u32) -> Self {
        Self {
            available_db_connections,
        }
    }
}

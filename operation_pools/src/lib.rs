pub use crate::{
    attestation_agg_pool::Pool as AttestationAggPool,
    sync_committee_agg_pool::Pool as SyncCommitteeAggPool,
};

mod attestation_agg_pool {
    pub use pool::Pool;

    mod pool;
    mod types;
}

mod sync_committee_agg_pool {
    pub use pool::Pool;

    mod pool;
    mod types;
}

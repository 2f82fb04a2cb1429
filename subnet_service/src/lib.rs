pub use crate::{
    misc::{BeaconCommitteeSubscription, SyncCommitteeSubscription},
    subnet_tracker::{PersistentSubnets, SubnetTracker},
    subscriptions::{
        process_beacon_committee_subscriptions, process_sync_committee_subscriptions, Error,
    },
};

mod misc;
mod subnet_tracker;
mod subscriptions;

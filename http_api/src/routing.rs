use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware::map_request_with_state,
    routing::{get, post},
    Router,
};
use block_producer::BlockProducer;
use chain::Controller;
use duties::DutyResolver;
use liveness_tracker::LivenessTracker;
use operation_pools::{AttestationAggPool, SyncCommitteeAggPool};
use subnet_service::SubnetTracker;
use types::config::Config as ChainConfig;

use crate::{
    middleware,
    misc::{Broadcaster, SyncedStatus},
    standard::{
        node_syncing_status, validator_aggregate_attestation, validator_attestation_data,
        validator_attester_duties, validator_blinded_block, validator_block, validator_liveness,
        validator_prepare_beacon_proposer, validator_proposer_duties,
        validator_publish_aggregate_and_proofs, validator_publish_contributions_and_proofs,
        validator_register_validator, validator_subscribe_to_beacon_committee,
        validator_subscribe_to_sync_committees, validator_sync_committee_contribution,
        validator_sync_committee_duties,
    },
};

#[derive(Clone)]
pub struct RouterState {
    pub chain_config: Arc<ChainConfig>,
    pub controller: Arc<dyn Controller>,
    pub duty_resolver: Arc<DutyResolver>,
    pub block_producer: Arc<BlockProducer>,
    pub attestation_agg_pool: Arc<AttestationAggPool>,
    pub sync_committee_agg_pool: Arc<SyncCommitteeAggPool>,
    pub subnet_tracker: Arc<SubnetTracker>,
    pub liveness_tracker: Arc<LivenessTracker>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub is_synced: Arc<SyncedStatus>,
}

// The `FromRef` derive macro produces worse error messages than these impls
// when a field type does not match.

impl FromRef<RouterState> for Arc<ChainConfig> {
    fn from_ref(state: &RouterState) -> Self {
        state.chain_config.clone()
    }
}

impl FromRef<RouterState> for Arc<dyn Controller> {
    fn from_ref(state: &RouterState) -> Self {
        state.controller.clone()
    }
}

impl FromRef<RouterState> for Arc<DutyResolver> {
    fn from_ref(state: &RouterState) -> Self {
        state.duty_resolver.clone()
    }
}

impl FromRef<RouterState> for Arc<BlockProducer> {
    fn from_ref(state: &RouterState) -> Self {
        state.block_producer.clone()
    }
}

impl FromRef<RouterState> for Arc<AttestationAggPool> {
    fn from_ref(state: &RouterState) -> Self {
        state.attestation_agg_pool.clone()
    }
}

impl FromRef<RouterState> for Arc<SyncCommitteeAggPool> {
    fn from_ref(state: &RouterState) -> Self {
        state.sync_committee_agg_pool.clone()
    }
}

impl FromRef<RouterState> for Arc<SubnetTracker> {
    fn from_ref(state: &RouterState) -> Self {
        state.subnet_tracker.clone()
    }
}

impl FromRef<RouterState> for Arc<LivenessTracker> {
    fn from_ref(state: &RouterState) -> Self {
        state.liveness_tracker.clone()
    }
}

impl FromRef<RouterState> for Arc<dyn Broadcaster> {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}

impl FromRef<RouterState> for Arc<SyncedStatus> {
    fn from_ref(state: &RouterState) -> Self {
        state.is_synced.clone()
    }
}

#[must_use]
pub fn routes(state: RouterState) -> Router {
    // Duty and block production endpoints are useless while the node is
    // syncing; the rest keep answering so validator clients can monitor the
    // node and drain their queues.
    let gated_routes = Router::new()
        .route(
            "/eth/v1/validator/duties/attester/{epoch}",
            post(validator_attester_duties),
        )
        .route(
            "/eth/v1/validator/duties/proposer/{epoch}",
            get(validator_proposer_duties),
        )
        .route(
            "/eth/v1/validator/duties/sync/{epoch}",
            post(validator_sync_committee_duties),
        )
        .route("/eth/v2/validator/blocks/{slot}", get(validator_block))
        .route(
            "/eth/v1/validator/blinded_blocks/{slot}",
            get(validator_blinded_block),
        )
        .route(
            "/eth/v1/validator/attestation_data",
            get(validator_attestation_data),
        )
        .route_layer(map_request_with_state(state.clone(), middleware::is_synced));

    let open_routes = Router::new()
        .route("/eth/v1/node/syncing", get(node_syncing_status))
        .route(
            "/eth/v1/validator/aggregate_attestation",
            get(validator_aggregate_attestation),
        )
        .route(
            "/eth/v1/validator/aggregate_and_proofs",
            post(validator_publish_aggregate_and_proofs),
        )
        .route(
            "/eth/v1/validator/beacon_committee_subscriptions",
            post(validator_subscribe_to_beacon_committee),
        )
        .route(
            "/eth/v1/validator/sync_committee_subscriptions",
            post(validator_subscribe_to_sync_committees),
        )
        .route(
            "/eth/v1/validator/sync_committee_contribution",
            get(validator_sync_committee_contribution),
        )
        .route(
            "/eth/v1/validator/contribution_and_proofs",
            post(validator_publish_contributions_and_proofs),
        )
        .route(
            "/eth/v1/validator/prepare_beacon_proposer",
            post(validator_prepare_beacon_proposer),
        )
        .route(
            "/eth/v1/validator/register_validator",
            post(validator_register_validator),
        )
        .route(
            "/eth/v1/validator/liveness/{epoch}",
            post(validator_liveness),
        );

    gated_routes.merge(open_routes).with_state(state)
}

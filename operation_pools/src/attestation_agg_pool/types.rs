use std::{collections::BTreeMap, sync::Arc};

use bls::AggregateSignature;
use ssz_types::BitList;
use types::{
    phase0::{
        containers::{Attestation, AttestationData},
        primitives::H256,
    },
    preset::MaxValidatorsPerCommittee,
};

// Inner maps are keyed by attestation data root and ordered so that scans
// within one call are deterministic.
pub type AggregateMap = BTreeMap<H256, AggregateEntry>;
pub type SingularAttestationMap = BTreeMap<H256, SingularAttestationEntry>;

#[derive(Clone)]
pub struct Aggregate {
    pub aggregation_bits: BitList<MaxValidatorsPerCommittee>,
    pub signature: AggregateSignature,
}

#[derive(Clone)]
pub struct AggregateEntry {
    pub data: AttestationData,
    pub aggregates: Vec<Aggregate>,
}

#[derive(Clone)]
pub struct SingularAttestationEntry {
    pub data: AttestationData,
    pub attestations: Vec<Arc<Attestation>>,
}

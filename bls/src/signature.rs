use blst::min_pk::{AggregateSignature as RawAggregateSignature, Signature as RawSignature};
use derive_more::From;

use crate::{error::Error, signature_bytes::SignatureBytes};

#[derive(Clone, Copy, PartialEq, Eq, Debug, From)]
pub struct Signature(RawSignature);

impl Default for Signature {
    fn default() -> Self {
        SignatureBytes::empty()
            .try_into()
            .expect("compressed signature constructed in SignatureBytes::empty is valid")
    }
}

impl TryFrom<SignatureBytes> for Signature {
    type Error = Error;

    fn try_from(bytes: SignatureBytes) -> Result<Self, Self::Error> {
        RawSignature::uncompress(bytes.as_bytes())
            .map(Self)
            .map_err(|_| Error::InvalidSignature)
    }
}

impl From<Signature> for SignatureBytes {
    fn from(signature: Signature) -> Self {
        Self(signature.0.compress())
    }
}

impl Signature {
    /// Adds `other` to the aggregate. Aggregation starts from
    /// [`Signature::default`], the point at infinity.
    pub fn aggregate_in_place(&mut self, other: Self) {
        let mut self_aggregate = RawAggregateSignature::from_signature(self.as_raw());
        let other_aggregate = RawAggregateSignature::from_signature(other.as_raw());
        self_aggregate.add_aggregate(&other_aggregate);
        self.0 = self_aggregate.to_signature();
    }

    #[must_use]
    pub const fn as_raw(&self) -> &RawSignature {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_signature_round_trips_through_bytes() {
        let bytes = SignatureBytes::from(Signature::default());
        assert_eq!(bytes, SignatureBytes::empty());
    }

    #[test]
    fn aggregating_into_infinity_is_identity() {
        let mut aggregate = Signature::default();
        let other = Signature::default();
        aggregate.aggregate_in_place(other);

        assert_eq!(SignatureBytes::from(aggregate), SignatureBytes::empty());
    }

    #[test]
    fn zero_bytes_are_not_a_valid_signature() {
        let result = Signature::try_from(SignatureBytes::default());
        assert_eq!(result, Err(Error::InvalidSignature));
    }
}

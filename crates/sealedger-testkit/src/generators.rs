//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealedger_core::{Container, Digest, Keypair, Record, SealPolicy};

use crate::fixtures::DerivedKeys;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate an identity usable as a key file name.
pub fn identity() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_-]{0,15}".prop_map(String::from)
}

/// Generate a payload of arbitrary text, including quotes, newlines, and
/// non-ASCII characters.
pub fn payload() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,5} (pizzas|pieces|bitcoins)",
        any::<String>(),
        Just(String::new()),
    ]
}

/// Generate a container policy cheap enough to seal in a test.
pub fn seal_policy() -> impl Strategy<Value = SealPolicy> {
    (1usize..=6, 0usize..=1)
        .prop_map(|(capacity, difficulty)| SealPolicy::new(capacity, difficulty).expect("policy"))
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub namespace: String,
    pub sender: String,
    pub receiver: String,
    pub payload: String,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        ("[a-z]{1,8}", identity(), identity(), payload())
            .prop_map(|(namespace, sender, receiver, payload)| RecordParams {
                namespace,
                sender,
                receiver,
                payload,
            })
            .boxed()
    }
}

impl RecordParams {
    /// The keys this record is signed with.
    pub fn keys(&self) -> DerivedKeys {
        DerivedKeys::new(self.namespace.clone())
    }
}

/// Generate a signed record from parameters.
pub fn record_from_params(params: &RecordParams) -> Record {
    Record::create(
        &params.keys(),
        params.sender.clone(),
        params.receiver.clone(),
        params.payload.clone(),
    )
    .expect("derived keys never fail")
}

/// Build a container from records, sealing it if they fill it.
pub fn container_from_params(policy: SealPolicy, params: &[RecordParams]) -> Container {
    let mut container = Container::new(policy);
    for p in params.iter().take(policy.capacity()) {
        container
            .append(record_from_params(p))
            .expect("within capacity");
    }
    container
}

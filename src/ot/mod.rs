//! Oblivious transfer traits + the extension protocol stack.
//!
//! This module provides the base-OT traits the extension bootstraps from,
//! alongside the protocol layers:
//!
//! * [`chou_orlandi`]: Chou-Orlandi base OT over the Ristretto group.
//! * [`cointoss`]: commit-then-reveal coin tossing for agreed challenges.
//! * [`cote`]: correlated OT extension with errors (the IKNP-style
//!   expansion sharing a single offset Δ).
//! * [`rote`]: random OT extension with the batched consistency check that
//!   detects a cheating party.
//! * [`chosen`]: chosen-message OT, masking caller messages with batched
//!   random OT outputs.

pub mod chosen;
pub mod chou_orlandi;
pub mod cointoss;
pub mod cote;
pub mod rote;

use curve25519_dalek::RistrettoPoint;
use rand::{CryptoRng, Rng};
use thiserror::Error;

use crate::{
    bitvec::{BitVector, BitVectorError},
    channel::{self, Channel},
    params::SetupError,
    transpose::InvalidShape,
};

/// Instantiation of the Chou-Orlandi base-OT sender.
pub type ChouOrlandiSender = chou_orlandi::Sender;
/// Instantiation of the Chou-Orlandi base-OT receiver.
pub type ChouOrlandiReceiver = chou_orlandi::Receiver;
/// Correlated-OT-extension sender, bootstrapped from Chou-Orlandi.
pub type CoteSender = cote::Sender<ChouOrlandiReceiver>;
/// Correlated-OT-extension receiver, bootstrapped from Chou-Orlandi.
pub type CoteReceiver = cote::Receiver<ChouOrlandiSender>;
/// Random-OT-extension sender, bootstrapped from Chou-Orlandi.
pub type RotSender = rote::Sender<ChouOrlandiReceiver>;
/// Random-OT-extension receiver, bootstrapped from Chou-Orlandi.
pub type RotReceiver = rote::Receiver<ChouOrlandiSender>;
/// Chosen-message OT sender, bootstrapped from Chou-Orlandi.
pub type OtSender = chosen::Sender<ChouOrlandiReceiver>;
/// Chosen-message OT receiver, bootstrapped from Chou-Orlandi.
pub type OtReceiver = chosen::Receiver<ChouOrlandiSender>;

/// An error occurring during an OT protocol.
///
/// The taxonomy is explicit so that callers cannot accidentally treat a
/// security-relevant failure like a benign one: [`Error::Malicious`] means
/// the peer cheated and the session must be aborted; the other variants are
/// local configuration errors, API misuse or transport failures.
#[derive(Debug, Error)]
pub enum Error {
    /// A message could not be sent or received.
    #[error(transparent)]
    Channel(#[from] channel::Error),
    /// The session was configured with unsupported security parameters.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// The API was misused; a programmer error, never retried.
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// The peer deviated from the protocol. Unconditionally fatal to the
    /// session: no partial result is returned and no retry is attempted.
    #[error("malicious behavior detected: {0}")]
    Malicious(#[from] MaliciousError),
}

impl Error {
    /// Whether this error signals peer misbehavior (abort and blame).
    pub fn is_malicious(&self) -> bool {
        matches!(self, Error::Malicious(_))
    }
}

impl From<BitVectorError> for Error {
    fn from(e: BitVectorError) -> Self {
        Self::Usage(UsageError::BitVector(e))
    }
}

impl From<InvalidShape> for Error {
    fn from(e: InvalidShape) -> Self {
        Self::Usage(UsageError::MatrixShape(e))
    }
}

/// Programmer errors in the use of the OT API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    /// An operation was called before the one-shot base-OT bootstrap.
    #[error("the session has not been initialized")]
    NotInitialized,
    /// The one-shot base-OT bootstrap was run twice.
    #[error("the session is already initialized")]
    AlreadyInitialized,
    /// An extension size that is zero or not a multiple of 8.
    #[error("extension size {size} must be a positive multiple of 8")]
    InvalidSize {
        /// The rejected size in bits.
        size: usize,
    },
    /// The two messages of a chosen-message transfer differ in length.
    #[error("message lengths differ: {len0} vs {len1} bytes")]
    LengthMismatch {
        /// Length of the zero-message in bytes.
        len0: usize,
        /// Length of the one-message in bytes.
        len1: usize,
    },
    /// A bit-vector operation was called with mismatched dimensions.
    #[error(transparent)]
    BitVector(#[from] BitVectorError),
    /// A matrix with an unsupported shape was transposed.
    #[error(transparent)]
    MatrixShape(#[from] InvalidShape),
}

/// Detected peer misbehavior.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaliciousError {
    /// The algebraic consistency check over the extended rows failed.
    #[error("the correlation consistency check failed")]
    ConsistencyCheckFailed,
    /// The two adjustment ciphertexts of a chosen-message transfer differ in
    /// length.
    #[error("adjustment message lengths differ: {len0} vs {len1} bytes")]
    AdjustmentLengthMismatch {
        /// Length of the first ciphertext in bytes.
        len0: usize,
        /// Length of the second ciphertext in bytes.
        len1: usize,
    },
    /// A received group element is not a valid Ristretto point.
    #[error("received an invalid curve point")]
    InvalidPoint,
    /// A coin-tossing commitment could not be opened with the revealed seed.
    #[error("a commitment could not be opened")]
    CommitmentMismatch,
    /// A message with an unexpected shape was received.
    #[error("malformed message during {phase}")]
    MalformedMessage {
        /// The protocol phase of the offending message.
        phase: &'static str,
    },
}

/// Hashes an elliptic-curve point down to `n` pseudorandom bytes, tweaked by
/// an instance counter so that repeated points yield unrelated keys.
pub(crate) fn hash_point(tweak: u128, pt: &RistrettoPoint, n: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new_keyed(pt.compress().as_bytes());
    hasher.update(&tweak.to_le_bytes());
    let mut out = vec![0; n];
    hasher.finalize_xof().fill(&mut out);
    out
}

/// Trait for one-out-of-two base oblivious transfer from the sender's
/// point-of-view.
///
/// The extension layers consume exactly κ such transfers per session, with
/// κ-bit messages, to bootstrap their seeds.
pub trait BaseOtSender
where
    Self: Sized,
{
    /// Runs any one-time initialization to create the oblivious transfer
    /// object.
    async fn init<C: Channel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<Self, Error>;

    /// Sends one message pair per input; both messages of a pair must have
    /// equal bit length.
    async fn send<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        inputs: &[(BitVector, BitVector)],
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error>;
}

/// Trait for one-out-of-two base oblivious transfer from the receiver's
/// point-of-view.
pub trait BaseOtReceiver
where
    Self: Sized,
{
    /// Runs any one-time initialization to create the oblivious transfer
    /// object.
    async fn init<C: Channel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<Self, Error>;

    /// Receives the message selected by each choice bit.
    async fn receive<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<Vec<BitVector>, Error>;
}

//! Two-party cointossing for public shared randomness.
//!
//! Both parties commit to a fresh 256-bit seed, exchange the commitments,
//! then open them. The XOR of both seeds keys a ChaCha20 RNG, so neither
//! party can bias the output as long as the other is honest. The extension
//! layer draws its consistency-check challenges from this RNG, which is why
//! the agreement must only happen after the correlated rows are fixed.

use rand::{CryptoRng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::{
    bitvec::BitVector,
    channel::{Channel, recv_from, send_to},
    ot::{Error, MaliciousError},
};

/// A commitment to a seed, as a BLAKE3 hash of the seed and a role tag.
///
/// This is not a general-purpose commitment scheme, the committed seed is
/// assumed to have high entropy.
#[derive(Serialize, Deserialize)]
struct Commitment([u8; 32]);

fn commit(seed: &[u8; 32], role: u8) -> Commitment {
    let mut hasher = blake3::Hasher::new();
    hasher.update(seed);
    hasher.update(&[role]);
    Commitment(hasher.finalize().into())
}

/// A source of public randomness agreed on by both parties.
pub struct Cointoss {
    rng: ChaCha20Rng,
}

impl Cointoss {
    /// Runs the commit-reveal exchange with the other party.
    ///
    /// The two parties must pass complementary tags, `role` and `role ^ 1`,
    /// so that echoing back the peer's commitment is detected.
    pub async fn agree<C: Channel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
        role: u8,
    ) -> Result<Self, Error> {
        let own_seed: [u8; 32] = rng.random();
        send_to(channel, p_to, "CT_commit", &commit(&own_seed, role)).await?;
        let their_commitment: Commitment = recv_from(channel, p_to, "CT_commit").await?;
        send_to(channel, p_to, "CT_reveal", &own_seed).await?;
        let their_seed: [u8; 32] = recv_from(channel, p_to, "CT_reveal").await?;
        let expected = commit(&their_seed, role ^ 1);
        if their_commitment.0 != expected.0 {
            return Err(MaliciousError::CommitmentMismatch.into());
        }
        let seed = std::array::from_fn(|i| own_seed[i] ^ their_seed[i]);
        Ok(Self {
            rng: ChaCha20Rng::from_seed(seed),
        })
    }

    /// Draws the next shared bit vector. Both parties see the same sequence.
    pub fn toss(&mut self, bits: usize) -> BitVector {
        BitVector::random(bits, &mut self.rng)
    }
}

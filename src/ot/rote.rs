//! Random OT extension with a correlation check against malicious receivers.
//!
//! Builds on the correlated extension: both parties extend `size + κ + λ'`
//! columns, agree on one κ-bit challenge per column via cointossing, and
//! fold the columns into a GF(2)[x] linear combination using carry-less
//! multiplication. The receiver reveals the fold of its rows together with
//! the challenge combination selected by its choice bits; the sender checks
//! that both folds are consistent with Δ. A receiver that used different
//! choice bits across the columns of `u` passes the check with probability
//! at most 2^-λ.
//!
//! The λ' + κ extra columns are sacrificed to the check; the surviving rows
//! are hashed with their index to strip the Δ correlation, which turns the
//! correlated rows into independent pseudorandom message pairs.

use rand::{CryptoRng, Rng};
use tracing::debug;

use crate::{
    bitvec::{BitVector, bit_linear_combination},
    channel::{Channel, recv_from, send_to},
    crypto::{adjust_key, index_hash},
    ot::{BaseOtReceiver, BaseOtSender, Error, MaliciousError, UsageError, cointoss::Cointoss, cote},
    params::Params,
};

/// Random OT extension sender.
pub struct Sender<BOT: BaseOtReceiver> {
    params: Params,
    cote: cote::Sender<BOT>,
    counter: usize,
}

impl<BOT: BaseOtReceiver> Sender<BOT> {
    /// Creates an uninitialized sender for the given parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            cote: cote::Sender::new(params),
            counter: 0,
        }
    }

    /// Runs the base-OT bootstrap of the underlying correlated extension.
    pub async fn init<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        self.cote.init(channel, rng, p_to).await
    }

    /// Produces `size` random message pairs, each 256 bits.
    pub async fn extend<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        size: usize,
        p_to: usize,
    ) -> Result<Vec<(BitVector, BitVector)>, Error> {
        if size == 0 || size % 8 != 0 {
            return Err(UsageError::InvalidSize { size }.into());
        }
        let kappa = self.params.kappa();
        let ext = size + self.params.check_overhead();
        let q = self.cote.extend(channel, ext, p_to).await?;

        // The challenges are only safe to draw once the receiver's rows are
        // fixed, so the agreement happens after the extension messages.
        let mut toss = Cointoss::agree(channel, rng, p_to, 0).await?;
        let mut q_fold = BitVector::zeros(2 * kappa);
        for q_j in &q {
            let chi = toss.toss(kappa);
            q_fold ^= &q_j.carryless_mul(&chi);
        }
        let (x, t): (BitVector, BitVector) = recv_from(channel, p_to, "ROT_x_t").await?;
        if x.len() != kappa || t.len() != 2 * kappa {
            return Err(MaliciousError::MalformedMessage { phase: "ROT_x_t" }.into());
        }
        let delta = self.cote.delta()?;
        if &delta.carryless_mul(&x) ^ &q_fold != t {
            return Err(MaliciousError::ConsistencyCheckFailed.into());
        }
        debug!(size, "correlation check passed, hashing rows");

        let pairs = q
            .iter()
            .take(size)
            .enumerate()
            .map(|(j, q_j)| {
                let index = self.counter + j;
                (index_hash(index, q_j), index_hash(index, &(q_j ^ delta)))
            })
            .collect();
        self.counter += size;
        Ok(pairs)
    }

    /// Like [`Self::extend`], but adjusts each message to `message_bits`.
    pub async fn extend_random<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        size: usize,
        message_bits: usize,
        p_to: usize,
    ) -> Result<Vec<(BitVector, BitVector)>, Error> {
        let pairs = self.extend(channel, rng, size, p_to).await?;
        Ok(pairs
            .iter()
            .map(|(v0, v1)| (adjust_key(v0, message_bits), adjust_key(v1, message_bits)))
            .collect())
    }
}

/// Random OT extension receiver.
pub struct Receiver<BOT: BaseOtSender> {
    params: Params,
    cote: cote::Receiver<BOT>,
    counter: usize,
}

impl<BOT: BaseOtSender> Receiver<BOT> {
    /// Creates an uninitialized receiver for the given parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            cote: cote::Receiver::new(params),
            counter: 0,
        }
    }

    /// Runs the base-OT bootstrap of the underlying correlated extension.
    pub async fn init<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        self.cote.init(channel, rng, p_to).await
    }

    /// Produces `size` random choice bits with their 256-bit messages.
    pub async fn extend<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        size: usize,
        p_to: usize,
    ) -> Result<Vec<(bool, BitVector)>, Error> {
        if size == 0 || size % 8 != 0 {
            return Err(UsageError::InvalidSize { size }.into());
        }
        let kappa = self.params.kappa();
        let ext = size + self.params.check_overhead();
        let choices = BitVector::random(ext, rng);
        let t = self.cote.extend(channel, rng, &choices, p_to).await?;

        let mut toss = Cointoss::agree(channel, rng, p_to, 1).await?;
        let mut chis = Vec::with_capacity(ext);
        let mut t_fold = BitVector::zeros(2 * kappa);
        for t_j in &t {
            let chi = toss.toss(kappa);
            t_fold ^= &t_j.carryless_mul(&chi);
            chis.push(chi);
        }
        let x = bit_linear_combination(&choices, &chis)?;
        send_to(channel, p_to, "ROT_x_t", &(x, t_fold)).await?;
        debug!(size, "correlation check material sent, hashing rows");

        let messages = t
            .iter()
            .take(size)
            .enumerate()
            .map(|(j, t_j)| {
                Ok((choices.bit(j)?, index_hash(self.counter + j, t_j)))
            })
            .collect::<Result<_, Error>>()?;
        self.counter += size;
        Ok(messages)
    }

    /// Like [`Self::extend`], but adjusts each message to `message_bits`.
    pub async fn extend_random<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        size: usize,
        message_bits: usize,
        p_to: usize,
    ) -> Result<Vec<(bool, BitVector)>, Error> {
        let messages = self.extend(channel, rng, size, p_to).await?;
        Ok(messages
            .iter()
            .map(|(b, v)| (*b, adjust_key(v, message_bits)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use futures::try_join;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{channel::SimpleChannel, ot::chou_orlandi};

    #[tokio::test]
    async fn test_receiver_learns_only_chosen_message() -> Result<(), Error> {
        let params = Params::new(128, 40)?;
        let size = 64 * 8;
        let mut channels = SimpleChannel::channels(2);
        let mut ch1 = channels.pop().unwrap();
        let mut ch0 = channels.pop().unwrap();
        let sender = async move {
            let mut rng = StdRng::seed_from_u64(9);
            let mut sender = Sender::<chou_orlandi::Receiver>::new(params);
            sender.init(&mut ch0, &mut rng, 1).await?;
            sender.extend(&mut ch0, &mut rng, size, 1).await
        };
        let receiver = async move {
            let mut rng = StdRng::seed_from_u64(10);
            let mut receiver = Receiver::<chou_orlandi::Sender>::new(params);
            receiver.init(&mut ch1, &mut rng, 0).await?;
            receiver.extend(&mut ch1, &mut rng, size, 0).await
        };
        let (pairs, received) = try_join!(sender, receiver)?;
        assert_eq!(pairs.len(), size);
        assert_eq!(received.len(), size);
        for ((v0, v1), (b, v)) in pairs.iter().zip(&received) {
            assert_eq!(if *b { v1 } else { v0 }, v);
            assert_ne!(v0, v1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_extend_random_adjusts_message_length() -> Result<(), Error> {
        let params = Params::new(128, 40)?;
        let size = 16 * 8;
        let bits = 1024;
        let mut channels = SimpleChannel::channels(2);
        let mut ch1 = channels.pop().unwrap();
        let mut ch0 = channels.pop().unwrap();
        let sender = async move {
            let mut rng = StdRng::seed_from_u64(12);
            let mut sender = Sender::<chou_orlandi::Receiver>::new(params);
            sender.init(&mut ch0, &mut rng, 1).await?;
            sender.extend_random(&mut ch0, &mut rng, size, bits, 1).await
        };
        let receiver = async move {
            let mut rng = StdRng::seed_from_u64(13);
            let mut receiver = Receiver::<chou_orlandi::Sender>::new(params);
            receiver.init(&mut ch1, &mut rng, 0).await?;
            receiver.extend_random(&mut ch1, &mut rng, size, bits, 0).await
        };
        let (pairs, received) = try_join!(sender, receiver)?;
        for ((v0, v1), (b, v)) in pairs.iter().zip(&received) {
            assert_eq!(v0.len(), bits);
            assert_eq!(v1.len(), bits);
            assert_eq!(if *b { v1 } else { v0 }, v);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_size_is_rejected() {
        let params = Params::new(128, 40).unwrap();
        let mut channels = SimpleChannel::channels(2);
        let mut ch0 = channels.remove(0);
        let mut rng = StdRng::seed_from_u64(14);
        let mut sender = Sender::<chou_orlandi::Receiver>::new(params);
        let result = sender.extend(&mut ch0, &mut rng, 12, 1).await;
        assert!(matches!(
            result,
            Err(Error::Usage(UsageError::InvalidSize { size: 12 }))
        ));
    }
}

//! Correlated OT extension (passive core of the KOS protocol).
//!
//! The sender holds a secret κ-bit offset Δ and ends up with one κ-bit row
//! `q_j` per extended OT; the receiver holds a choice bit `b_j` and a row
//! `t_j` such that `q_j = t_j ⊕ b_j·Δ`. The construction runs κ base OTs in
//! the reverse direction (the extension sender acts as base-OT receiver,
//! with the bits of Δ as its choices), stretches the κ seed pairs with a PRG
//! and transposes the resulting κ×ℓ bit matrix so that each extended OT
//! corresponds to one matrix column.
//!
//! On its own this layer is only secure against passive adversaries; the
//! random OT layer on top adds the correlation check that makes the whole
//! stack maliciously secure.

use std::marker::PhantomData;

use rand::{CryptoRng, Rng};
use subtle::{Choice, ConditionallySelectable};
use tracing::debug;

use crate::{
    bitvec::BitVector,
    channel::{Channel, recv_vec_from, send_to},
    crypto::Prg,
    ot::{BaseOtReceiver, BaseOtSender, Error, MaliciousError, UsageError},
    params::Params,
    transpose::transpose,
};

struct SenderState {
    delta: BitVector,
    prgs: Vec<Prg>,
}

/// Correlated OT extension sender.
pub struct Sender<BOT: BaseOtReceiver> {
    params: Params,
    state: Option<SenderState>,
    phantom: PhantomData<BOT>,
}

impl<BOT: BaseOtReceiver> Sender<BOT> {
    /// Creates an uninitialized sender for the given parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            state: None,
            phantom: PhantomData,
        }
    }

    /// Samples Δ and runs the κ base OTs, with the bits of Δ as choices.
    pub async fn init<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        if self.state.is_some() {
            return Err(UsageError::AlreadyInitialized.into());
        }
        let delta = BitVector::random(self.params.kappa(), rng);
        let choices: Vec<bool> = delta.bits().collect();
        let mut base_ot = BOT::init(channel, rng, p_to).await?;
        let seeds = base_ot.receive(channel, &choices, rng, p_to).await?;
        let prgs = seeds
            .iter()
            .map(|seed| Prg::from_seed(seed.as_bytes()))
            .collect();
        self.state = Some(SenderState { delta, prgs });
        Ok(())
    }

    /// The secret correlation offset. Fails before `init`.
    pub(crate) fn delta(&self) -> Result<&BitVector, Error> {
        match &self.state {
            Some(state) => Ok(&state.delta),
            None => Err(UsageError::NotInitialized.into()),
        }
    }

    /// Produces `size` correlated rows `q_j = t_j ⊕ b_j·Δ`.
    pub async fn extend<C: Channel>(
        &mut self,
        channel: &mut C,
        size: usize,
        p_to: usize,
    ) -> Result<Vec<BitVector>, Error> {
        let Some(state) = &mut self.state else {
            return Err(UsageError::NotInitialized.into());
        };
        let kappa = self.params.kappa();
        let padded = padded_len(size, kappa)?;
        debug!(size, padded, "extending correlated OTs as sender");

        let rows: Vec<BitVector> = state.prgs.iter_mut().map(|prg| prg.extend(padded)).collect();
        let u: Vec<BitVector> = recv_vec_from(channel, p_to, "COTE_u", kappa).await?;
        let mut q_rows = Vec::with_capacity(kappa);
        for (i, (t, u)) in rows.iter().zip(&u).enumerate() {
            if u.len() != padded {
                return Err(MaliciousError::MalformedMessage { phase: "COTE_u" }.into());
            }
            // q_i = t_i ⊕ Δ_i·u_i, with the Δ bit applied in constant time.
            let delta_bit = Choice::from(state.delta.bit(i)? as u8);
            let mask = u8::conditional_select(&0, &0xff, delta_bit);
            let bytes = t
                .as_bytes()
                .iter()
                .zip(u.as_bytes())
                .map(|(t, u)| t ^ (u & mask))
                .collect();
            q_rows.push(BitVector::from_bytes(bytes));
        }
        columns_of(&q_rows, kappa, size)
    }
}

/// Correlated OT extension receiver.
pub struct Receiver<BOT: BaseOtSender> {
    params: Params,
    state: Option<Vec<(Prg, Prg)>>,
    phantom: PhantomData<BOT>,
}

impl<BOT: BaseOtSender> Receiver<BOT> {
    /// Creates an uninitialized receiver for the given parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            state: None,
            phantom: PhantomData,
        }
    }

    /// Samples κ seed pairs and sends them through the base OTs.
    pub async fn init<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        if self.state.is_some() {
            return Err(UsageError::AlreadyInitialized.into());
        }
        let kappa = self.params.kappa();
        let seeds: Vec<(BitVector, BitVector)> = (0..kappa)
            .map(|_| {
                (
                    BitVector::random(kappa, rng),
                    BitVector::random(kappa, rng),
                )
            })
            .collect();
        let mut base_ot = BOT::init(channel, rng, p_to).await?;
        base_ot.send(channel, &seeds, rng, p_to).await?;
        let prgs = seeds
            .iter()
            .map(|(s0, s1)| (Prg::from_seed(s0.as_bytes()), Prg::from_seed(s1.as_bytes())))
            .collect();
        self.state = Some(prgs);
        Ok(())
    }

    /// Produces one row `t_j` per choice bit, padding the extension with
    /// fresh random choices so the bit matrix transposes in κ×κ blocks.
    /// The padding columns are discarded by both parties.
    pub async fn extend<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        choices: &BitVector,
        p_to: usize,
    ) -> Result<Vec<BitVector>, Error> {
        let Some(prgs) = &mut self.state else {
            return Err(UsageError::NotInitialized.into());
        };
        let kappa = self.params.kappa();
        let size = choices.len();
        let padded = padded_len(size, kappa)?;
        debug!(size, padded, "extending correlated OTs as receiver");

        let pad = BitVector::random(padded - size, rng);
        let b = BitVector::concat(&[choices.clone(), pad]);
        let mut t_rows = Vec::with_capacity(kappa);
        let mut u = Vec::with_capacity(kappa);
        for (prg0, prg1) in prgs.iter_mut() {
            let t0 = prg0.extend(padded);
            let t1 = prg1.extend(padded);
            u.push(&(&t0 ^ &t1) ^ &b);
            t_rows.push(t0);
        }
        send_to(channel, p_to, "COTE_u", &u).await?;
        columns_of(&t_rows, kappa, size)
    }
}

/// Rounds the extension length up to a multiple of κ.
fn padded_len(size: usize, kappa: usize) -> Result<usize, Error> {
    if size == 0 || size % 8 != 0 {
        return Err(UsageError::InvalidSize { size }.into());
    }
    Ok(size.div_ceil(kappa) * kappa)
}

/// Transposes a κ×`padded` row matrix in κ×κ blocks and returns the first
/// `size` columns.
fn columns_of(rows: &[BitVector], kappa: usize, size: usize) -> Result<Vec<BitVector>, Error> {
    let padded = rows[0].len();
    let mut columns = Vec::with_capacity(padded);
    for chunk in (0..padded).step_by(kappa) {
        let block: Vec<BitVector> = rows.iter().map(|r| r.slice(chunk, kappa)).collect();
        columns.extend(transpose(&block)?);
    }
    columns.truncate(size);
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use futures::try_join;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{channel::SimpleChannel, ot::chou_orlandi};

    #[tokio::test]
    async fn test_rows_satisfy_correlation() -> Result<(), Error> {
        let params = Params::new(128, 40)?;
        let size = 1000 * 8;
        let mut channels = SimpleChannel::channels(2);
        let mut ch1 = channels.pop().unwrap();
        let mut ch0 = channels.pop().unwrap();
        let sender = async move {
            let mut rng = StdRng::seed_from_u64(5);
            let mut sender = Sender::<chou_orlandi::Receiver>::new(params);
            sender.init(&mut ch0, &mut rng, 1).await?;
            let q = sender.extend(&mut ch0, size, 1).await?;
            Ok::<_, Error>((sender.delta()?.clone(), q))
        };
        let receiver = async move {
            let mut rng = StdRng::seed_from_u64(6);
            let mut receiver = Receiver::<chou_orlandi::Sender>::new(params);
            receiver.init(&mut ch1, &mut rng, 0).await?;
            let choices = BitVector::random(size, &mut rng);
            let t = receiver.extend(&mut ch1, &mut rng, &choices, 0).await?;
            Ok::<_, Error>((choices, t))
        };
        let ((delta, q), (choices, t)) = try_join!(sender, receiver)?;
        assert_eq!(q.len(), size);
        assert_eq!(t.len(), size);
        for (j, (q_j, t_j)) in q.iter().zip(&t).enumerate() {
            let expected = if choices.bit(j)? { t_j ^ &delta } else { t_j.clone() };
            assert_eq!(*q_j, expected, "correlation broken at column {j}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_extend_before_init_fails() {
        let params = Params::new(128, 40).unwrap();
        let mut channels = SimpleChannel::channels(2);
        let mut ch0 = channels.remove(0);
        let mut sender = Sender::<chou_orlandi::Receiver>::new(params);
        let result = sender.extend(&mut ch0, 128, 1).await;
        assert!(matches!(
            result,
            Err(Error::Usage(UsageError::NotInitialized))
        ));
    }

    #[tokio::test]
    async fn test_double_init_fails() -> Result<(), Error> {
        let params = Params::new(128, 40).unwrap();
        let mut channels = SimpleChannel::channels(2);
        let mut ch1 = channels.pop().unwrap();
        let mut ch0 = channels.pop().unwrap();
        let sender = async move {
            let mut rng = StdRng::seed_from_u64(7);
            let mut sender = Sender::<chou_orlandi::Receiver>::new(params);
            sender.init(&mut ch0, &mut rng, 1).await?;
            let result = sender.init(&mut ch0, &mut rng, 1).await;
            assert!(matches!(
                result,
                Err(Error::Usage(UsageError::AlreadyInitialized))
            ));
            Ok::<_, Error>(())
        };
        let receiver = async move {
            let mut rng = StdRng::seed_from_u64(8);
            let mut receiver = Receiver::<chou_orlandi::Sender>::new(params);
            receiver.init(&mut ch1, &mut rng, 0).await?;
            Ok::<_, Error>(())
        };
        try_join!(sender, receiver)?;
        Ok(())
    }
}

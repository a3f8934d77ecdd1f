//! Chosen-message OT on top of the random OT extension.
//!
//! Both parties keep a batch of pre-generated random OTs and consume one per
//! transfer; the first use and every exhaustion triggers a fresh extension
//! of `batch_size` OTs. A transfer derandomizes the next random OT: the
//! receiver reveals `switch = choice ⊕ b`, the sender swaps its two random
//! messages accordingly and sends both chosen messages XOR-masked with them.
//! Messages are arbitrary byte strings; a random message shorter than the
//! chosen message is stretched with a keyed XOF before masking.

use rand::{CryptoRng, Rng};
use tracing::debug;

use crate::{
    bitvec::BitVector,
    channel::{Channel, recv_from, send_to},
    crypto::mask,
    ot::{BaseOtReceiver, BaseOtSender, Error, MaliciousError, UsageError, rote},
    params::Params,
};

/// Chosen-message OT sender.
pub struct Sender<BOT: BaseOtReceiver> {
    rot: rote::Sender<BOT>,
    batch_size: usize,
    batch: Vec<(BitVector, BitVector)>,
    cursor: usize,
    refreshes: usize,
}

impl<BOT: BaseOtReceiver> Sender<BOT> {
    /// Creates an uninitialized sender that extends `batch_size` random OTs
    /// at a time.
    pub fn new(params: Params, batch_size: usize) -> Self {
        Self {
            rot: rote::Sender::new(params),
            batch_size,
            batch: Vec::new(),
            cursor: 0,
            refreshes: 0,
        }
    }

    /// Runs the base-OT bootstrap of the underlying extension.
    pub async fn init<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        self.rot.init(channel, rng, p_to).await
    }

    /// Obliviously transfers one of the two messages to the other party.
    pub async fn send<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        msg0: &[u8],
        msg1: &[u8],
        p_to: usize,
    ) -> Result<(), Error> {
        if msg0.len() != msg1.len() {
            return Err(UsageError::LengthMismatch {
                len0: msg0.len(),
                len1: msg1.len(),
            }
            .into());
        }
        if self.cursor >= self.batch.len() {
            debug!(batch_size = self.batch_size, "refreshing sender OT batch");
            self.batch = self.rot.extend(channel, rng, self.batch_size, p_to).await?;
            self.cursor = 0;
            self.refreshes += 1;
        }
        let (v0, v1) = &self.batch[self.cursor];
        self.cursor += 1;

        let switch: bool = recv_from(channel, p_to, "OT_switch").await?;
        let (k0, k1) = if switch { (v1, v0) } else { (v0, v1) };
        let ciphertexts = (mask(msg0, k0), mask(msg1, k1));
        send_to(channel, p_to, "OT_c0c1", &ciphertexts).await?;
        Ok(())
    }
}

/// Chosen-message OT receiver.
pub struct Receiver<BOT: BaseOtSender> {
    rot: rote::Receiver<BOT>,
    batch_size: usize,
    batch: Vec<(bool, BitVector)>,
    cursor: usize,
    refreshes: usize,
}

impl<BOT: BaseOtSender> Receiver<BOT> {
    /// Creates an uninitialized receiver that extends `batch_size` random
    /// OTs at a time.
    pub fn new(params: Params, batch_size: usize) -> Self {
        Self {
            rot: rote::Receiver::new(params),
            batch_size,
            batch: Vec::new(),
            cursor: 0,
            refreshes: 0,
        }
    }

    /// Runs the base-OT bootstrap of the underlying extension.
    pub async fn init<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        self.rot.init(channel, rng, p_to).await
    }

    /// Receives the message selected by `choice`.
    pub async fn receive<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        choice: bool,
        p_to: usize,
    ) -> Result<Vec<u8>, Error> {
        if self.cursor >= self.batch.len() {
            debug!(batch_size = self.batch_size, "refreshing receiver OT batch");
            self.batch = self.rot.extend(channel, rng, self.batch_size, p_to).await?;
            self.cursor = 0;
            self.refreshes += 1;
        }
        let (b, v) = &self.batch[self.cursor];
        self.cursor += 1;

        send_to(channel, p_to, "OT_switch", &(choice ^ b)).await?;
        let (c0, c1): (Vec<u8>, Vec<u8>) = recv_from(channel, p_to, "OT_c0c1").await?;
        if c0.len() != c1.len() {
            return Err(MaliciousError::AdjustmentLengthMismatch {
                len0: c0.len(),
                len1: c1.len(),
            }
            .into());
        }
        let c = if choice { c1 } else { c0 };
        Ok(mask(&c, v))
    }
}

#[cfg(test)]
mod tests {
    use futures::try_join;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{channel::SimpleChannel, ot::chou_orlandi};

    type TestSender = Sender<chou_orlandi::Receiver>;
    type TestReceiver = Receiver<chou_orlandi::Sender>;

    #[tokio::test]
    async fn test_transfers_messages_of_varying_length() -> Result<(), Error> {
        let params = Params::new(128, 40)?;
        let messages: Vec<(Vec<u8>, Vec<u8>)> = vec![
            (b"yes".to_vec(), b"no!".to_vec()),
            (vec![], vec![]),
            (vec![0xaa; 17], vec![0x55; 17]),
            (vec![1; 4096], vec![2; 4096]),
        ];
        let expected = messages.clone();
        let mut channels = SimpleChannel::channels(2);
        let mut ch1 = channels.pop().unwrap();
        let mut ch0 = channels.pop().unwrap();
        let sender = async move {
            let mut rng = StdRng::seed_from_u64(15);
            let mut sender = TestSender::new(params, 16 * 8);
            sender.init(&mut ch0, &mut rng, 1).await?;
            for (msg0, msg1) in &messages {
                sender.send(&mut ch0, &mut rng, msg0, msg1, 1).await?;
            }
            Ok::<_, Error>(())
        };
        let receiver = async move {
            let mut rng = StdRng::seed_from_u64(16);
            let mut receiver = TestReceiver::new(params, 16 * 8);
            receiver.init(&mut ch1, &mut rng, 0).await?;
            let mut received = Vec::new();
            for _ in 0..4 {
                let choice: bool = rng.random();
                received.push((choice, receiver.receive(&mut ch1, &mut rng, choice, 0).await?));
            }
            Ok::<_, Error>(received)
        };
        let ((), received) = try_join!(sender, receiver)?;
        for ((choice, got), (msg0, msg1)) in received.iter().zip(&expected) {
            assert_eq!(got, if *choice { msg1 } else { msg0 });
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_batch_is_extended_exactly_on_exhaustion() -> Result<(), Error> {
        let params = Params::new(128, 40)?;
        let batch_size = 8;
        let transfers = 2 * batch_size;
        let mut channels = SimpleChannel::channels(2);
        let mut ch1 = channels.pop().unwrap();
        let mut ch0 = channels.pop().unwrap();
        let sender = async move {
            let mut rng = StdRng::seed_from_u64(17);
            let mut sender = TestSender::new(params, batch_size);
            sender.init(&mut ch0, &mut rng, 1).await?;
            let mut first_batch = Vec::new();
            for i in 0..transfers {
                sender.send(&mut ch0, &mut rng, &[i as u8], &[!i as u8], 1).await?;
                if i == batch_size - 1 {
                    first_batch = sender.batch.clone();
                }
            }
            // The second extension must produce fresh pairs, not replay the
            // first batch.
            for pair in &sender.batch {
                assert!(!first_batch.contains(pair));
            }
            Ok::<_, Error>(sender.refreshes)
        };
        let receiver = async move {
            let mut rng = StdRng::seed_from_u64(18);
            let mut receiver = TestReceiver::new(params, batch_size);
            receiver.init(&mut ch1, &mut rng, 0).await?;
            let mut received = Vec::new();
            for i in 0..transfers {
                let choice = i % 2 == 0;
                received.push((choice, receiver.receive(&mut ch1, &mut rng, choice, 0).await?));
            }
            Ok::<_, Error>((receiver.refreshes, received))
        };
        let (sender_refreshes, (receiver_refreshes, received)) = try_join!(sender, receiver)?;
        assert_eq!(sender_refreshes, 2);
        assert_eq!(receiver_refreshes, 2);
        for (i, (choice, got)) in received.iter().enumerate() {
            let expected = if *choice { vec![!(i as u8)] } else { vec![i as u8] };
            assert_eq!(*got, expected);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_length_mismatch_rejected_before_any_traffic() {
        let params = Params::new(128, 40).unwrap();
        let mut channels = SimpleChannel::channels(2);
        let mut ch0 = channels.remove(0);
        let mut rng = StdRng::seed_from_u64(19);
        let mut sender = TestSender::new(params, 8);
        let result = sender.send(&mut ch0, &mut rng, &[1, 2], &[1, 2, 3], 1).await;
        assert!(matches!(
            result,
            Err(Error::Usage(UsageError::LengthMismatch { len0: 2, len1: 3 }))
        ));
    }
}

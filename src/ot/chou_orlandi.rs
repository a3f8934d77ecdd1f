//! Implementation of the Chou-Orlandi oblivious transfer protocol (cf.
//! <https://eprint.iacr.org/2015/267>).
//!
//! This implementation uses the Ristretto prime order elliptic curve group
//! from the `curve25519-dalek` library. Messages are bit vectors of arbitrary
//! (byte-aligned) length; the derived point keys are stretched to the message
//! length with a keyed BLAKE3 XOF. The key derivation hashes in the instance
//! counter, since otherwise all transfers of a session would derive related
//! keys from a repeated point.
//!
//! The extension layers use this as their base-OT collaborator: κ transfers
//! of κ-bit seed material per session.

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_TABLE,
    ristretto::{CompressedRistretto, RistrettoBasepointTable, RistrettoPoint},
    scalar::Scalar,
};
use rand::{CryptoRng, Rng};

use crate::{
    bitvec::BitVector,
    channel::{Channel, recv_from, recv_vec_from, send_to},
    ot::{BaseOtReceiver, BaseOtSender, Error, MaliciousError, UsageError, hash_point},
    utils::RngCompat,
};

/// Oblivious transfer sender.
pub struct Sender {
    y: Scalar,
    s: RistrettoPoint,
    counter: u128,
}

impl BaseOtSender for Sender {
    async fn init<C: Channel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<Self, Error> {
        let y = Scalar::random(&mut RngCompat(rng));
        let s = &y * RISTRETTO_BASEPOINT_TABLE;
        send_to(channel, p_to, "CO_OT_s", &s.compress().to_bytes()).await?;
        Ok(Self { y, s, counter: 0 })
    }

    async fn send<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        inputs: &[(BitVector, BitVector)],
        _: &mut RNG,
        p_to: usize,
    ) -> Result<(), Error> {
        for (msg0, msg1) in inputs {
            if msg0.len() != msg1.len() {
                return Err(UsageError::LengthMismatch {
                    len0: msg0.len() / 8,
                    len1: msg1.len() / 8,
                }
                .into());
            }
        }
        let ys = self.y * self.s;
        let points: Vec<[u8; 32]> =
            recv_vec_from(channel, p_to, "CO_OT_r", inputs.len()).await?;
        let mut ciphertexts = Vec::with_capacity(inputs.len());
        for (i, (bytes, (msg0, msg1))) in points.into_iter().zip(inputs).enumerate() {
            let r = decompress(&bytes)?;
            let yr = self.y * r;
            let tweak = self.counter + i as u128;
            let k0 = BitVector::from_bytes(hash_point(tweak, &yr, msg0.len() / 8));
            let k1 = BitVector::from_bytes(hash_point(tweak, &(yr - ys), msg1.len() / 8));
            ciphertexts.push((msg0 ^ &k0, msg1 ^ &k1));
        }
        self.counter += inputs.len() as u128;
        send_to(channel, p_to, "CO_OT_c0c1", &ciphertexts).await?;
        Ok(())
    }
}

/// Oblivious transfer receiver.
pub struct Receiver {
    s: RistrettoBasepointTable,
    counter: u128,
}

impl BaseOtReceiver for Receiver {
    async fn init<C: Channel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        _: &mut RNG,
        p_to: usize,
    ) -> Result<Self, Error> {
        let bytes: [u8; 32] = recv_from(channel, p_to, "CO_OT_s").await?;
        let s = RistrettoBasepointTable::create(&decompress(&bytes)?);
        Ok(Self { s, counter: 0 })
    }

    async fn receive<C: Channel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        rng: &mut RNG,
        p_to: usize,
    ) -> Result<Vec<BitVector>, Error> {
        let zero = &Scalar::ZERO * &self.s;
        let one = &Scalar::ONE * &self.s;
        let mut blinded = Vec::with_capacity(choices.len());
        let mut keys = Vec::with_capacity(choices.len());
        for b in choices {
            let x = Scalar::random(&mut RngCompat(&mut *rng));
            let c = if *b { one } else { zero };
            let r = c + &x * RISTRETTO_BASEPOINT_TABLE;
            blinded.push(r.compress().to_bytes());
            keys.push(&x * &self.s);
        }
        send_to(channel, p_to, "CO_OT_r", &blinded).await?;

        let ciphertexts: Vec<(BitVector, BitVector)> =
            recv_vec_from(channel, p_to, "CO_OT_c0c1", choices.len()).await?;
        let mut result = Vec::with_capacity(choices.len());
        for (i, ((b, key), (c0, c1))) in choices.iter().zip(keys).zip(ciphertexts).enumerate() {
            if c0.len() != c1.len() {
                return Err(MaliciousError::MalformedMessage {
                    phase: "CO_OT_c0c1",
                }
                .into());
            }
            let c = if *b { c1 } else { c0 };
            let k = BitVector::from_bytes(hash_point(
                self.counter + i as u128,
                &key,
                c.len() / 8,
            ));
            result.push(&c ^ &k);
        }
        self.counter += choices.len() as u128;
        Ok(result)
    }
}

fn decompress(bytes: &[u8; 32]) -> Result<RistrettoPoint, Error> {
    CompressedRistretto::from_slice(bytes)
        .map_err(|_| MaliciousError::InvalidPoint)?
        .decompress()
        .ok_or_else(|| MaliciousError::InvalidPoint.into())
}

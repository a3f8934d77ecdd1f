//! Symmetric primitives used by the OT extension layers: the AES-CTR
//! pseudorandom generator for seed expansion and the BLAKE3 helpers for
//! correlation-stripping and mask stretching.

mod hash;
mod prg;

pub(crate) use hash::{adjust_key, index_hash, mask};
pub(crate) use prg::Prg;

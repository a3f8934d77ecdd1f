//! A Rust implementation of maliciously secure oblivious transfer (OT)
//! extension, following the KOS-style construction of
//! [Actively Secure OT Extension with Optimal Overhead](https://eprint.iacr.org/2015/546).
//!
//! A small number of expensive public-key base OTs is stretched into an
//! arbitrary number of fast symmetric-key OTs: first into correlated OTs
//! sharing a secret offset, then into random OTs via a cointossed
//! consistency check and per-row hashing, and finally into chosen-message
//! OTs of arbitrary byte strings through derandomization.
//!
//! ## Main Components
//!
//! The crate is structured into several modules:
//!
//! * [`ot`]: The protocol stack, from the Chou-Orlandi base OT up to
//!   batched chosen-message transfers ([`ot::OtSender`] / [`ot::OtReceiver`]).
//! * [`channel`]: Communication abstractions for exchanging data between
//!   the two parties.
//! * [`params`]: The computational and statistical security parameters.
//! * [`bitvec`]: Byte-packed bit vectors with the XOR and carry-less
//!   multiplication operations the protocols are built on.
//! * [`transpose`]: Cache-friendly transposition of large bit matrices.
//!
//! ## Basic Usage
//!
//! Each party connects a [`channel::Channel`] to its peer, constructs its
//! role with [`params::Params`] and a batch size, calls `init` once to run
//! the base OTs, and then transfers messages:
//!
//! ```ignore
//! use otx::{ot::OtSender, params::Params};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut channel = /* ... */
//! let mut rng = rand::rng();
//! let params = Params::new(128, 40)?;
//! let mut sender = OtSender::new(params, 1024);
//! sender.init(&mut channel, &mut rng, 1).await?;
//! sender.send(&mut channel, &mut rng, b"first", b"other", 1).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! The extension is secure against malicious adversaries: a receiver that
//! deviates from the protocol is caught by the consistency check except
//! with probability negligible in the statistical parameter, and a
//! cheating party learns nothing about the honest party's choice bits or
//! unchosen messages.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bitvec;
pub mod channel;
pub mod ot;
pub mod params;
pub mod transpose;

mod crypto;
mod utils;

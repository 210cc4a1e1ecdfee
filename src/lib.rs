//! Anonymous veto protocol over the negacyclic ring Z_q[x]/(x^d + 1)
//!
//! Every participant holds a private allow/veto bit. Participants split zero into additive
//! shares, swap them through a shared store, wait at a barrier, and publish a ballot that is
//! either an LWE-style sample (allow) or oversized decoy noise (veto). A separate tally sums the
//! ballots and learns whether anyone vetoed, but not who.

/// Number of coefficients of every ring element
pub const DEGREE: usize = 64;

/// The prime modulus q
pub const MODULUS: i64 = 315521;

pub mod arithmetics;
pub mod ballot;
pub mod barrier;
pub mod config;
pub mod error;
pub mod noise;
pub mod participant;
pub mod shares;
pub mod store;
pub mod tally;

pub use error::{AvpError, Result};

//! Lithium: an automated, delta-debugging testcase reducer.
//!
//! Given a file and an oracle that classifies candidate subsequences of it
//! as "interesting" or not, the engine in this crate repeatedly probes the
//! oracle and converges on a locally minimal interesting subsequence. See
//! [`atoms`] for the tokenization model, [`harness`] for the probe loop
//! every strategy is built on, and [`reducers`] for the strategies
//! themselves.

pub mod atoms;
pub mod error;
pub mod harness;
pub mod oracle;
pub mod reducers;
pub mod workspace;

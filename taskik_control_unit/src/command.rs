//! Command surface root.
//!
//! Lock-bounded snapshot sharing, the asynchronous update handle and the
//! line-oriented console that feeds it.

pub mod console;
pub mod snapshot;
pub mod surface;

//! # engine — strategy, state and the trading loop

pub mod controller;
pub mod decision;
pub mod position;
pub mod schedule;
pub mod signal;
pub mod stats;
pub mod supervisor;

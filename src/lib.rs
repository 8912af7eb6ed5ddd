// Deferred-work core for an embedded protocol stack: FIFO tasklets and
// a callback multiplexer, driven by the host's run loop

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod kernel;

pub use kernel::*;

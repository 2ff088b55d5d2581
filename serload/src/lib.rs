//! Serload is the serial intake and command layer of a small device. It
//! takes bytes from a receive interrupt, batches them into line buffers
//! and hands them in order to a worker, which feeds them to whichever
//! stream processor the session has bound: an interactive shell or an
//! Intel HEX loader that stores uploads and runs them.
//!
//! The crate is `#[no_std]` and only needs an allocator. The transport,
//! the storage and the script engine are traits, so it can be driven from
//! an interrupt on a microcontroller or from a reader thread on a host.
//!
//! Pieces:
//! - [`intake::Intake`] – interrupt half, never blocks
//! - [`worker::Worker`] – drains the queue and drives the processors
//! - [`pipeline::Pipeline`] – owns the buffer pool and the transfer queue
//! - [`shell::Shell`] and [`decoder::RecordDecoder`] – the two processors
//!
//! # Example
//! ```
//! use core::convert::Infallible;
//! use serload::config::ConfigBuilder;
//! use serload::console::Console;
//! use serload::engine::Engine;
//! use serload::pipeline::Pipeline;
//! use serload::stats::Stats;
//! use serload::storage::MemoryStorage;
//! use serload::worker::Io;
//!
//! struct Echo;
//!
//! impl Engine for Echo {
//!     fn run(&mut self, _name: &str, source: &[u8], console: &mut dyn Console) {
//!         console.echo(source);
//!     }
//!
//!     fn eval(&mut self, source: &str, console: &mut dyn Console) {
//!         console.println(source);
//!     }
//!
//!     fn take_error(&mut self) -> bool {
//!         false
//!     }
//! }
//!
//! let stats = Stats::new();
//! let config = ConfigBuilder::new().with_prompt("> ").build();
//! let mut pipeline: Pipeline = Pipeline::new();
//! let (mut intake, mut worker) = pipeline.split(&stats, &config, || ());
//!
//! let mut input = b"at\r".iter().copied();
//! intake
//!     .on_interrupt(|| input.next().ok_or(nb::Error::<Infallible>::WouldBlock))
//!     .unwrap();
//!
//! let mut output = Vec::new();
//! let mut storage = MemoryStorage::<4, 1024>::new();
//!
//! worker.poll(&mut Io {
//!     console: &mut output,
//!     storage: &mut storage,
//!     engine: &mut Echo,
//! });
//!
//! assert!(output.ends_with(b"OK\r\n> "));
//! ```

#![no_std]

extern crate alloc;

#[cfg(any(test, doc, feature = "std"))]
#[macro_use]
extern crate std;

pub mod args;
pub mod commands;
pub mod config;
pub mod console;
pub mod decoder;
pub mod editor;
pub mod engine;
pub mod error;
pub mod ihex;
pub mod input;
pub mod intake;
pub mod line_buffer;
pub mod pipeline;
pub mod pool;
pub mod processor;
pub mod queue;
pub mod session;
pub mod shell;
pub mod stats;
pub mod storage;
pub mod worker;

#[cfg(test)]
pub(crate) mod testlib;

pub use config::{Config, ConfigBuilder};
pub use error::Error;
pub use pipeline::Pipeline;
pub use processor::{Env, StreamProcessor};
pub use worker::{Io, Worker};

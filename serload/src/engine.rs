//! Script engine seam.
//!
//! The engine itself lives outside this crate. It reports failure
//! out-of-band: after a `run` or `eval`, [`Engine::take_error`] tells
//! whether the last call failed.

use alloc::{vec, vec::Vec};

use log::{error, info};

use crate::console::Console;
use crate::error::Error;
use crate::storage::{Handle, OpenMode, Storage};

/// Printed when the engine reports a failure
pub const RUN_FAILED: &str = "Failed to run JS";

pub trait Engine {
    /// Execute a stored artifact
    fn run(&mut self, name: &str, source: &[u8], console: &mut dyn Console);

    /// Evaluate a single line of source
    fn eval(&mut self, source: &str, console: &mut dyn Console);

    /// Return and clear the failure flag of the last call
    fn take_error(&mut self) -> bool;
}

/// Load `name` from storage and hand it to the engine
pub fn run_artifact(
    name: &str,
    storage: &mut dyn Storage,
    engine: &mut dyn Engine,
    console: &mut dyn Console,
) -> Result<(), Error> {
    let handle = storage.open(name, OpenMode::Read).ok_or(Error::NotFound)?;

    let result = read_all(storage, handle);
    storage.close(handle);
    let source = result?;

    // Text with an embedded NUL is shorter than what was stored
    if source.contains(&0) {
        error!("{}: stored size {} disagrees with text length", name, source.len());
        return Err(Error::SizeMismatch);
    }

    info!("running {} ({} bytes)", name, source.len());
    engine.run(name, &source, console);

    if engine.take_error() {
        console.println(RUN_FAILED);
    }

    Ok(())
}

/// Evaluate one line and report failure on the console
pub fn eval_line(source: &str, engine: &mut dyn Engine, console: &mut dyn Console) {
    engine.eval(source, console);

    if engine.take_error() {
        console.println(RUN_FAILED);
    }
}

fn read_all(storage: &mut dyn Storage, handle: Handle) -> Result<Vec<u8>, Error> {
    let size = storage.size(handle)?;
    let mut source = vec![0; size];
    let mut filled = 0;

    while filled < size {
        match storage.read(handle, &mut source[filled..])? {
            0 => break,
            n => filled += n,
        }
    }

    source.truncate(filled);

    Ok(source)
}

//! Interactive shell processor.
//!
//! Feeds bytes to a [`LineEditor`] and hands each finished line to the
//! command table, the open capture file or the engine, depending on the
//! session overlay. It reports itself done when a command asks for the
//! upload processor, leaving the rest of the buffer for it.

use log::{debug, info, warn};

use crate::commands;
use crate::config::MAX_LINE;
use crate::editor::{Key, LineEditor};
use crate::engine::eval_line;
use crate::error::Error;
use crate::input::ControlCharacter;
use crate::processor::{Env, StreamProcessor};
use crate::session::{Mode, Overlay};

pub struct Shell<const CAP: usize = MAX_LINE> {
    editor: LineEditor<CAP>,
    handoff: bool,
}

impl<const CAP: usize> Shell<CAP> {
    pub fn new() -> Self {
        Self {
            editor: LineEditor::new(),
            handoff: false,
        }
    }

    fn prompt(&self, env: &mut Env<'_>) {
        env.console.print(env.session.prompt);
    }

    fn on_line(&mut self, env: &mut Env<'_>) {
        let line = self.editor.line_str();

        match env.session.overlay {
            None => {
                if let Err(err) = commands::execute(line, env) {
                    env.console.print_fmt(format_args!("\x1b[31m{}\x1b[39m\r\n", err));
                }
            }
            Some(Overlay::Capture) => {
                if let Err(err) = append_line(line, env) {
                    warn!("capture write failed: {}", err);
                    env.console.print_fmt(format_args!("\x1b[31m{}\x1b[39m\r\n", err));
                }
            }
            Some(Overlay::Eval) => eval_line(line, env.engine, env.console),
        }

        self.editor.clear();
        self.handoff = env.session.mode() == Mode::Upload;

        if !self.handoff {
            self.prompt(env);
        }
    }

    fn on_control(&mut self, c: ControlCharacter, env: &mut Env<'_>) {
        match (env.session.overlay, c) {
            (Some(Overlay::Capture), ControlCharacter::CtrlZ) => {
                if !self.editor.is_empty() {
                    let line = self.editor.line_str();

                    if let Err(err) = append_line(line, env) {
                        warn!("capture write failed: {}", err);
                    }
                }

                if let Some(handle) = env.session.leave_overlay() {
                    env.storage.close(handle);
                }

                info!("saved {}", env.session.filename);
                self.finish_overlay(env);
            }
            (
                Some(Overlay::Capture),
                ControlCharacter::CtrlX | ControlCharacter::CtrlC,
            ) => {
                if let Some(handle) = env.session.leave_overlay() {
                    env.storage.close(handle);
                }

                env.storage.remove(&env.session.filename);
                info!("discarded {}", env.session.filename);
                self.finish_overlay(env);
            }
            (
                Some(Overlay::Eval),
                ControlCharacter::CtrlC | ControlCharacter::CtrlX | ControlCharacter::CtrlZ,
            ) => {
                env.session.leave_overlay();
                self.finish_overlay(env);
            }
            (None, ControlCharacter::CtrlC) => {
                env.console.print("^C\r\n");
                self.editor.clear();
                self.prompt(env);
            }
            (_, c) => debug!("ignored {:?}", c),
        }
    }

    fn finish_overlay(&mut self, env: &mut Env<'_>) {
        self.editor.clear();
        env.console.print("\r\n");
        self.prompt(env);
    }
}

impl<const CAP: usize> Default for Shell<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

fn append_line(line: &str, env: &mut Env<'_>) -> Result<(), Error> {
    let handle = env.session.capture().ok_or(Error::StorageOpen)?;

    let written = env.storage.write(handle, line.as_bytes())? + env.storage.write(handle, b"\n")?;

    if written < line.len() + 1 {
        warn!("capture clipped, file is full");
    }

    Ok(())
}

impl<const CAP: usize> StreamProcessor for Shell<CAP> {
    fn init(&mut self, _target: &str, env: &mut Env<'_>) -> Result<(), Error> {
        self.editor.clear();
        self.handoff = false;
        self.prompt(env);

        Ok(())
    }

    fn process(&mut self, bytes: &[u8], env: &mut Env<'_>) -> usize {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.editor.advance(byte, env.console) {
                Key::None => (),
                Key::Line => self.on_line(env),
                Key::Control(c) => self.on_control(c, env),
            }

            if self.handoff {
                return i + 1;
            }
        }

        bytes.len()
    }

    fn is_done(&self) -> bool {
        self.handoff
    }

    fn close(&mut self, _env: &mut Env<'_>) -> Result<(), Error> {
        self.handoff = false;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}

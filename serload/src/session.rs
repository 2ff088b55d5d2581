//! Shell session state shared by the shell, the command handlers and the
//! worker's processor binding.

use log::info;

use crate::config::{Config, MAX_NAME_LEN};
use crate::error::Error;
use crate::storage::Handle;

/// Bounded file name
pub type Name = heapless::String<MAX_NAME_LEN>;

/// Prompt shown while evaluating lines
pub const EVAL_PROMPT: &str = "js> ";

/// Copy `name` into a [`Name`], rejecting it when it does not fit
pub fn parse_name(name: &str) -> Result<Name, Error> {
    Name::try_from(name).map_err(|_| Error::NameTooLong)
}

/// How `load` takes the next file
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Transfer {
    Raw,
    Ihex,
}

impl Transfer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transfer::Raw => "raw",
            Transfer::Ihex => "ihex",
        }
    }

    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "raw" => Ok(Transfer::Raw),
            "ihex" => Ok(Transfer::Ihex),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Line handler stacked on top of command mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Overlay {
    /// Lines are appended to the open capture target
    Capture,
    /// Lines are evaluated one by one
    Eval,
}

/// Processor the worker should have bound
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Mode {
    Shell,
    Upload,
}

pub struct Session {
    pub transfer: Transfer,
    pub overlay: Option<Overlay>,
    pub filename: Name,
    pub prompt: &'static str,
    default_prompt: &'static str,
    mode: Mode,
    capture: Option<Handle>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            transfer: Transfer::Ihex,
            overlay: None,
            filename: config.filename.clone(),
            prompt: config.prompt,
            default_prompt: config.prompt,
            mode: Mode::Shell,
            capture: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn default_prompt(&self) -> &'static str {
        self.default_prompt
    }

    pub fn capture(&self) -> Option<Handle> {
        self.capture
    }

    pub fn begin_capture(&mut self, handle: Handle) {
        info!("capturing into {}", self.filename);
        self.overlay = Some(Overlay::Capture);
        self.capture = Some(handle);
        self.prompt = "";
    }

    pub fn begin_eval(&mut self) {
        info!("entering eval mode");
        self.overlay = Some(Overlay::Eval);
        self.prompt = EVAL_PROMPT;
    }

    /// Drop the overlay and give back the capture handle, if any
    pub fn leave_overlay(&mut self) -> Option<Handle> {
        info!("back to command mode");
        self.overlay = None;
        self.prompt = self.default_prompt;
        self.capture.take()
    }

    /// Hand the stream to the record decoder
    pub fn begin_upload(&mut self) {
        info!("upload of {} requested", self.filename);
        self.mode = Mode::Upload;
    }

    pub fn end_upload(&mut self) {
        info!("upload finished, shell resumes");
        self.mode = Mode::Shell;
        self.prompt = self.default_prompt;
    }
}

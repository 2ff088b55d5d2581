//! Shell command table

use log::{debug, info};

use crate::args::Args;
use crate::engine::{eval_line, run_artifact};
use crate::error::Error;
use crate::processor::Env;
use crate::session::{parse_name, Name, Transfer};
use crate::storage::OpenMode;

/// Most tokens looked at on one line
pub const MAX_ARGS: usize = 8;

type Argv<'a> = heapless::Vec<&'a str, MAX_ARGS>;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const TEST_SCRIPT: &str =
    "var test=0; for (var t=100; t<1000; t++) test+=t; print ('Hi JS World! '+test);";

pub struct Command {
    pub name: &'static str,
    pub brief: &'static str,
    pub handler: fn(&[&str], &mut Env<'_>) -> Result<(), Error>,
}

pub static COMMANDS: &[Command] = &[
    Command {
        name: "set",
        brief: "set transfer {raw|ihex} | set filename <name>",
        handler: cmd_set,
    },
    Command {
        name: "get",
        brief: "get transfer | get filename",
        handler: cmd_get,
    },
    Command {
        name: "load",
        brief: "Receive the current file",
        handler: cmd_load,
    },
    Command {
        name: "run",
        brief: "run [name]  Execute a stored file",
        handler: cmd_run,
    },
    Command {
        name: "eval",
        brief: "Evaluate lines until Ctrl-C",
        handler: cmd_eval,
    },
    Command {
        name: "cat",
        brief: "cat [name]  Print a file",
        handler: cmd_cat,
    },
    Command {
        name: "ls",
        brief: "ls [name]  List files",
        handler: cmd_ls,
    },
    Command {
        name: "du",
        brief: "du [name]  Show used bytes",
        handler: cmd_du,
    },
    Command {
        name: "rm",
        brief: "rm <name>  Delete a file",
        handler: cmd_rm,
    },
    Command {
        name: "clear",
        brief: "Clear the screen",
        handler: cmd_clear,
    },
    Command {
        name: "help",
        brief: "List commands",
        handler: cmd_help,
    },
    Command {
        name: "test",
        brief: "Run the built-in script",
        handler: cmd_test,
    },
    Command {
        name: "at",
        brief: "Answer OK",
        handler: cmd_at,
    },
    Command {
        name: "stat",
        brief: "Intake and pool counters",
        handler: cmd_stat,
    },
];

/// Tokenize `line` and run the first command whose name matches exactly
pub fn execute(line: &str, env: &mut Env<'_>) -> Result<(), Error> {
    let mut argv = Argv::new();

    for arg in Args::new(line) {
        argv.push(arg).map_err(|_| Error::InvalidArgument)?;
    }

    let Some(&name) = argv.first() else {
        return Ok(());
    };

    let command = COMMANDS
        .iter()
        .find(|c| c.name == name)
        .ok_or(Error::UnknownCommand)?;

    debug!("{} with {} args", command.name, argv.len() - 1);

    (command.handler)(&argv, env)
}

pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|c| c.name)
}

/// Optional file name argument, defaulting to the session file
fn target(argv: &[&str], env: &Env<'_>) -> Result<Name, Error> {
    match argv.get(1) {
        Some(name) => parse_name(name),
        None => Ok(env.session.filename.clone()),
    }
}

fn cmd_set(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let key = argv.get(1).ok_or(Error::MissingArgument)?;
    let value = argv.get(2).ok_or(Error::MissingArgument)?;

    match *key {
        "transfer" => {
            env.session.transfer = Transfer::parse(value)?;
            info!("transfer mode {}", value);
        }
        "filename" => {
            env.session.filename = parse_name(value)?;
            info!("target file {}", value);
        }
        _ => return Err(Error::InvalidArgument),
    }

    Ok(())
}

fn cmd_get(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    match argv.get(1).copied() {
        Some("transfer") => env.console.println(env.session.transfer.as_str()),
        Some("filename") => env.console.println(&env.session.filename),
        Some(_) => return Err(Error::InvalidArgument),
        None => return Err(Error::MissingArgument),
    }

    Ok(())
}

fn cmd_load(_argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    match env.session.transfer {
        Transfer::Raw => {
            let handle = env
                .storage
                .open(&env.session.filename, OpenMode::Write)
                .ok_or(Error::StorageOpen)?;

            env.console.println("Ctrl-Z saves, Ctrl-X discards");
            env.session.begin_capture(handle);
        }
        Transfer::Ihex => env.session.begin_upload(),
    }

    Ok(())
}

fn cmd_run(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let name = target(argv, env)?;

    run_artifact(&name, env.storage, env.engine, env.console)
}

fn cmd_eval(_argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    env.session.begin_eval();

    Ok(())
}

fn cmd_cat(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let name = target(argv, env)?;
    let handle = env
        .storage
        .open(&name, OpenMode::Read)
        .ok_or(Error::NotFound)?;

    let mut chunk = [0u8; 32];

    loop {
        let count = match env.storage.read(handle, &mut chunk) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) => {
                env.storage.close(handle);
                return Err(err);
            }
        };

        for line in chunk[..count].split_inclusive(|&b| b == b'\n') {
            match line.split_last() {
                Some((b'\n', text)) => {
                    env.console.echo(text);
                    env.console.print("\r\n");
                }
                _ => env.console.echo(line),
            }
        }
    }

    env.storage.close(handle);
    env.console.print("\r\n");

    Ok(())
}

fn cmd_ls(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let only = match argv.get(1) {
        Some(name) => Some(parse_name(name)?),
        None => None,
    };

    let mut found = false;
    let Env {
        storage, console, ..
    } = env;

    storage.list(&mut |name, size| {
        if only.as_deref().map_or(true, |only| only == name) {
            found = true;
            console.print_fmt(format_args!("{:>6} {}\r\n", size, name));
        }
    });

    if only.is_some() && !found {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn cmd_du(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let only = match argv.get(1) {
        Some(name) => Some(parse_name(name)?),
        None => None,
    };

    let mut total = 0;
    let mut found = false;

    env.storage.list(&mut |name, size| {
        if only.as_deref().map_or(true, |only| only == name) {
            found = true;
            total += size;
        }
    });

    if only.is_some() && !found {
        return Err(Error::NotFound);
    }

    env.console.print_fmt(format_args!("{} bytes\r\n", total));

    Ok(())
}

fn cmd_rm(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let name = parse_name(argv.get(1).ok_or(Error::MissingArgument)?)?;

    if !env.storage.remove(&name) {
        return Err(Error::NotFound);
    }

    info!("removed {}", name);

    Ok(())
}

fn cmd_clear(_argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    env.console.print(CLEAR_SCREEN);

    Ok(())
}

fn cmd_help(argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    if let Some(name) = argv.get(1) {
        let command = COMMANDS
            .iter()
            .find(|c| c.name == *name)
            .ok_or(Error::UnknownCommand)?;

        env.console
            .print_fmt(format_args!("{}: {}\r\n", command.name, command.brief));
    } else {
        for command in COMMANDS {
            env.console
                .print_fmt(format_args!("  {:<6} {}\r\n", command.name, command.brief));
        }
    }

    Ok(())
}

fn cmd_test(_argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    env.console
        .print_fmt(format_args!("Script [{}]\r\n", TEST_SCRIPT));
    eval_line(TEST_SCRIPT, env.engine, env.console);

    Ok(())
}

fn cmd_at(_argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    env.console.println("OK");

    Ok(())
}

fn cmd_stat(_argv: &[&str], env: &mut Env<'_>) -> Result<(), Error> {
    let snapshot = env.stats.snapshot();

    env.console.print_fmt(format_args!("{}", snapshot));
    env.console.print_fmt(format_args!(
        "[Session] {:?} transfer {} file {}\r\n",
        env.session.mode(),
        env.session.transfer.as_str(),
        env.session.filename
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Mode, Overlay};
    use crate::testlib::Rig;
    use std::string::String;
    use std::vec::Vec;

    fn run(rig: &mut Rig, line: &str) -> Result<(), Error> {
        execute(line, &mut rig.env())
    }

    #[test]
    fn names_are_unique() {
        let names: Vec<_> = command_names().collect();

        for (i, name) in names.iter().enumerate() {
            assert!(!names[i + 1..].contains(name), "{} twice", name);
        }
    }

    #[test]
    fn empty_and_unknown_lines() {
        let mut rig = Rig::new();

        assert_eq!(run(&mut rig, ""), Ok(()));
        assert_eq!(run(&mut rig, "   "), Ok(()));
        assert_eq!(run(&mut rig, "LS"), Err(Error::UnknownCommand));
        assert_eq!(run(&mut rig, "a b c d e f g h i"), Err(Error::InvalidArgument));
    }

    #[test]
    fn set_and_get() {
        let mut rig = Rig::new();

        assert_eq!(run(&mut rig, "set transfer raw"), Ok(()));
        assert_eq!(run(&mut rig, "set filename main.js"), Ok(()));
        assert_eq!(run(&mut rig, "get transfer"), Ok(()));
        assert_eq!(run(&mut rig, "get filename"), Ok(()));

        assert_eq!(rig.screen.text(), "raw\r\nmain.js\r\n");

        assert_eq!(run(&mut rig, "set transfer xmodem"), Err(Error::InvalidArgument));
        assert_eq!(run(&mut rig, "set filename"), Err(Error::MissingArgument));
        assert_eq!(
            run(&mut rig, "set filename a-name-that-is-too-long.js"),
            Err(Error::NameTooLong)
        );
        assert_eq!(rig.session.filename.as_str(), "main.js");
    }

    #[test]
    fn load_switches_mode() {
        let mut rig = Rig::new();

        assert_eq!(run(&mut rig, "load"), Ok(()));
        assert_eq!(rig.session.mode(), Mode::Upload);

        let mut rig = Rig::new();

        run(&mut rig, "set transfer raw").unwrap();
        assert_eq!(run(&mut rig, "load"), Ok(()));
        assert_eq!(rig.session.overlay, Some(Overlay::Capture));
        assert!(rig.session.capture().is_some());
        assert_eq!(rig.session.mode(), Mode::Shell);
    }

    #[test]
    fn file_commands() {
        let mut rig = Rig::new();

        rig.store("a.js", b"one\ntwo\n");
        rig.store("b.js", b"xyz");

        assert_eq!(run(&mut rig, "cat a.js"), Ok(()));
        assert_eq!(rig.screen.text(), "one\r\ntwo\r\n\r\n");
        rig.screen.clear_output();

        assert_eq!(run(&mut rig, "ls"), Ok(()));
        assert_eq!(rig.screen.text(), "     8 a.js\r\n     3 b.js\r\n");
        rig.screen.clear_output();

        assert_eq!(run(&mut rig, "du"), Ok(()));
        assert_eq!(rig.screen.text(), "11 bytes\r\n");
        rig.screen.clear_output();

        assert_eq!(run(&mut rig, "du b.js"), Ok(()));
        assert_eq!(rig.screen.text(), "3 bytes\r\n");

        assert_eq!(run(&mut rig, "rm a.js"), Ok(()));
        assert_eq!(run(&mut rig, "rm a.js"), Err(Error::NotFound));
        assert_eq!(run(&mut rig, "rm"), Err(Error::MissingArgument));
        assert_eq!(run(&mut rig, "cat a.js"), Err(Error::NotFound));
        assert_eq!(run(&mut rig, "ls a.js"), Err(Error::NotFound));
    }

    #[test]
    fn run_uses_session_file() {
        let mut rig = Rig::new();

        assert_eq!(run(&mut rig, "run"), Err(Error::NotFound));

        rig.store("test.js", b"print(1)");
        assert_eq!(run(&mut rig, "run"), Ok(()));
        assert_eq!(rig.engine.runs[0].0, String::from("test.js"));
    }

    #[test]
    fn misc_commands() {
        let mut rig = Rig::new();

        run(&mut rig, "at").unwrap();
        run(&mut rig, "test").unwrap();
        run(&mut rig, "eval").unwrap();

        assert!(rig.screen.text().starts_with("OK\r\nScript ["));
        assert_eq!(rig.engine.evals, [String::from(TEST_SCRIPT)]);
        assert_eq!(rig.session.overlay, Some(Overlay::Eval));

        rig.screen.clear_output();
        run(&mut rig, "help ls").unwrap();
        assert_eq!(rig.screen.text(), "ls: ls [name]  List files\r\n");
        assert_eq!(run(&mut rig, "help nope"), Err(Error::UnknownCommand));

        rig.screen.clear_output();
        run(&mut rig, "stat").unwrap();
        assert!(rig.screen.text().contains("[Mem] Live 0"));
        assert!(rig.screen.text().contains("[Session] Shell transfer ihex file test.js"));
    }
}

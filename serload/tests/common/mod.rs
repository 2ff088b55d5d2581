#![allow(dead_code)]

use serload::console::Console;
use serload::engine::Engine;
use serload::storage::{OpenMode, Storage};

#[derive(Default)]
pub struct Recorder {
    pub runs: Vec<(String, Vec<u8>)>,
}

impl Engine for Recorder {
    fn run(&mut self, name: &str, source: &[u8], _console: &mut dyn Console) {
        self.runs.push((name.to_string(), source.to_vec()));
    }

    fn eval(&mut self, source: &str, console: &mut dyn Console) {
        console.println(source);
    }

    fn take_error(&mut self) -> bool {
        false
    }
}

pub fn record(kind: u8, address: u16, data: &[u8]) -> String {
    let [hi, lo] = address.to_be_bytes();
    let mut bytes = vec![data.len() as u8, hi, lo, kind];
    bytes.extend_from_slice(data);

    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    bytes.push(sum.wrapping_neg());

    let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();

    format!(":{}\r\n", hex)
}

pub fn hex_file(body: &[u8]) -> String {
    let mut out: String = body
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| record(0x00, (i * 16) as u16, chunk))
        .collect();

    out.push_str(&record(0x01, 0, &[]));
    out
}

pub fn read_file(storage: &mut dyn Storage, name: &str) -> Option<Vec<u8>> {
    let handle = storage.open(name, OpenMode::Read)?;
    let mut buf = vec![0; storage.size(handle).ok()?];
    let read = storage.read(handle, &mut buf).ok()?;

    storage.close(handle);
    buf.truncate(read);

    Some(buf)
}

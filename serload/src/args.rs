//! Whitespace tokenizer for shell lines

/// Count the maximal non-space runs in the first `limit` bytes of `line`.
/// A NUL byte ends the line early.
pub fn argc(line: &str, limit: usize) -> usize {
    let bytes = line.as_bytes();
    let end = bytes.len().min(limit);
    let bytes = &bytes[..end];
    let bytes = match bytes.iter().position(|&b| b == 0) {
        Some(nul) => &bytes[..nul],
        None => bytes,
    };

    let mut count = 0;
    let mut in_token = false;

    for &byte in bytes {
        if byte == b' ' {
            in_token = false;
        } else if !in_token {
            in_token = true;
            count += 1;
        }
    }

    count
}

/// Split the next token off `line`. Returns the token and what follows it
/// with leading spaces removed; both are empty once `line` is exhausted.
pub fn next_arg(line: &str) -> (&str, &str) {
    let line = line.trim_start_matches(' ');

    match line.find(' ') {
        Some(end) => (&line[..end], line[end..].trim_start_matches(' ')),
        None => (line, ""),
    }
}

/// Iterator over the tokens of a line
pub struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }
}

impl<'a> Iterator for Args<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (token, rest) = next_arg(self.rest);
        self.rest = rest;

        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

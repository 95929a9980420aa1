use crate::core_error::FtpError;

/// One complete control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Command(String),
    /// Not valid UTF-8. Answered with 501 rather than rewritten.
    Invalid,
}

/// Splits control-connection bytes into command lines.
///
/// Lines end with LF, an optional CR before it is dropped, and blank lines are
/// skipped. Bytes after the last LF stay buffered until the next read.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_line: usize,
}

impl LineFramer {
    pub fn new(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line,
        }
    }

    /// Feeds freshly read bytes and returns the lines they completed.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, FtpError> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.pending.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            match String::from_utf8(raw) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        lines.push(Frame::Command(line.to_string()));
                    }
                }
                Err(_) => lines.push(Frame::Invalid),
            }
        }

        if self.pending.len() > self.max_line {
            return Err(FtpError::Syntax(format!(
                "control line exceeds {} bytes",
                self.max_line
            )));
        }
        Ok(lines)
    }
}

use std::fmt;

/// One control-connection reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    text: String,
    closes_session: bool,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            closes_session: false,
        }
    }

    /// A reply after which the control connection is closed (QUIT).
    pub fn closing(code: u16, text: impl Into<String>) -> Self {
        Self {
            closes_session: true,
            ..Self::new(code, text)
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn closes_session(&self) -> bool {
        self.closes_session
    }

    /// CRLF-terminated bytes for the wire.
    pub fn to_wire(&self) -> Vec<u8> {
        format!("{}\r\n", self).into_bytes()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

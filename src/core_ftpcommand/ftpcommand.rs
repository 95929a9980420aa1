use crate::core_error::FtpError;

#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    PASV,
    LIST,
    RETR,
    STOR,
    QUIT,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "PASV" => Some(FtpCommand::PASV),
            "LIST" => Some(FtpCommand::LIST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "QUIT" => Some(FtpCommand::QUIT),
            _ => None,
        }
    }
}

/// A control line split into verb and whitespace-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: FtpCommand,
    pub args: Vec<String>,
}

impl ParsedCommand {
    pub fn parse(line: &str) -> Result<Self, FtpError> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| FtpError::UnknownCommand(String::new()))?;
        let command =
            FtpCommand::from_str(verb).ok_or_else(|| FtpError::UnknownCommand(verb.to_string()))?;
        Ok(Self {
            command,
            args: tokens.map(str::to_string).collect(),
        })
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// The single argument RETR/STOR require.
    pub fn required_arg(&self) -> Result<&str, FtpError> {
        self.first_arg()
            .ok_or_else(|| FtpError::Syntax(format!("{:?} requires an argument", self.command)))
    }
}

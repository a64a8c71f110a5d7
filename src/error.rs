#[derive(Debug)]
pub enum Error {
    StdIo(std::io::Error),
    InvalidFen { fen_str: String, reason: String },
    IllegalMove { fen_str: String, mv: String },
    Engine(String),
    EmptyPrincipalVariation { fen_str: String },
    InvalidEngineOption(String),
    TruncatedEntry(usize),
    Logger,
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        match self {
            Error::StdIo(e) => {
                fmt.write_str(&format!(
                    "An error occured while operating on a file: {}",
                    e
                ))?;
            }
            Error::InvalidFen { fen_str, reason } => {
                fmt.write_str(&format!("Position '{}' is invalid: {}", fen_str, reason))?;
            }
            Error::IllegalMove { fen_str, mv } => {
                fmt.write_str(&format!(
                    "Move '{}' is illegal in position '{}'",
                    mv, fen_str
                ))?;
            }
            Error::Engine(msg) => {
                fmt.write_str(&format!(
                    "An error occured while talking to the engine: {}",
                    msg
                ))?;
            }
            Error::EmptyPrincipalVariation { fen_str } => {
                fmt.write_str(&format!(
                    "Engine returned no move for position '{}'",
                    fen_str
                ))?;
            }
            Error::InvalidEngineOption(option) => {
                fmt.write_str(&format!(
                    "Engine option '{}' must look like NAME=VALUE",
                    option
                ))?;
            }
            Error::TruncatedEntry(len) => {
                fmt.write_str(&format!(
                    "Book entry needs 16 bytes, only {} available",
                    len
                ))?;
            }
            Error::Logger => {
                fmt.write_str("Logger could not be installed")?;
            }
        }
        Ok(())
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::StdIo(error)
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(_: log::SetLoggerError) -> Self {
        Error::Logger
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StdIo(e) => Some(e),
            _ => None,
        }
    }
}

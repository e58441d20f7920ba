//! Error types for the `bus` crate.

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The bus server could not be reached.
    Connect,
    /// A topic subject could not be subscribed to.
    Subscribe,
    /// A message could not be handed to the bus.
    Publish,
    /// A payload could not be turned into an envelope.
    Encode,
}

impl Error {
    pub(crate) fn new<E>(error_kind: ErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            source: Some(Box::new(source)),
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bus Error: {:?}", self.error_kind)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<events::Error> for Error {
    fn from(err: events::Error) -> Self {
        Error::new(ErrorKind::Encode, err)
    }
}

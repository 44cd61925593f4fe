use std::fmt::Display;

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// A wait on the page elapsed before the awaited element showed up
    Timeout { what: String },

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::Timeout { what } => miette!("Timed out waiting for {what}"),
            Error::Miette(err) => err,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Timeout { what } => write!(f, "Timed out waiting for {what}"),
            Error::Miette(report) => write!(f, "{report}"),
        }
    }
}

impl Error {
    pub fn timeout(what: impl Into<String>) -> Self {
        Error::Timeout { what: what.into() }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Return early with an unexpected error built from the message
pub fn bail<T>(msg: impl Display + std::fmt::Debug + Send + Sync + 'static) -> Result<T> {
    Err(Error::Miette(miette::Report::msg(msg)))
}

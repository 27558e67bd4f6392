use std::{fmt, io};
use std::panic::Location;
use std::convert::Infallible;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The operation class an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigRead,
    ConfigParse,
    SchemaValidation,
    RemoteFetch,
    TemplateNotFound,
    Render,
    OutputWrite,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConfigRead => "config read error",
            ErrorKind::ConfigParse => "config parse error",
            ErrorKind::SchemaValidation => "schema validation error",
            ErrorKind::RemoteFetch => "remote fetch error",
            ErrorKind::TemplateNotFound => "template not found",
            ErrorKind::Render => "render error",
            ErrorKind::OutputWrite => "output write error",
            ErrorKind::Other => "error",
        };

        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Error {
    kind: Option<ErrorKind>,
    detail: Vec<Box<dyn ErrorDetail>>,
    prev: Option<Box<Error>>,
    _location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    /// Tags `self` with `kind`, replacing any previous tag.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The first kind found walking from `self` down the chain.
    pub fn kind(&self) -> ErrorKind {
        let mut error = Some(self);
        while let Some(e) = error {
            if let Some(kind) = e.kind {
                return kind;
            }

            error = e.prev.as_deref();
        }

        ErrorKind::Other
    }

    /// Returns `true` if any error in the chain mentions `needle` in its
    /// message or context.
    pub fn mentions(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }

    pub fn chain(self, mut other: Error) -> Self {
        #[inline]
        fn _chain(error: Error, behind: &mut Error) {
            if let Some(prev) = behind.prev.as_mut() {
                _chain(error, prev);
            } else {
                behind.prev = Some(Box::new(error));
            }
        }

        _chain(self, &mut other);
        other
    }
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut ctxt = vec![];
        let mut error = self.source();
        while let Some(e) = error {
            ctxt.push((None, e.to_string()));
            error = e.source();
        }

        ctxt
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($T:ty) => {
        impl $crate::error::ErrorDetail for $T {
            fn context(&self) -> Vec<(Option<String>, String)> {
                let error: &(dyn std::error::Error + Send + Sync) = self;
                error.context()
            }
        }
    }
}

impl_error_detail_with_std_error!(io::Error);
impl_error_detail_with_std_error!(serde_yaml_ng::Error);
impl_error_detail_with_std_error!(serde_json::Error);
impl_error_detail_with_std_error!(reqwest::Error);

impl ErrorDetail for String { }
impl ErrorDetail for &str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            kind: None,
            prev: None,
            detail: vec![Box::new(detail)],
            _location: std::panic::Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Copy, Clone)] struct Indent(usize);

        impl fmt::Display for Indent {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for _ in 0..(self.0 * 4) { write!(f, " ")? }
                Ok(())
            }
        }

        struct NestedError<'a>(Indent, &'a Error);

        impl fmt::Display for NestedError<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let NestedError(indent, e) = self;

                for detail in &e.detail {
                    let indent_line = format!("\n{indent}");

                    match e.kind {
                        Some(kind) => writeln!(f, "{indent}[{kind}] {}",
                            format!("{:#}", detail).replace('\n', &indent_line))?,
                        None => writeln!(f, "{indent}{}",
                            format!("{:#}", detail).replace('\n', &indent_line))?,
                    }

                    if let Some(prev) = &e.prev {
                        NestedError(Indent(indent.0 + 1), prev).fmt(f)?;
                    }

                    for (key, value) in detail.context() {
                        let value = value.to_string().replace('\n', &indent_line);
                        if let Some(key) = key {
                            writeln!(f, "{indent}{key}: {value}")?;
                        } else {
                            writeln!(f, "{indent}{value}")?;
                        }
                    }

                    if std::env::var_os("RUST_BACKTRACE").is_some() {
                        writeln!(f, "{indent}[{}]", e._location)?;
                    }
                }

                Ok(())
            }
        }

        NestedError(Indent(0), self).fmt(f)
    }
}

#[derive(Debug)]
pub struct MakeshiftError {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl From<&dyn ErrorDetail> for MakeshiftError {
    #[inline]
    fn from(detail: &dyn ErrorDetail) -> Self {
        MakeshiftError {
            message: detail.to_string(),
            parameters: detail.context()
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error) from a message and a list of
/// context parameters. A leading `[Kind]` tags the error with an
/// [`ErrorKind`](crate::error::ErrorKind):
///
/// ```rust
/// use portfolio::error::ErrorKind;
///
/// let e = portfolio::error!([TemplateNotFound] "missing template", "page" => "index");
/// assert_eq!(e.kind(), ErrorKind::TemplateNotFound);
/// assert!(e.to_string().contains("page: index"));
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ([$kind:ident] $($rest:tt)*) => (
        $crate::error!($($rest)*).with_kind($crate::error::ErrorKind::$kind)
    );

    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::MakeshiftError {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

impl fmt::Display for MakeshiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for MakeshiftError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().chain(other.into()))
        }
    }

    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
     {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().chain(f().into()))
        }
    }
}

impl ErrorDetail for Infallible {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_found_along_chain() {
        let inner = error!([ConfigRead] "failed to read config", "path" => "config.yml");
        let outer = Err::<(), _>(inner).chain(error!("loading failed")).unwrap_err();
        assert_eq!(outer.kind(), ErrorKind::ConfigRead);

        let retagged = outer.with_kind(ErrorKind::Render);
        assert_eq!(retagged.kind(), ErrorKind::Render);
    }

    #[test]
    fn untagged_error_is_other() {
        let e: Error = "plain".into();
        assert_eq!(e.kind(), ErrorKind::Other);
    }

    #[test]
    fn display_includes_context_and_previous() {
        let inner = error!("inner cause", "detail" => 42);
        let outer = Err::<(), _>(inner)
            .chain_with(|| error!([Render] "failed to render page", "page" => "index"))
            .unwrap_err();

        let text = outer.to_string();
        assert!(text.starts_with("[render error] failed to render page"));
        assert!(text.contains("    inner cause"));
        assert!(text.contains("detail: 42"));
        assert!(text.contains("page: index"));
    }
}

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// Errors produced while decoding a Chocks Away model bank or emitting OBJ output.
#[derive(Debug)]
pub enum ChocError {
    Io(io::Error),
    /// Out-of-range count/distance, bad vertex index, bad primitive style,
    /// non-monotonic index address, or a bad side count after validation.
    Format(String),
    /// Vertex or primitive allocation limits exceeded.
    Resource(String),
    /// Mutually exclusive flags, or an output file requested in list/summary mode.
    Policy(String),
}

impl Error for ChocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChocError::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ChocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChocError::Io(error) => write!(f, "IO error: {}", error),
            ChocError::Format(msg) => write!(f, "format error: {}", msg),
            ChocError::Resource(msg) => write!(f, "resource error: {}", msg),
            ChocError::Policy(msg) => write!(f, "policy error: {}", msg),
        }
    }
}

impl From<io::Error> for ChocError {
    fn from(error: io::Error) -> Self {
        ChocError::Io(error)
    }
}

pub type ChocResult<T> = Result<T, ChocError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_io() {
        let e = ChocError::Io(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert_eq!(format!("{}", e), "IO error: missing");
    }

    #[test]
    fn test_display_format() {
        let e = ChocError::Format("nvertices out of range".to_string());
        assert_eq!(format!("{}", e), "format error: nvertices out of range");
    }

    #[test]
    fn test_display_resource() {
        let e = ChocError::Resource("too many primitives".to_string());
        assert_eq!(format!("{}", e), "resource error: too many primitives");
    }

    #[test]
    fn test_display_policy() {
        let e = ChocError::Policy("cannot use -fans with -strips".to_string());
        assert_eq!(
            format!("{}", e),
            "policy error: cannot use -fans with -strips"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let e: ChocError = io_err.into();
        assert!(matches!(e, ChocError::Io(_)));
    }
}

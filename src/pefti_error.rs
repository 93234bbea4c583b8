use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeftiErrorKind {
    Config,
    Transport,
    Parse,
    Io,
    Notify,
}

impl Display for PeftiErrorKind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let name = match self {
            PeftiErrorKind::Config => "Config",
            PeftiErrorKind::Transport => "Transport",
            PeftiErrorKind::Parse => "Parse",
            PeftiErrorKind::Io => "Io",
            PeftiErrorKind::Notify => "Notify",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug)]
pub struct PeftiError {
    pub kind: PeftiErrorKind,
    pub message: String,
}

impl PeftiError {
    pub fn new(kind: PeftiErrorKind, message: String) -> PeftiError {
        PeftiError { kind, message }
    }
}

impl Display for PeftiError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for PeftiError {}

impl From<std::io::Error> for PeftiError {
    fn from(err: std::io::Error) -> Self {
        PeftiError::new(PeftiErrorKind::Io, err.to_string())
    }
}

impl From<reqwest::Error> for PeftiError {
    fn from(err: reqwest::Error) -> Self {
        PeftiError::new(PeftiErrorKind::Transport, err.to_string())
    }
}

impl From<serde_yaml::Error> for PeftiError {
    fn from(err: serde_yaml::Error) -> Self {
        PeftiError::new(PeftiErrorKind::Config, err.to_string())
    }
}

impl From<quick_xml::Error> for PeftiError {
    fn from(err: quick_xml::Error) -> Self {
        PeftiError::new(PeftiErrorKind::Parse, err.to_string())
    }
}

#[macro_export]
macro_rules! create_pefti_error {
    ($kind:expr, $($arg:tt)*) => {
        $crate::pefti_error::PeftiError::new($kind, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! create_pefti_error_result {
    ($kind:expr, $($arg:tt)*) => {
        Err(create_pefti_error!($kind, $($arg)*))
    };
}

#[macro_export]
macro_rules! notify_err {
    ($($arg:tt)*) => {
        $crate::pefti_error::PeftiError::new($crate::pefti_error::PeftiErrorKind::Notify, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! exit {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        std::process::exit(1);
    }};
}

pub use create_pefti_error;
pub use create_pefti_error_result;
pub use notify_err;
pub use exit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts_to_io_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: PeftiError = io_err.into();
        assert_eq!(err.kind, PeftiErrorKind::Io);
        assert!(err.message.contains("missing file"));
    }

    #[test]
    fn reqwest_error_converts_to_transport_kind() {
        let reqwest_err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err: PeftiError = reqwest_err.into();
        assert_eq!(err.kind, PeftiErrorKind::Transport);
    }

    #[test]
    fn serde_yaml_error_converts_to_config_kind() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        let err: PeftiError = yaml_err.into();
        assert_eq!(err.kind, PeftiErrorKind::Config);
    }

    #[test]
    fn quick_xml_error_converts_to_parse_kind() {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_str("<a></b>");
        let mut buf = Vec::new();
        let mut parse_err = None;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Err(e) => {
                    parse_err = Some(e);
                    break;
                }
                _ => {}
            }
            buf.clear();
        }
        let err: PeftiError = parse_err.expect("mismatched tags should error").into();
        assert_eq!(err.kind, PeftiErrorKind::Parse);
    }

    #[test]
    fn display_combines_kind_and_message() {
        let err = PeftiError::new(PeftiErrorKind::Notify, "something happened".to_string());
        assert_eq!(err.to_string(), "Notify: something happened");
    }

    #[test]
    fn create_pefti_error_macro_builds_expected_error() {
        let err = create_pefti_error!(PeftiErrorKind::Config, "bad key {}", "resources.playlists");
        assert_eq!(err.kind, PeftiErrorKind::Config);
        assert_eq!(err.message, "bad key resources.playlists");
    }

    #[test]
    fn create_pefti_error_result_macro_builds_err_variant() {
        let result: Result<(), PeftiError> = create_pefti_error_result!(PeftiErrorKind::Io, "cannot write {}", "out.m3u");
        let err = result.unwrap_err();
        assert_eq!(err.kind, PeftiErrorKind::Io);
        assert_eq!(err.message, "cannot write out.m3u");
    }

    #[test]
    fn notify_err_macro_builds_notify_kind() {
        let err = notify_err!("heads up: {}", 42);
        assert_eq!(err.kind, PeftiErrorKind::Notify);
        assert_eq!(err.message, "heads up: 42");
    }
}

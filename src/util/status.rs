use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    Ok,
    NotFound,
    Corruption,
    NotSupported,
    InvalidArgument,
    IOError,
}

#[derive(Debug, Clone)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Status {
            code: Code::Ok,
            message: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Status {
            code: Code::NotFound,
            message: Some(msg.into()),
        }
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status {
            code: Code::Corruption,
            message: Some(msg.into()),
        }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Status {
            code: Code::NotSupported,
            message: Some(msg.into()),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status {
            code: Code::InvalidArgument,
            message: Some(msg.into()),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status {
            code: Code::IOError,
            message: Some(msg.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn is_not_supported(&self) -> bool {
        self.code == Code::NotSupported
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == Code::InvalidArgument
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ok() {
        let status = Status::ok();
        assert!(status.is_ok());
        assert_eq!(status.code(), &Code::Ok);
    }

    #[test]
    fn test_status_corruption() {
        let status = Status::corruption("checksum mismatch");
        assert!(status.is_corruption());
        assert!(!status.is_io_error());
        assert_eq!(status.message(), Some("checksum mismatch"));
    }

    #[test]
    fn test_status_display() {
        let status = Status::io_error("disk full");
        assert_eq!(status.to_string(), "IOError: disk full");
    }

    #[test]
    fn test_status_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let status: Status = err.into();
        assert!(status.is_io_error());
    }

    #[test]
    fn test_status_from_json_error() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let status: Status = err.into();
        assert!(status.is_invalid_argument());
    }
}

use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookErrorCode {
    InvalidArgument,
    Deserialize,
}

impl HookErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookErrorCode::InvalidArgument => "hooks/invalid-argument",
            HookErrorCode::Deserialize => "hooks/deserialize",
        }
    }
}

#[derive(Clone, Debug)]
pub struct HookError {
    pub code: HookErrorCode,
    message: String,
}

impl HookError {
    pub fn new(code: HookErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for HookError {}

pub type HookResult<T> = Result<T, HookError>;

pub fn invalid_argument(message: impl Into<String>) -> HookError {
    HookError::new(HookErrorCode::InvalidArgument, message)
}

pub fn deserialize_error(message: impl Into<String>) -> HookError {
    HookError::new(HookErrorCode::Deserialize, message)
}

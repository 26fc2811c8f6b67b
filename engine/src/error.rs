//! Error types for the CWP engine.

use thiserror::Error;

/// FileMaker error codes that count as success.
pub const SUCCESS_CODES: [i32; 2] = [0, 200];

/// Code reported when a find matched nothing.
pub const NO_RECORDS_MATCH: i32 = 401;

/// Code reported when a record id does not exist.
pub const RECORD_MISSING: i32 = 101;

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The response is not a well-formed fmresultset document.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// FileMaker reported a non-success error code.
    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    /// The query cannot be rendered as a CWP request.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl Error {
    /// Build a server error for `code` with its known message.
    pub fn server(code: i32) -> Self {
        Error::Server {
            code,
            message: error_message(code).to_string(),
        }
    }

    /// The FileMaker error code, if this is a server error.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Server { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when a find matched no records.
    pub fn is_no_records_match(&self) -> bool {
        self.code() == Some(NO_RECORDS_MATCH)
    }

    /// True when the targeted record id does not exist.
    pub fn is_record_missing(&self) -> bool {
        self.code() == Some(RECORD_MISSING)
    }
}

/// True if `code` is one of the codes FileMaker uses for success.
pub fn is_success(code: i32) -> bool {
    SUCCESS_CODES.contains(&code)
}

/// Human readable message for a FileMaker error code.
pub fn error_message(code: i32) -> &'static str {
    match code {
        -1 => "Unknown error",
        0 => "No error",
        1 => "User canceled action",
        3 => "Command is unavailable",
        4 => "Command is unknown",
        5 => "Command is invalid",
        8 => "Empty result",
        9 => "Insufficient privileges",
        100 => "File is missing",
        101 => "Record is missing",
        102 => "Field is missing",
        103 => "Relationship is missing",
        104 => "Script is missing",
        105 => "Layout is missing",
        106 => "Table is missing",
        200 => "Record access is denied",
        201 => "Field cannot be modified",
        212 => "Invalid user account and/or password",
        301 => "Record is in use by another user",
        306 => "Record modification ID does not match",
        400 => "Find criteria are empty",
        401 => "No records match the request",
        402 => "Selected field is not a match field for a lookup",
        500 => "Date value does not meet validation entry options",
        501 => "Time value does not meet validation entry options",
        502 => "Number value does not meet validation entry options",
        504 => "Value in field is not unique as required",
        507 => "Value in field failed calculation test of validation entry option",
        509 => "Field requires a valid value",
        802 => "Unable to open file",
        958 => "Parameter missing",
        959 => "Custom Web Publishing technology is disabled",
        960 => "Parameter is invalid",
        _ => "Error from FileMaker server",
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

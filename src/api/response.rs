use serde::{Deserialize, Serialize};

/// Error envelope. Empty `param` and `value` are left out of the JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrResp {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub param: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub error: String,
}

impl ErrResp {
    pub fn new(param: impl Into<String>, value: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            value: value.into(),
            error: error.into(),
        }
    }

    pub fn bare(error: impl Into<String>) -> Self {
        Self::new("", "", error)
    }
}

/// Message-only envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MsgResp {
    pub message: String,
}

impl MsgResp {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

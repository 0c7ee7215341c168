//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. Telecommands are instructions sent to the exec by an operator
//! station or a timestamped script.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod retarget;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// Internal
use self::retarget::RetargetCmd;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static TYPE_HAS_NO_PAYLOAD: [&str; 3] = ["HEARTBEAT", "SAFE", "UNSAFE"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the exec by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Tc {
    /// Connection liveness check, no action taken.
    Heartbeat,

    /// Put the exec into safe mode, holding all arm motion.
    MakeSafe,

    /// Attempt to leave safe mode.
    MakeUnsafe,

    /// A command for the retargeting manager.
    Retarget(RetargetCmd),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0} is expected to have a payload but it doesn't")]
    MissingPayload(String),

    #[error("TC payload could not be read: {0}")]
    InvalidPayload(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet.
    ///
    /// Packets are objects of the form `{"type": "...", "payload": ...}`,
    /// where the payload is absent for types which don't carry one.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(TcParseError::InvalidJson(e)),
        };

        // Get the type of the TC
        let tc_type = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };

        // Get the payload. If it's null and the type does not have a payload
        // then an error is returned
        if val["payload"].is_null() && !TYPE_HAS_NO_PAYLOAD.contains(&tc_type) {
            return Err(TcParseError::MissingPayload(tc_type.to_string()));
        }

        match tc_type {
            "HEARTBEAT" => Ok(Tc::Heartbeat),
            "SAFE" => Ok(Tc::MakeSafe),
            "UNSAFE" => Ok(Tc::MakeUnsafe),
            "RTGT" => {
                let cmd: RetargetCmd = match serde_json::from_value(val["payload"].clone()) {
                    Ok(c) => c,
                    Err(e) => return Err(TcParseError::InvalidPayload(e)),
                };
                Ok(Tc::Retarget(cmd))
            }
            t => Err(TcParseError::InvalidType(format!(
                "{} is not a recognised TC type",
                t
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::retarget::ControlMode;
    use super::*;

    #[test]
    fn test_tc_from_json() {
        assert!(matches!(
            Tc::from_json(r#"{"type": "SAFE"}"#),
            Ok(Tc::MakeSafe)
        ));

        assert!(matches!(
            Tc::from_json(r#"{"type": "RTGT", "payload": {"SetMode": {"mode": "Ik"}}}"#),
            Ok(Tc::Retarget(RetargetCmd::SetMode {
                mode: ControlMode::Ik
            }))
        ));

        // Payload-carrying type without a payload must be rejected
        assert!(matches!(
            Tc::from_json(r#"{"type": "RTGT"}"#),
            Err(TcParseError::MissingPayload(_))
        ));

        assert!(Tc::from_json(r#"{"type": "NOPE"}"#).is_err());
        assert!(Tc::from_json("not json at all").is_err());
    }
}

//! APDU command and response framing for the chain app on Ledger devices.

use crate::hardware::DeviceError;
use tracing::debug;

/// Class byte used by the chain app.
pub const CLA_CHAIN_APP: u8 = 0xD4;

/// `p1` for a public-key request without on-screen confirmation.
pub const P1_NO_CONFIRM: u8 = 0x00;
/// `p1` for a public-key request the user must confirm on the device.
pub const P1_CONFIRM: u8 = 0x01;
/// `p1` of the first chunk of a signing payload.
pub const P1_FIRST_CHUNK: u8 = 0x00;
/// `p1` of every subsequent chunk.
pub const P1_MORE_CHUNK: u8 = 0x80;

/// Instructions understood by the chain app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduInstruction {
    GetPublicKey = 0x02,
    SignTransaction = 0x04,
    GetAppConfiguration = 0x06,
}

/// A single command sent to the device.
#[derive(Debug, Clone)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    pub fn new(ins: ApduInstruction, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self { cla: CLA_CHAIN_APP, ins: ins as u8, p1, p2, data }
    }

    /// Serialize as `cla ins p1 p2 lc data`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(5 + self.data.len());
        bytes.push(self.cla);
        bytes.push(self.ins);
        bytes.push(self.p1);
        bytes.push(self.p2);
        bytes.push(self.data.len() as u8);
        bytes.extend_from_slice(&self.data);

        debug!(
            "APDU command: CLA={:02X} INS={:02X} P1={:02X} P2={:02X} Lc={}",
            self.cla,
            self.ins,
            self.p1,
            self.p2,
            self.data.len()
        );

        bytes
    }
}

/// A response received from the device: payload plus a trailing two-byte
/// status word.
#[derive(Debug, Clone)]
pub struct ApduResponse {
    pub data: Vec<u8>,
    pub sw1: u8,
    pub sw2: u8,
}

impl ApduResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeviceError> {
        if bytes.len() < 2 {
            return Err(DeviceError::Malformed("APDU response shorter than a status word".to_string()));
        }

        let len = bytes.len();
        let sw1 = bytes[len - 2];
        let sw2 = bytes[len - 1];
        let data = bytes[..len - 2].to_vec();

        debug!("APDU response: SW1={:02X} SW2={:02X} DataLen={}", sw1, sw2, data.len());

        Ok(Self { data, sw1, sw2 })
    }

    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    pub fn status_code(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    pub fn error_description(&self) -> String {
        match (self.sw1, self.sw2) {
            (0x90, 0x00) => "success".to_string(),
            (0x69, 0x82) => "security status not satisfied (device locked?)".to_string(),
            (0x69, 0x85) => "conditions of use not satisfied (request denied on device?)".to_string(),
            (0x6A, 0x80) => "incorrect data".to_string(),
            (0x6A, 0x82) => "file not found".to_string(),
            (0x6D, 0x00) => "instruction not supported (wrong app open?)".to_string(),
            (0x6E, 0x00) => "class not supported".to_string(),
            (0x67, 0x00) => "incorrect length".to_string(),
            (0x6B, 0x00) => "incorrect parameters".to_string(),
            (0x6F, 0x00) => "unknown error".to_string(),
            _ => format!("unknown status: {:04X}", self.status_code()),
        }
    }

    /// Turn a non-success status word into a typed error.
    pub fn into_result(self) -> Result<Vec<u8>, DeviceError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(DeviceError::Status {
                status: self.status_code(),
                description: self.error_description(),
            })
        }
    }
}

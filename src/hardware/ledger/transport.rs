//! HID transport to a Ledger device.

use super::apdu::{ApduCommand, ApduResponse};
use crate::hardware::DeviceError;
use hidapi::{HidApi, HidDevice};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ledger USB vendor id.
pub const LEDGER_VENDOR_ID: u16 = 0x2C97;
/// Usage page of the APDU interface.
pub const LEDGER_USAGE_PAGE: u16 = 0xFFA0;

/// HID report payload size.
const HID_PACKET_SIZE: usize = 64;

/// APDU channel identifier.
const CHANNEL: u16 = 0x0101;

/// Tag marking APDU frames.
const TAG_APDU: u8 = 0x05;

/// Reassembly gives up after this many packets.
const MAX_RESPONSE_PACKETS: u16 = 100;

/// Open HID connection to the first Ledger device found.
pub struct LedgerTransport {
    device: HidDevice,
    timeout: Duration,
}

impl LedgerTransport {
    /// Open the first connected Ledger device exposing the APDU interface.
    pub fn open() -> Result<Self, DeviceError> {
        info!("Opening Ledger device...");

        let api = HidApi::new()
            .map_err(|e| DeviceError::Transport(format!("HID API initialization failed: {}", e)))?;

        let devices: Vec<_> = api
            .device_list()
            .filter(|d| d.vendor_id() == LEDGER_VENDOR_ID)
            .filter(|d| d.usage_page() == LEDGER_USAGE_PAGE)
            .collect();

        if devices.is_empty() {
            return Err(DeviceError::NotFound);
        }

        let device_info = devices[0];
        let device = device_info
            .open_device(&api)
            .map_err(|e| DeviceError::Transport(format!("failed to open device: {}", e)))?;

        if let Some(product) = device_info.product_string() {
            info!("Connected to Ledger device: {}", product);
        } else {
            info!("Connected to Ledger device");
        }

        Ok(Self { device, timeout: Duration::from_secs(30) })
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Send one APDU command and read its response. The device handles a
    /// single exchange at a time.
    pub fn exchange(&self, command: &ApduCommand) -> Result<ApduResponse, DeviceError> {
        let apdu_bytes = command.to_bytes();
        let packets = build_hid_packets(&apdu_bytes);

        for (i, packet) in packets.iter().enumerate() {
            debug!("sending packet {}/{}", i + 1, packets.len());
            self.device
                .write(packet)
                .map_err(|e| DeviceError::Transport(format!("HID write failed: {}", e)))?;
        }

        let response_bytes = self.receive_response()?;
        let response = ApduResponse::from_bytes(&response_bytes)?;

        if !response.is_success() {
            warn!(
                "APDU command failed: {:04X} - {}",
                response.status_code(),
                response.error_description()
            );
        }

        Ok(response)
    }

    fn receive_response(&self) -> Result<Vec<u8>, DeviceError> {
        let mut response_data = Vec::new();
        let mut sequence = 0u16;
        let mut total_len: Option<usize> = None;

        loop {
            let mut packet = vec![0u8; HID_PACKET_SIZE + 1];

            let read_len = self
                .device
                .read_timeout(&mut packet, self.timeout.as_millis() as i32)
                .map_err(|e| DeviceError::Transport(format!("HID read failed: {}", e)))?;

            if read_len == 0 {
                return Err(DeviceError::Timeout);
            }

            match parse_response_packet(&packet[..read_len], sequence)? {
                None => continue, // frame for another channel/tag
                Some((packet_total, chunk)) => {
                    if sequence == 0 {
                        total_len = packet_total;
                    }
                    response_data.extend_from_slice(chunk);
                }
            }

            if let Some(len) = total_len {
                if response_data.len() >= len {
                    response_data.truncate(len);
                    break;
                }
            }

            sequence += 1;
            if sequence > MAX_RESPONSE_PACKETS {
                return Err(DeviceError::Malformed("response packet flood".to_string()));
            }
        }

        Ok(response_data)
    }
}

/// Split an APDU into HID report frames: every frame carries the channel,
/// the APDU tag and a big-endian sequence number; the first frame also
/// carries the total APDU length.
fn build_hid_packets(apdu: &[u8]) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    let total_len = apdu.len();
    let mut offset = 0;
    let mut sequence = 0u16;

    while offset < total_len {
        let mut packet = vec![0u8; HID_PACKET_SIZE + 1]; // +1 for report id
        packet[0] = 0x00;

        packet[1] = (CHANNEL >> 8) as u8;
        packet[2] = (CHANNEL & 0xFF) as u8;
        packet[3] = TAG_APDU;
        packet[4] = (sequence >> 8) as u8;
        packet[5] = (sequence & 0xFF) as u8;

        let data_start = if sequence == 0 {
            packet[6] = (total_len >> 8) as u8;
            packet[7] = (total_len & 0xFF) as u8;
            8
        } else {
            6
        };

        let chunk_size = (HID_PACKET_SIZE + 1 - data_start).min(total_len - offset);
        packet[data_start..data_start + chunk_size].copy_from_slice(&apdu[offset..offset + chunk_size]);
        offset += chunk_size;

        packets.push(packet);
        sequence += 1;
    }

    packets
}

/// Validate one received frame. Returns `None` for frames addressed to a
/// different channel or tag (skipped), otherwise the total length carried
/// by the first frame and the payload chunk.
fn parse_response_packet(
    packet: &[u8],
    expected_seq: u16,
) -> Result<Option<(Option<usize>, &[u8])>, DeviceError> {
    if packet.len() < 6 {
        return Err(DeviceError::Malformed("response frame too short".to_string()));
    }

    let channel = ((packet[1] as u16) << 8) | (packet[2] as u16);
    if channel != CHANNEL || packet[3] != TAG_APDU {
        return Ok(None);
    }

    let sequence = ((packet[4] as u16) << 8) | (packet[5] as u16);
    if sequence != expected_seq {
        return Err(DeviceError::Malformed(format!(
            "sequence mismatch: expected {}, got {}",
            expected_seq, sequence
        )));
    }

    if expected_seq == 0 {
        if packet.len() < 8 {
            return Err(DeviceError::Malformed("first response frame too short".to_string()));
        }
        let total = ((packet[6] as usize) << 8) | (packet[7] as usize);
        Ok(Some((Some(total), &packet[8..])))
    } else {
        Ok(Some((None, &packet[6..])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::apdu::{ApduCommand, ApduInstruction, P1_NO_CONFIRM};

    #[test]
    fn short_apdu_fits_one_packet() {
        let apdu = ApduCommand::new(ApduInstruction::GetAppConfiguration, P1_NO_CONFIRM, 0, vec![]).to_bytes();
        let packets = build_hid_packets(&apdu);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].len(), HID_PACKET_SIZE + 1);
        assert_eq!(packets[0][0], 0x00); // report id
        assert_eq!(packets[0][1], 0x01); // channel hi
        assert_eq!(packets[0][2], 0x01); // channel lo
        assert_eq!(packets[0][3], TAG_APDU);
        let total = ((packets[0][6] as usize) << 8) | (packets[0][7] as usize);
        assert_eq!(total, apdu.len());
    }

    #[test]
    fn large_apdu_splits_with_incrementing_sequence() {
        let apdu = vec![0xAAu8; 200];
        let packets = build_hid_packets(&apdu);

        assert!(packets.len() > 1);
        for (i, packet) in packets.iter().enumerate() {
            let seq = ((packet[4] as u16) << 8) | (packet[5] as u16);
            assert_eq!(seq, i as u16);
        }

        // Reassemble and compare; frames use the same layout in both
        // directions.
        let mut collected = Vec::new();
        for (i, packet) in packets.iter().enumerate() {
            let parsed = parse_response_packet(packet, i as u16).unwrap().unwrap();
            collected.extend_from_slice(parsed.1);
        }
        collected.truncate(apdu.len());
        assert_eq!(collected, apdu);
    }

    #[test]
    fn foreign_channel_frames_are_skipped() {
        let mut frame = vec![0u8; HID_PACKET_SIZE + 1];
        frame[1] = 0x02; // wrong channel
        frame[2] = 0x02;
        frame[3] = TAG_APDU;
        assert!(parse_response_packet(&frame, 0).unwrap().is_none());
    }

    #[test]
    fn sequence_mismatch_is_an_error() {
        let mut frame = vec![0u8; HID_PACKET_SIZE + 1];
        frame[1] = 0x01;
        frame[2] = 0x01;
        frame[3] = TAG_APDU;
        frame[5] = 0x05; // sequence 5, expected 0
        assert!(parse_response_packet(&frame, 0).is_err());
    }
}

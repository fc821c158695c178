//! Inbound MIDI message model
//!
//! Turns raw channel-voice bytes received on a named port into the flat
//! `(port, status, channel, control, value)` shape the link engine works with.

use std::fmt;

/// Note Off status nibble
pub const NOTE_OFF: u8 = 0x80;
/// Note On status nibble
pub const NOTE_ON: u8 = 0x90;
/// Polyphonic key pressure status nibble
pub const POLY_PRESSURE: u8 = 0xA0;
/// Control Change status nibble
pub const CONTROL_CHANGE: u8 = 0xB0;
/// Program Change status nibble
pub const PROGRAM_CHANGE: u8 = 0xC0;
/// Channel pressure status nibble
pub const CHANNEL_PRESSURE: u8 = 0xD0;
/// Pitch Bend status nibble
pub const PITCH_BEND: u8 = 0xE0;

/// A single control event from a hardware input port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Name of the port the event arrived on
    pub port_name: String,
    /// Message type (`0x80`..=`0xE0`, channel nibble stripped)
    pub status: u8,
    /// MIDI channel (1-16)
    pub channel: u8,
    /// Control identifier (CC number, note number, or 0)
    pub control: u8,
    /// Control value (0-127)
    pub value: u8,
}

impl InboundMessage {
    /// Build a message directly from its coordinates
    pub fn new(port_name: impl Into<String>, status: u8, channel: u8, control: u8, value: u8) -> Self {
        Self {
            port_name: port_name.into(),
            status,
            channel,
            control,
            value,
        }
    }

    /// Shorthand for a Control Change message
    pub fn control_change(port_name: impl Into<String>, channel: u8, cc: u8, value: u8) -> Self {
        Self::new(port_name, CONTROL_CHANGE, channel, cc, value)
    }

    /// Parse raw MIDI bytes received on `port_name`
    ///
    /// Only channel-voice messages are controls; system messages (SysEx,
    /// clock, active sensing, ...) and running-status fragments yield `None`.
    pub fn from_raw(port_name: &str, data: &[u8]) -> Option<Self> {
        let status_byte = *data.first()?;
        if !(0x80..0xF0).contains(&status_byte) {
            return None;
        }

        let status = status_byte & 0xF0;
        let channel = (status_byte & 0x0F) + 1;
        let data1 = data.get(1).map(|b| b & 0x7F);
        let data2 = data.get(2).map(|b| b & 0x7F);

        let (status, control, value) = match status {
            NOTE_ON => {
                let (note, velocity) = (data1?, data2?);
                // Note On with velocity 0 is a Note Off
                if velocity == 0 {
                    (NOTE_OFF, note, 0)
                } else {
                    (NOTE_ON, note, velocity)
                }
            }
            NOTE_OFF | POLY_PRESSURE | CONTROL_CHANGE => (status, data1?, data2?),
            PROGRAM_CHANGE | CHANNEL_PRESSURE => (status, 0, data1?),
            // 14-bit bend, keep the MSB
            PITCH_BEND => {
                data1?;
                (status, 0, data2?)
            }
            _ => return None,
        };

        Some(Self {
            port_name: port_name.to_string(),
            status,
            channel,
            control,
            value,
        })
    }

    /// Short name of the message type
    pub fn kind(&self) -> &'static str {
        match self.status {
            NOTE_OFF => "NoteOff",
            NOTE_ON => "NoteOn",
            POLY_PRESSURE => "PolyPressure",
            CONTROL_CHANGE => "CC",
            PROGRAM_CHANGE => "ProgramChange",
            CHANNEL_PRESSURE => "ChannelPressure",
            PITCH_BEND => "PitchBend",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ch:{} c:{} v:{}",
            self.port_name,
            self.kind(),
            self.channel,
            self.control,
            self.value
        )
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

//! Hardware MIDI input
//!
//! Opens the configured input ports and feeds every channel-voice message
//! into the ingestion queue from midir's callback thread.

use anyhow::{Context, Result};
use colored::*;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info, trace};

use crate::ingest::IngestSender;
use crate::midi::{format_hex, InboundMessage};

const CLIENT_NAME: &str = "Param-Link";

/// Open MIDI input connections
///
/// Dropping this closes every port.
pub struct MidiInputs {
    connections: Vec<MidiInputConnection<()>>,
    port_names: Vec<String>,
}

impl MidiInputs {
    /// Connect to the first port matching each pattern
    ///
    /// Patterns are case-insensitive substrings of the port name. Fails if any
    /// pattern matches no port.
    pub fn connect(patterns: &[String], sender: IngestSender) -> Result<Self> {
        let mut connections = Vec::new();
        let mut port_names = Vec::new();

        for pattern in patterns {
            let mut midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
            // System messages (clock, active sensing, SysEx) are never controls
            midi_in.ignore(Ignore::All);

            let (port, port_name) = find_input_port(&midi_in, pattern)
                .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", pattern))?;

            info!("Connecting to input port: {}", port_name);

            let sender = sender.clone();
            let name = port_name.clone();
            let connection = midi_in
                .connect(
                    &port,
                    CLIENT_NAME,
                    move |_timestamp, data, _| match InboundMessage::from_raw(&name, data) {
                        Some(message) => {
                            trace!("MIDI in: {}", message);
                            // Never block the driver thread
                            sender.enqueue(message);
                        }
                        None => debug!("Ignoring MIDI from {}: {}", name, format_hex(data)),
                    },
                    (),
                )
                .map_err(|e| anyhow::anyhow!("Failed to connect to input port '{}': {}", port_name, e))?;

            connections.push(connection);
            port_names.push(port_name);
        }

        Ok(Self {
            connections,
            port_names,
        })
    }

    pub fn port_names(&self) -> &[String] {
        &self.port_names
    }

    /// Close every connection
    pub fn close(self) {
        for connection in self.connections {
            connection.close();
        }
        info!("MIDI inputs closed");
    }
}

/// Find an input port by substring match
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    let pattern = pattern.to_lowercase();
    midi_in.ports().into_iter().find_map(|port| {
        let name = midi_in.port_name(&port).ok()?;
        if name.to_lowercase().contains(&pattern) {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            Some((port, name))
        } else {
            None
        }
    })
}

/// List available MIDI input port names
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;

    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// Print available input ports
pub fn print_ports() -> Result<()> {
    let ports = list_input_ports()?;

    println!("\n{}", "=== MIDI Input Ports ===".bold().cyan());
    if ports.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (index, name) in ports.iter().enumerate() {
        println!("  [{}] {}", index.to_string().yellow(), name.green());
    }
    println!();

    Ok(())
}

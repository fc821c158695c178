//! Binding keys

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::midi::InboundMessage;

/// Stable identifier of one physical control
///
/// Formatted `port:status:channel:control`. The three trailing fields are
/// numeric, so splitting from the right recovers the coordinates even when
/// the port name itself contains ':'.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingKey(String);

impl BindingKey {
    pub fn new(port_name: &str, status: u8, channel: u8, control: u8) -> Self {
        Self(format!("{}:{}:{}:{}", port_name, status, channel, control))
    }

    /// Key of the control that produced `message`
    pub fn from_message(message: &InboundMessage) -> Self {
        Self::new(
            &message.port_name,
            message.status,
            message.channel,
            message.control,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into `(port, status, channel, control)`
    ///
    /// Returns `None` for keys that were not produced by [`BindingKey::new`]
    /// (e.g. hand-edited links files).
    pub fn coordinates(&self) -> Option<(&str, u8, u8, u8)> {
        let mut parts = self.0.rsplitn(4, ':');
        let control = parts.next()?.parse().ok()?;
        let channel = parts.next()?.parse().ok()?;
        let status = parts.next()?.parse().ok()?;
        let port = parts.next()?;
        Some((port, status, channel, control))
    }
}

impl From<String> for BindingKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::CONTROL_CHANGE;
    use proptest::prelude::*;

    #[test]
    fn test_key_format() {
        let msg = InboundMessage::control_change("nanoKONTROL2", 1, 14, 99);

        assert_eq!(BindingKey::from_message(&msg).as_str(), "nanoKONTROL2:176:1:14");
    }

    #[test]
    fn test_value_is_not_part_of_key() {
        let a = InboundMessage::control_change("nano", 1, 14, 0);
        let b = InboundMessage::control_change("nano", 1, 14, 127);

        assert_eq!(BindingKey::from_message(&a), BindingKey::from_message(&b));
    }

    #[test]
    fn test_coordinates_with_colon_in_port() {
        let key = BindingKey::new("USB MIDI:0 20:0", CONTROL_CHANGE, 2, 7);

        assert_eq!(key.coordinates(), Some(("USB MIDI:0 20:0", 176, 2, 7)));
        assert_eq!(BindingKey::from("garbage".to_string()).coordinates(), None);
    }

    #[test]
    fn test_serde_transparent() {
        let key = BindingKey::new("p", 144, 1, 60);
        let json = serde_json::to_string(&key).unwrap();

        assert_eq!(json, "\"p:144:1:60\"");
        assert_eq!(serde_json::from_str::<BindingKey>(&json).unwrap(), key);
    }

    proptest! {
        #[test]
        fn prop_key_is_deterministic(
            port in ".{0,16}",
            status in any::<u8>(),
            channel in any::<u8>(),
            control in any::<u8>(),
        ) {
            prop_assert_eq!(
                BindingKey::new(&port, status, channel, control),
                BindingKey::new(&port, status, channel, control)
            );
        }

        #[test]
        fn prop_any_field_change_changes_key(
            port in "[a-zA-Z0-9 :]{0,16}",
            other_port in "[a-zA-Z0-9 :]{0,16}",
            status in any::<u8>(),
            channel in any::<u8>(),
            control in any::<u8>(),
            delta in 1u8..=255,
        ) {
            let base = BindingKey::new(&port, status, channel, control);

            prop_assert_ne!(&base, &BindingKey::new(&port, status.wrapping_add(delta), channel, control));
            prop_assert_ne!(&base, &BindingKey::new(&port, status, channel.wrapping_add(delta), control));
            prop_assert_ne!(&base, &BindingKey::new(&port, status, channel, control.wrapping_add(delta)));
            if other_port != port {
                prop_assert_ne!(&base, &BindingKey::new(&other_port, status, channel, control));
            }
        }
    }
}

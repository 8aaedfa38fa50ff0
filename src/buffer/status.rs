//! Status messages reported to the manager over the control channel
//!
//! Each notification is a fixed three-field record
//! `<control-channel-tag>:<agent-source-label>:<body>`. The manager-side
//! decoder parses these literally, so the exact wording is a
//! compatibility contract and must remain stable.

/// Single-character tag routing a message onto the control channel
pub const CONTROL_CHANNEL_TAG: char = '1';

/// Source label identifying this agent on the control channel
pub const AGENT_SOURCE_LABEL: &str = "flood-agent";

/// One-shot buffer health notifications, drained by the dispatcher in
/// the fixed order warn, full, flood, normal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Warn,
    Full,
    Flood,
    Normal,
}

impl StatusKind {
    /// Body of the control message for this notification
    pub fn body(&self, warn_level: u32, normal_level: u32) -> String {
        match self {
            StatusKind::Warn => format!(
                "agent: Event buffer is at {}% of its capacity.",
                warn_level
            ),
            StatusKind::Full => {
                "agent: Event buffer is full. Incoming events are being dropped.".to_string()
            }
            StatusKind::Flood => {
                "agent: Event buffer is flooded. Incoming events are being dropped.".to_string()
            }
            StatusKind::Normal => format!(
                "agent: Event buffer usage is back under {}%.",
                normal_level
            ),
        }
    }

    /// Complete wire message: `<tag>:<source>:<body>`
    pub fn wire_message(&self, warn_level: u32, normal_level: u32) -> String {
        format!(
            "{}:{}:{}",
            CONTROL_CHANNEL_TAG,
            AGENT_SOURCE_LABEL,
            self.body(warn_level, normal_level)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_messages_are_stable() {
        assert_eq!(
            StatusKind::Warn.wire_message(90, 70),
            "1:flood-agent:agent: Event buffer is at 90% of its capacity."
        );
        assert_eq!(
            StatusKind::Full.wire_message(90, 70),
            "1:flood-agent:agent: Event buffer is full. Incoming events are being dropped."
        );
        assert_eq!(
            StatusKind::Flood.wire_message(90, 70),
            "1:flood-agent:agent: Event buffer is flooded. Incoming events are being dropped."
        );
        assert_eq!(
            StatusKind::Normal.wire_message(90, 70),
            "1:flood-agent:agent: Event buffer usage is back under 70%."
        );
    }

    #[test]
    fn test_bodies_are_parameterised_by_their_own_level() {
        // warn uses warn_level, normal uses normal_level; full and flood
        // take no parameter
        assert!(StatusKind::Warn.body(80, 20).contains("80%"));
        assert!(StatusKind::Normal.body(80, 20).contains("20%"));
        assert_eq!(StatusKind::Full.body(80, 20), StatusKind::Full.body(1, 99));
        assert_eq!(
            StatusKind::Flood.body(80, 20),
            StatusKind::Flood.body(1, 99)
        );
    }
}

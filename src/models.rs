// Data models for TodoStore

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub value: String,
    pub completed: bool,
}

/// Seed entry applied when a store is constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTodo {
    pub value: String,
    #[serde(default)]
    pub completed: bool,
}

impl SeedTodo {
    pub fn new(value: impl Into<String>, completed: bool) -> Self {
        Self {
            value: value.into(),
            completed,
        }
    }
}

/// Notification channel a change event is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    TodoAdded,
    TodoUpdated,
    TodoDeleted,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::TodoAdded, Channel::TodoUpdated, Channel::TodoDeleted];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::TodoAdded => "todoAdded",
            Channel::TodoUpdated => "todoUpdated",
            Channel::TodoDeleted => "todoDeleted",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_serialization() {
        let todo = Todo {
            id: "0".to_string(),
            value: "Finish T2".to_string(),
            completed: false,
        };

        let json = serde_json::to_string(&todo).unwrap();
        assert_eq!(json, r#"{"id":"0","value":"Finish T2","completed":false}"#);
    }

    #[test]
    fn test_channel_serialization() {
        assert_eq!(serde_json::to_string(&Channel::TodoAdded).unwrap(), "\"todoAdded\"");
        assert_eq!(serde_json::to_string(&Channel::TodoDeleted).unwrap(), "\"todoDeleted\"");

        let channel: Channel = serde_json::from_str("\"todoUpdated\"").unwrap();
        assert_eq!(channel, Channel::TodoUpdated);
    }

    #[test]
    fn test_channel_display_matches_wire_name() {
        for channel in Channel::ALL {
            let json = serde_json::to_string(&channel).unwrap();
            assert_eq!(json, format!("\"{}\"", channel));
        }
    }

    #[test]
    fn test_seed_completed_defaults_to_false() {
        let seed: SeedTodo = serde_yaml::from_str("value: Buy milk").unwrap();
        assert_eq!(seed, SeedTodo::new("Buy milk", false));
    }
}

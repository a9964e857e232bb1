use serde::Serialize;

/// Whether the chat panel is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Closed,
    Open,
}

/// Conversation activity. Only one exchange may be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    #[default]
    Idle,
    Sending,
}

/// Flattened view of the widget state.
///
/// `Error` is idle with an error annotation from the last exchange; input is
/// still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetPhase {
    Closed,
    Idle,
    Sending,
    Error,
}

impl WidgetPhase {
    pub fn is_open(self) -> bool {
        !matches!(self, WidgetPhase::Closed)
    }
}

/// Which UI controls the host should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub launcher_visible: bool,
    pub panel_visible: bool,
    pub input_enabled: bool,
    pub send_enabled: bool,
}

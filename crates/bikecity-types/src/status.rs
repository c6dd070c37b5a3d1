use std::collections::HashMap;
use std::fmt;

/// HUD elements that input and telemetry readouts write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusElement {
    /// Speed value next to the speedometer (`speed-value`).
    SpeedValue,
    /// Connection status of the bike sensor (`connection-status`).
    ConnectionStatus,
    /// Speed value of the standalone bike panel (`bike-speed-value`).
    BikeSpeedValue,
    /// Which device currently controls the speed (`control-mode`).
    ControlMode,
    /// Toast shown when a controller connects or disconnects (`controller-status`).
    ControllerStatus,
    /// Live controller input percentages (`controller-inputs`).
    ControllerInputs,
}

impl StatusElement {
    pub const ALL: [StatusElement; 6] = [
        StatusElement::SpeedValue,
        StatusElement::ConnectionStatus,
        StatusElement::BikeSpeedValue,
        StatusElement::ControlMode,
        StatusElement::ControllerStatus,
        StatusElement::ControllerInputs,
    ];

    /// Element identifier as used by the page layout.
    pub fn id(self) -> &'static str {
        match self {
            StatusElement::SpeedValue => "speed-value",
            StatusElement::ConnectionStatus => "connection-status",
            StatusElement::BikeSpeedValue => "bike-speed-value",
            StatusElement::ControlMode => "control-mode",
            StatusElement::ControllerStatus => "controller-status",
            StatusElement::ControllerInputs => "controller-inputs",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.id() == id)
    }
}

impl fmt::Display for StatusElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Text colors used by the readouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusColor {
    /// `#00ff00`
    Green,
    /// `#ff0000`
    Red,
    /// `#ffff00`
    Yellow,
    /// `#ffffff`
    White,
    /// `#4CAF50`, controller-connected toast background.
    ToastGreen,
    /// `#f44336`, controller-disconnected toast background.
    ToastRed,
}

impl StatusColor {
    pub fn hex(self) -> &'static str {
        match self {
            StatusColor::Green => "#00ff00",
            StatusColor::Red => "#ff0000",
            StatusColor::Yellow => "#ffff00",
            StatusColor::White => "#ffffff",
            StatusColor::ToastGreen => "#4CAF50",
            StatusColor::ToastRed => "#f44336",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

/// Output surface for HUD text.
///
/// The game page, a terminal, or a test recorder can implement this.
pub trait StatusSink {
    /// Show `text` in `element` with the given color.
    fn show(&mut self, element: StatusElement, text: &str, color: StatusColor);

    /// Hide `element`.
    fn hide(&mut self, element: StatusElement);
}

/// Last value written to one element of a [`MemoryStatusSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub text: String,
    pub color: StatusColor,
    pub visible: bool,
}

/// In-memory sink that keeps the latest state of every element.
#[derive(Debug, Default)]
pub struct MemoryStatusSink {
    entries: HashMap<StatusElement, StatusEntry>,
    writes: usize,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, element: StatusElement) -> Option<&StatusEntry> {
        self.entries.get(&element)
    }

    /// Text of a visible element.
    pub fn text(&self, element: StatusElement) -> Option<&str> {
        self.entries
            .get(&element)
            .filter(|e| e.visible)
            .map(|e| e.text.as_str())
    }

    pub fn color(&self, element: StatusElement) -> Option<StatusColor> {
        self.entries.get(&element).map(|e| e.color)
    }

    pub fn is_visible(&self, element: StatusElement) -> bool {
        self.entries.get(&element).is_some_and(|e| e.visible)
    }

    /// Total number of show/hide calls received.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StatusSink for MemoryStatusSink {
    fn show(&mut self, element: StatusElement, text: &str, color: StatusColor) {
        self.writes += 1;
        self.entries.insert(
            element,
            StatusEntry {
                text: text.to_string(),
                color,
                visible: true,
            },
        );
    }

    fn hide(&mut self, element: StatusElement) {
        self.writes += 1;
        if let Some(entry) = self.entries.get_mut(&element) {
            entry.visible = false;
        }
    }
}

use std::collections::HashMap;

use bikecity_types::{StatusColor, StatusElement, StatusSink};
use tracing::info;

/// Status sink for headless runs: logs each element when its text, color, or visibility changes.
#[derive(Debug, Default)]
pub struct LogStatusSink {
    shown: HashMap<StatusElement, (String, StatusColor)>,
}

impl LogStatusSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSink for LogStatusSink {
    fn show(&mut self, element: StatusElement, text: &str, color: StatusColor) {
        let changed = self
            .shown
            .get(&element)
            .is_none_or(|(t, c)| t != text || *c != color);
        if changed {
            info!(element = %element, color = %color, "{}", text.replace('\n', " | "));
            self.shown.insert(element, (text.to_string(), color));
        }
    }

    fn hide(&mut self, element: StatusElement) {
        if self.shown.remove(&element).is_some() {
            info!(element = %element, "hidden");
        }
    }
}

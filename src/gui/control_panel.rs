//! Navigation Bar
//! Bottom panel that steps through the charts one at a time.

use egui::RichText;

/// Action requested by the navigation bar or the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    None,
    Previous,
    Next,
    Close,
}

/// Position within the chart sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBar {
    pub index: usize,
    pub total: usize,
}

impl NavigationBar {
    pub fn new(total: usize) -> Self {
        Self { index: 0, total }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }

    /// "n / total", 1-based.
    pub fn counter(&self) -> String {
        if self.total == 0 {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.index + 1, self.total)
    }

    /// Apply an action. Returns `true` when the window should close.
    ///
    /// Next on the last chart closes, matching the "Close" label the
    /// button carries there.
    pub fn apply(&mut self, action: NavAction) -> bool {
        match action {
            NavAction::None => false,
            NavAction::Previous => {
                self.index = self.index.saturating_sub(1);
                false
            }
            NavAction::Next if self.is_last() => true,
            NavAction::Next => {
                self.index += 1;
                false
            }
            NavAction::Close => true,
        }
    }

    /// Arrow keys step, Escape closes.
    pub fn read_keys(ctx: &egui::Context) -> NavAction {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Escape) {
                NavAction::Close
            } else if i.key_pressed(egui::Key::ArrowRight) {
                NavAction::Next
            } else if i.key_pressed(egui::Key::ArrowLeft) {
                NavAction::Previous
            } else {
                NavAction::None
            }
        })
    }

    /// Draw the bar
    pub fn show(&self, ui: &mut egui::Ui, title: &str) -> NavAction {
        let mut action = NavAction::None;

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_first(), egui::Button::new("◀ Previous"))
                .clicked()
            {
                action = NavAction::Previous;
            }

            let next_label = if self.is_last() { "Close" } else { "Next ▶" };
            if ui.button(next_label).clicked() {
                action = NavAction::Next;
            }

            ui.separator();
            ui.label(RichText::new(self.counter()).strong());
            ui.separator();
            ui.label(RichText::new(title).size(15.0));
        });

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_forward_then_closes() {
        let mut nav = NavigationBar::new(3);
        assert_eq!(nav.counter(), "1 / 3");

        assert!(!nav.apply(NavAction::Next));
        assert!(!nav.apply(NavAction::Next));
        assert_eq!(nav.counter(), "3 / 3");
        assert!(nav.is_last());

        assert!(nav.apply(NavAction::Next));
        assert_eq!(nav.index, 2);
    }

    #[test]
    fn previous_stops_at_first() {
        let mut nav = NavigationBar::new(2);
        assert!(!nav.apply(NavAction::Previous));
        assert_eq!(nav.index, 0);

        nav.apply(NavAction::Next);
        nav.apply(NavAction::Previous);
        assert!(nav.is_first());
    }

    #[test]
    fn empty_sequence() {
        let mut nav = NavigationBar::new(0);
        assert_eq!(nav.counter(), "0 / 0");
        assert!(nav.is_last());
        assert!(nav.apply(NavAction::Next));
        assert!(nav.apply(NavAction::Close));
        assert!(!nav.apply(NavAction::None));
    }
}

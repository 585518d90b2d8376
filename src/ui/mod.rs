//! User interface state shared between the core and the display shell.
//!
//! The core owns every bit of UI state; the shell only renders a [`View`]
//! and turns debounced button edges into [`ButtonEvent`]s.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C
//! - **Buttons**: 3 tactile switches with debouncing (UP, SELECT, DOWN)

#[cfg(feature = "embedded")]
pub mod buttons;
#[cfg(feature = "embedded")]
pub mod display;

use heapless::String;

use crate::config::MAIN_TEXT;
use crate::pain::PainLevel;

/// Physical button events (after debouncing).
///
///   - UP/DOWN: adjust the pain level while the entry widget is open
///   - SELECT: commit the level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    Up,
    Select,
    Down,
}

/// Whether the pain-entry widget is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayState {
    Hidden,
    Visible,
}

impl DisplayState {
    pub fn is_visible(self) -> bool {
        self == DisplayState::Visible
    }
}

/// Role of an action-bar arrow icon; also its index in the icon table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArrowRole {
    Up = 0,
    Select = 1,
    Down = 2,
}

impl ArrowRole {
    /// Number of entries in an icon table indexed by role.
    pub const COUNT: usize = 3;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Everything the shell needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub banner: &'static str,
    /// `HH:MM:SS`.
    pub clock: String<8>,
    /// Level in the entry widget; `None` while hidden.
    pub pain_level: Option<PainLevel>,
}

impl View {
    pub fn new(clock: String<8>, pain_level: Option<PainLevel>) -> Self {
        Self {
            banner: MAIN_TEXT,
            clock,
            pain_level,
        }
    }

    pub fn display(&self) -> DisplayState {
        if self.pain_level.is_some() {
            DisplayState::Visible
        } else {
            DisplayState::Hidden
        }
    }

    /// Arrows drawn while the widget is visible. Select has no arrow of its
    /// own on screen; its slot in the icon table is kept for completeness.
    pub fn visible_arrows(&self) -> &'static [ArrowRole] {
        if self.pain_level.is_some() {
            &[ArrowRole::Up, ArrowRole::Down]
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_roles_index_the_icon_table_in_order() {
        assert_eq!(ArrowRole::Up.index(), 0);
        assert_eq!(ArrowRole::Select.index(), 1);
        assert_eq!(ArrowRole::Down.index(), 2);
        assert!(ArrowRole::Down.index() < ArrowRole::COUNT);
    }

    #[test]
    fn view_hides_arrows_without_widget() {
        let view = View::new(String::new(), None);
        assert_eq!(view.display(), DisplayState::Hidden);
        assert!(view.visible_arrows().is_empty());
        assert_eq!(view.banner, "Pain App");
    }

    #[test]
    fn view_shows_up_and_down_arrows_with_widget() {
        let view = View::new(String::new(), Some(PainLevel::new(5)));
        assert!(view.display().is_visible());
        assert_eq!(view.visible_arrows(), &[ArrowRole::Up, ArrowRole::Down]);
    }
}

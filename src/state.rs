use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Title shown on the screen while the player is idle.
pub const DEFAULT_TITLE: &str = "源码TV";
/// Label of the button while the player is stopped.
pub const PLAY_LABEL: &str = "播放";
/// Label of the button while the player is playing.
pub const STOP_LABEL: &str = "停止";

/// The text area of the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub title: String,
}

impl Screen {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Screen {
            title: title.into(),
        }
    }
}

/// The play/stop toggle of the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Style class, either `"play"` or `"stop"`.
    pub class_name: String,
    pub text: String,
}

impl Button {
    /// The button offered while stopped, which starts playback.
    pub fn play() -> Self {
        Button {
            class_name: "play".to_string(),
            text: PLAY_LABEL.to_string(),
        }
    }

    /// The button offered while playing, which stops playback.
    pub fn stop() -> Self {
        Button {
            class_name: "stop".to_string(),
            text: STOP_LABEL.to_string(),
        }
    }
}

/// A snapshot of the player.
///
/// Snapshots are never modified once they are stored. The reducer
/// builds a new `AppState` for every transition and only allocates a
/// new [Screen] or [Button] when that part actually changed; untouched
/// parts are shared with the previous snapshot through their [Rc], so
/// that [Rc::ptr_eq()] tells whether a part needs to be rendered again.
///
/// A consistent snapshot shows the stop button while playing and the
/// play button while stopped. [AppState::default()],
/// [AppState::playing()], [AppState::stopped()] and every state
/// produced by [PlayerReducer](crate::PlayerReducer) are consistent.
/// The fields are public, so a snapshot built by hand or deserialized
/// can break this; check it with
/// [is_consistent()](AppState::is_consistent()) before seeding a
/// store with it, or start from [player_store()](crate::player_store()).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub is_playing: bool,
    pub screen: Rc<Screen>,
    pub button: Rc<Button>,
}

impl AppState {
    /// A playing snapshot showing `title`.
    pub fn playing<S: Into<String>>(title: S) -> Self {
        AppState {
            is_playing: true,
            screen: Rc::new(Screen::new(title)),
            button: Rc::new(Button::stop()),
        }
    }

    /// A stopped snapshot showing `title`.
    pub fn stopped<S: Into<String>>(title: S) -> Self {
        AppState {
            is_playing: false,
            screen: Rc::new(Screen::new(title)),
            button: Rc::new(Button::play()),
        }
    }

    /// Whether the button matches `is_playing`.
    pub fn is_consistent(&self) -> bool {
        let expected = if self.is_playing {
            Button::stop()
        } else {
            Button::play()
        };
        *self.button == expected
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::stopped(DEFAULT_TITLE)
    }
}

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Display};
use thiserror::Error;

/// A transition of the player, dispatched to a
/// [Store](crate::Store) via [Store::dispatch()](crate::Store::dispatch()).
///
/// Every variant carries the title the screen should show after the
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Start playback.
    Play { title: String },
    /// Advance to the next title, leaving playback as it is.
    Next { title: String },
    /// Stop playback.
    Stop { title: String },
}

impl Action {
    pub fn play<S: Into<String>>(title: S) -> Self {
        Action::Play {
            title: title.into(),
        }
    }

    pub fn next<S: Into<String>>(title: S) -> Self {
        Action::Next {
            title: title.into(),
        }
    }

    pub fn stop<S: Into<String>>(title: S) -> Self {
        Action::Stop {
            title: title.into(),
        }
    }

    /// The tag of this action, as used by [TaggedAction::kind].
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Play { .. } => "PLAY",
            Action::Next { .. } => "NEXT",
            Action::Stop { .. } => "STOP",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Action::Play { title } | Action::Next { title } | Action::Stop { title } => title,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.title())
    }
}

/// An action as handed over by loosely typed glue code, a `kind` tag
/// plus a title. The tag is not checked until the action is converted
/// into an [Action] or reduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedAction {
    pub kind: String,
    pub title: String,
}

impl TaggedAction {
    pub fn new<K: Into<String>, T: Into<String>>(kind: K, title: T) -> Self {
        TaggedAction {
            kind: kind.into(),
            title: title.into(),
        }
    }
}

impl From<Action> for TaggedAction {
    fn from(action: Action) -> Self {
        let kind = action.kind();
        match action {
            Action::Play { title } | Action::Next { title } | Action::Stop { title } => {
                TaggedAction::new(kind, title)
            }
        }
    }
}

impl Display for TaggedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.kind, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unrecognized action kind {0:?}")]
    UnknownKind(String),
}

impl TryFrom<TaggedAction> for Action {
    type Error = ActionError;

    fn try_from(tagged: TaggedAction) -> Result<Self, Self::Error> {
        let TaggedAction { kind, title } = tagged;
        match kind.as_str() {
            "PLAY" => Ok(Action::Play { title }),
            "NEXT" => Ok(Action::Next { title }),
            "STOP" => Ok(Action::Stop { title }),
            _ => Err(ActionError::UnknownKind(kind)),
        }
    }
}

use crate::{Action, ActionError, AppState, Screen, TaggedAction};
use std::rc::Rc;

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take an `Action` submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and produce the next
/// `State` from the previous one.
///
/// Any `Fn(&Rc<State>, &Action) -> Rc<State>` is a reducer.
pub trait Reducer<State, Action> {
    /// Take an `Action` submitted to a store via
    /// [Store::dispatch()](crate::Store::dispatch()) and produce the
    /// next `State`.
    ///
    /// `prev_state` must not be modified. Returning `prev_state`
    /// itself (the same [Rc]) signals that the action was a no-op,
    /// which lets renderers skip all work with a pointer comparison.
    /// When a new state is returned, parts that did not change should
    /// be shared with `prev_state` rather than copied.
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(&Rc<State>, &Action) -> Rc<State>,
{
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State> {
        (self)(prev_state, action)
    }
}

/// The [Reducer] for the player's [AppState].
///
/// `Play` and `Stop` replace the whole snapshot, `Next` only replaces
/// the screen and shares the button with the previous snapshot. `Next`
/// does not look at `is_playing`, so a `Next` arriving after a `Stop`
/// is applied as well.
///
/// The reducer also accepts [TaggedAction]s, for which an unrecognized
/// kind is ignored: the previous state is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerReducer;

impl Reducer<AppState, Action> for PlayerReducer {
    fn reduce(&self, prev_state: &Rc<AppState>, action: &Action) -> Rc<AppState> {
        let state = match action {
            Action::Play { title } => AppState::playing(title.as_str()),
            Action::Next { title } => AppState {
                screen: Rc::new(Screen::new(title.as_str())),
                ..AppState::clone(prev_state)
            },
            Action::Stop { title } => AppState::stopped(title.as_str()),
        };

        Rc::new(state)
    }
}

impl Reducer<AppState, TaggedAction> for PlayerReducer {
    fn reduce(&self, prev_state: &Rc<AppState>, action: &TaggedAction) -> Rc<AppState> {
        let title = action.title.as_str();
        let action = match action.kind.as_str() {
            "PLAY" => Action::play(title),
            "NEXT" => Action::next(title),
            "STOP" => Action::stop(title),
            kind => {
                log::warn!("ignoring action: {}", ActionError::UnknownKind(kind.to_string()));
                return prev_state.clone();
            }
        };
        self.reduce(prev_state, &action)
    }
}

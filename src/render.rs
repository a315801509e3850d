//! Rendering of the player's [AppState], skipping every part of the
//! state that did not change since the last render.
//!
//! Change detection relies on pointer equality only: a snapshot, or a
//! part of it, is considered unchanged when it is the same [Rc] as
//! before. This is exact for states produced by
//! [PlayerReducer](crate::PlayerReducer), which returns the previous
//! state for no-op actions and shares unchanged parts between
//! snapshots.

use crate::{AppState, Button, Screen, StoreRef, Subscription};
use std::{
    cell::{Ref, RefCell},
    fmt::Debug,
    rc::Rc,
};

/// Implemented by the UI to draw the parts of the player.
pub trait Render {
    fn render_screen(&mut self, screen: &Screen);
    fn render_button(&mut self, button: &Button);
}

/// Render `new_state`, given the `old_state` that was rendered last.
///
/// Nothing is rendered if both are the same snapshot. With no
/// `old_state` (the first render) every part is rendered.
pub fn render_app<R: Render + ?Sized>(
    renderer: &mut R,
    new_state: &Rc<AppState>,
    old_state: Option<&Rc<AppState>>,
) {
    if let Some(old_state) = old_state {
        if Rc::ptr_eq(new_state, old_state) {
            return;
        }
    }
    log::trace!("render_app");

    render_screen(renderer, &new_state.screen, old_state.map(|s| &s.screen));
    render_button(renderer, &new_state.button, old_state.map(|s| &s.button));
}

fn render_screen<R: Render + ?Sized>(
    renderer: &mut R,
    new_screen: &Rc<Screen>,
    old_screen: Option<&Rc<Screen>>,
) {
    if changed(new_screen, old_screen) {
        log::trace!("render_screen: {:?}", new_screen.title);
        renderer.render_screen(new_screen);
    }
}

fn render_button<R: Render + ?Sized>(
    renderer: &mut R,
    new_button: &Rc<Button>,
    old_button: Option<&Rc<Button>>,
) {
    if changed(new_button, old_button) {
        log::trace!("render_button: {:?}", new_button.class_name);
        renderer.render_button(new_button);
    }
}

fn changed<T>(new: &Rc<T>, old: Option<&Rc<T>>) -> bool {
    match old {
        Some(old) => !Rc::ptr_eq(new, old),
        None => true,
    }
}

/// A [Render] implementation together with the snapshot it rendered
/// last.
pub struct DiffRenderer<R> {
    renderer: R,
    prev_state: Option<Rc<AppState>>,
}

impl<R: Render> DiffRenderer<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            prev_state: None,
        }
    }

    /// Render the parts of `state` that differ from the previously
    /// rendered snapshot, and remember `state` for the next call.
    pub fn render(&mut self, state: Rc<AppState>) {
        render_app(&mut self.renderer, &state, self.prev_state.as_ref());
        self.prev_state = Some(state);
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn prev_state(&self) -> Option<&Rc<AppState>> {
        self.prev_state.as_ref()
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Render the current state of `store` in full, then subscribe to
    /// the store so that every dispatch renders what changed.
    pub fn connect<Action>(self, store: &StoreRef<AppState, Action>) -> Connected<R>
    where
        R: 'static,
        Action: Debug + 'static,
    {
        let diff_renderer = Rc::new(RefCell::new(self));
        diff_renderer.borrow_mut().render(store.state());

        let weak_store = store.downgrade();
        let listener_renderer = diff_renderer.clone();
        let subscription = store.subscribe(move || {
            if let Some(store) = weak_store.upgrade() {
                listener_renderer.borrow_mut().render(store.state());
            }
        });

        Connected {
            diff_renderer,
            subscription,
        }
    }
}

/// A [DiffRenderer] subscribed to a store, see [DiffRenderer::connect()].
///
/// Dropping this disconnects the renderer.
pub struct Connected<R> {
    diff_renderer: Rc<RefCell<DiffRenderer<R>>>,
    subscription: Subscription,
}

impl<R> Connected<R> {
    /// Borrow the renderer. Must not be called from within
    /// [Render::render_screen()] or [Render::render_button()].
    pub fn renderer(&self) -> Ref<'_, R> {
        Ref::map(self.diff_renderer.borrow(), |d| &d.renderer)
    }

    /// Stop rendering on dispatch.
    pub fn disconnect(self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::{render_app, DiffRenderer, Render};
    use crate::{
        player_store, Action, AppState, Button, PlayerReducer, Screen, StoreRef, TaggedAction,
    };
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct RecordingRenderer {
        screens: Vec<String>,
        buttons: Vec<String>,
    }

    impl Render for RecordingRenderer {
        fn render_screen(&mut self, screen: &Screen) {
            self.screens.push(screen.title.clone());
        }

        fn render_button(&mut self, button: &Button) {
            self.buttons.push(button.class_name.clone());
        }
    }

    #[test]
    fn first_render_draws_everything() {
        let mut renderer = RecordingRenderer::default();
        render_app(&mut renderer, &Rc::new(AppState::default()), None);
        assert_eq!(vec!["源码TV"], renderer.screens);
        assert_eq!(vec!["play"], renderer.buttons);
    }

    #[test]
    fn same_snapshot_renders_nothing() {
        let mut renderer = RecordingRenderer::default();
        let state = Rc::new(AppState::default());
        render_app(&mut renderer, &state, Some(&state));
        assert!(renderer.screens.is_empty());
        assert!(renderer.buttons.is_empty());
    }

    #[test]
    fn equal_but_distinct_snapshots_render() {
        let mut renderer = RecordingRenderer::default();
        let old = Rc::new(AppState::stopped("C"));
        let new = Rc::new(AppState::stopped("C"));
        render_app(&mut renderer, &new, Some(&old));
        assert_eq!(vec!["C"], renderer.screens);
        assert_eq!(vec!["play"], renderer.buttons);
    }

    #[test]
    fn connected_renders_changed_parts() {
        let store = player_store();
        let connected = DiffRenderer::new(RecordingRenderer::default()).connect(&store);

        store.dispatch(Action::play("A"));
        store.dispatch(Action::next("B"));
        store.dispatch(Action::stop("C"));

        let renderer = connected.renderer();
        assert_eq!(vec!["源码TV", "A", "B", "C"], renderer.screens);
        // `Next` shares the button, so it is not rendered again.
        assert_eq!(vec!["play", "stop", "play"], renderer.buttons);
    }

    #[test]
    fn unknown_action_renders_nothing() {
        let store: StoreRef<AppState, TaggedAction> =
            StoreRef::new(PlayerReducer, AppState::default());
        let connected = DiffRenderer::new(RecordingRenderer::default()).connect(&store);

        store.dispatch(TaggedAction::new("REWIND", "x"));

        let renderer = connected.renderer();
        assert_eq!(1, renderer.screens.len());
        assert_eq!(1, renderer.buttons.len());
    }

    #[test]
    fn disconnect_stops_rendering() {
        let store = player_store();
        let connected = DiffRenderer::new(RecordingRenderer::default()).connect(&store);
        assert_eq!(1, store.listener_count());

        connected.disconnect();
        assert_eq!(0, store.listener_count());
        store.dispatch(Action::play("A"));
    }

    #[test]
    fn diff_renderer_tracks_prev_state() {
        let mut diff_renderer = DiffRenderer::new(RecordingRenderer::default());
        assert!(diff_renderer.prev_state().is_none());

        let state = Rc::new(AppState::playing("A"));
        diff_renderer.render(state.clone());
        diff_renderer.render(state.clone());
        assert!(Rc::ptr_eq(&state, diff_renderer.prev_state().unwrap()));

        let renderer = diff_renderer.into_renderer();
        assert_eq!(vec!["A"], renderer.screens);
    }
}

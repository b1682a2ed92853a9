//! Pure state transitions for the load lifecycle
use std::rc::Rc;

use crate::action::Action;
use crate::state::LoadState;

/// Apply one action to the state.
///
/// Handled actions produce a new `Rc` so observers comparing by identity see
/// the change. [`Action::Other`] returns the input `Rc` itself.
pub fn reduce(state: &Rc<LoadState>, action: &Action) -> Rc<LoadState> {
    if let Action::Other(_) = action {
        return Rc::clone(state);
    }

    let mut next = LoadState::clone(state);
    match action {
        Action::LoadStart => {
            next.error = None;
            next.loading = true;
        }
        Action::InitializeSuccess => {
            next.error = None;
            next.loading = false;
            next.initialized = true;
            next.running = true;
        }
        Action::InitializeFailed(error) => {
            next.loading = false;
            next.initialized = false;
            next.running = false;
            next.error = Some(error.clone());
        }
        Action::AddConsoleText(line) => {
            next.console_output.push(line.clone());
            next.console_output_dirty = !next.console_output_dirty;
        }
        Action::ResizeCallback => {
            next.resize = true;
        }
        Action::SetCanvasSize(rect) => {
            next.set_canvas_rect(*rect);
            next.resize = false;
        }
        Action::SetCanvasVisibility(visibility) => {
            next.canvas_visible = *visibility;
        }
        Action::Other(_) => {}
    }
    Rc::new(next)
}

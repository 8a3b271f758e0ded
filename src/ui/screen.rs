use ratatui::Frame;

use crate::{
    ui::{history::HistoryView, results::ResultsView, setup::SetupView},
    App, AppState,
};

/// A UI Screen boundary: renders one application state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct SetupScreen;

impl Screen for SetupScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(SetupView(app), f.area());
    }
}

/// Typing screen - renders the passage through the App widget
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(ResultsView(app), f.area());
    }
}

pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(HistoryView(app), f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Setup => Box::new(SetupScreen),
        AppState::Testing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::History => Box::new(HistoryScreen),
    }
}

use glam::{UVec2, Vec2, Vec4};
use winit::keyboard::KeyCode;

use crate::input::InputEvent;
use crate::mode::{Mode, ModeContext, ResumeHandle};
use crate::rendering::frame::Frame;

const CHOICE_HEIGHT: f32 = 0.1;
const CHOICE_SPACING: f32 = 1.5 * CHOICE_HEIGHT;
const BOUNCE_PERIOD: f32 = 0.8;
const SELECTOR: &str = "*";

const LABEL_COLOR: Vec4 = Vec4::new(0.6, 0.6, 0.55, 1.0);
const CHOICE_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 1.0);
const SELECTED_COLOR: Vec4 = Vec4::ONE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuAction {
    Resume(ResumeHandle),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    /// `None` for headings, which can't be selected.
    pub action: Option<MenuAction>,
}

impl Choice {
    pub fn heading(label: &str) -> Self {
        Self {
            label: label.to_string(),
            action: None,
        }
    }

    pub fn action(label: &str, action: MenuAction) -> Self {
        Self {
            label: label.to_string(),
            action: Some(action),
        }
    }

    fn selectable(&self) -> bool {
        self.action.is_some()
    }
}

/// A vertical list of choices drawn over a paused mode.
pub struct MenuMode {
    choices: Vec<Choice>,
    selected: usize,
    /// In [0, 1), advanced by update to animate the selection markers.
    bounce: f32,
    background: Option<ResumeHandle>,
}

impl MenuMode {
    pub fn new(choices: Vec<Choice>, selected: usize, background: Option<ResumeHandle>) -> Self {
        Self {
            choices,
            selected,
            bounce: 0.0,
            background,
        }
    }

    /// The menu shown when the player hits escape: resume `game` or quit.
    pub fn pause_menu(game: ResumeHandle) -> Self {
        Self::new(
            vec![
                Choice::heading("PAUSED"),
                Choice::action("RESUME", MenuAction::Resume(game)),
                Choice::action("QUIT", MenuAction::Quit),
            ],
            1,
            Some(game),
        )
    }

    #[cfg(test)]
    pub fn selected(&self) -> usize {
        self.selected
    }

    fn select_previous(&mut self) {
        if let Some(index) = (0..self.selected)
            .rev()
            .find(|&index| self.choices[index].selectable())
        {
            self.selected = index;
        }
    }

    fn select_next(&mut self) {
        if let Some(index) =
            (self.selected + 1..self.choices.len()).find(|&index| self.choices[index].selectable())
        {
            self.selected = index;
        }
    }

    fn activate(&self, ctx: &mut ModeContext) -> bool {
        let Some(action) = self.choices.get(self.selected).and_then(|choice| choice.action) else {
            return false;
        };

        log::debug!("Menu choice {:?}", action);
        match action {
            MenuAction::Resume(handle) => ctx.resume(handle),
            MenuAction::Quit => ctx.quit(),
        }
        true
    }
}

impl Mode for MenuMode {
    fn handle_event(
        &mut self,
        event: &InputEvent,
        _window_size: UVec2,
        ctx: &mut ModeContext,
    ) -> bool {
        match *event {
            InputEvent::KeyDown {
                key: KeyCode::ArrowUp,
                ..
            } => {
                self.select_previous();
                true
            }
            InputEvent::KeyDown {
                key: KeyCode::ArrowDown,
                ..
            } => {
                self.select_next();
                true
            }
            InputEvent::KeyDown {
                key: KeyCode::Enter | KeyCode::Space,
                repeat: false,
            } => self.activate(ctx),
            _ => false,
        }
    }

    fn update(&mut self, elapsed: f32, _ctx: &mut ModeContext) {
        self.bounce = (self.bounce + elapsed / BOUNCE_PERIOD).fract();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let total_height = CHOICE_SPACING * self.choices.len() as f32;
        let mut y = 0.5 * total_height - CHOICE_HEIGHT;

        // Markers sway outwards and back once per period
        let sway = 0.05 * (self.bounce * std::f32::consts::TAU).sin().abs();

        for (index, choice) in self.choices.iter().enumerate() {
            let width = frame.text_width(&choice.label, CHOICE_HEIGHT);
            let left = -0.5 * width;

            let color = if index == self.selected {
                let marker_width = frame.text_width(SELECTOR, CHOICE_HEIGHT);
                let gap = 0.5 * CHOICE_HEIGHT + sway;
                frame.draw_text(
                    SELECTOR,
                    Vec2::new(left - gap - marker_width, y),
                    CHOICE_HEIGHT,
                    SELECTED_COLOR,
                );
                frame.draw_text(
                    SELECTOR,
                    Vec2::new(-left + gap, y),
                    CHOICE_HEIGHT,
                    SELECTED_COLOR,
                );
                SELECTED_COLOR
            } else if choice.selectable() {
                CHOICE_COLOR
            } else {
                LABEL_COLOR
            };

            frame.draw_text(&choice.label, Vec2::new(left, y), CHOICE_HEIGHT, color);
            y -= CHOICE_SPACING;
        }
    }

    fn background(&self) -> Option<ResumeHandle> {
        self.background
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::tests::FakeWindow;
    use crate::mode::{ModeId, ModeRequest};
    use crate::rendering::frame::MonospaceMetrics;

    const GAME: ResumeHandle = ResumeHandle(ModeId(7));
    const WINDOW: UVec2 = UVec2::new(800, 600);

    fn key(key: KeyCode) -> InputEvent {
        InputEvent::KeyDown { key, repeat: false }
    }

    fn send(menu: &mut MenuMode, event: InputEvent) -> (bool, Vec<ModeRequest>) {
        let mut window = FakeWindow::default();
        let mut ctx = ModeContext::new(ModeId(8), &mut window);
        let handled = menu.handle_event(&event, WINDOW, &mut ctx);
        (handled, ctx.into_requests())
    }

    #[test]
    fn pause_menu_starts_on_resume() {
        let menu = MenuMode::pause_menu(GAME);

        assert_eq!(menu.selected(), 1);
        assert_eq!(menu.choices[menu.selected()].label, "RESUME");
        assert_eq!(menu.background(), Some(GAME));
    }

    #[test]
    fn navigation_skips_headings_and_stops_at_ends() {
        let mut menu = MenuMode::pause_menu(GAME);

        assert!(send(&mut menu, key(KeyCode::ArrowUp)).0);
        assert_eq!(menu.selected(), 1);

        send(&mut menu, key(KeyCode::ArrowDown));
        assert_eq!(menu.selected(), 2);

        send(&mut menu, key(KeyCode::ArrowDown));
        assert_eq!(menu.selected(), 2);

        let repeat = InputEvent::KeyDown {
            key: KeyCode::ArrowUp,
            repeat: true,
        };
        send(&mut menu, repeat);
        assert_eq!(menu.selected(), 1);
    }

    #[test]
    fn resume_requests_the_paused_mode() {
        let mut menu = MenuMode::pause_menu(GAME);

        let (handled, requests) = send(&mut menu, key(KeyCode::Enter));

        assert!(handled);
        assert!(matches!(requests[..], [ModeRequest::Resume(handle)] if handle == GAME));
    }

    #[test]
    fn quit_requests_quit() {
        let mut menu = MenuMode::pause_menu(GAME);
        send(&mut menu, key(KeyCode::ArrowDown));

        let (handled, requests) = send(&mut menu, key(KeyCode::Space));

        assert!(handled);
        assert!(matches!(requests[..], [ModeRequest::Quit]));
    }

    #[test]
    fn other_events_are_not_handled() {
        let mut menu = MenuMode::pause_menu(GAME);

        let (handled, requests) = send(&mut menu, key(KeyCode::KeyW));

        assert!(!handled);
        assert!(requests.is_empty());
    }

    #[test]
    fn bounce_wraps_around() {
        let mut menu = MenuMode::pause_menu(GAME);
        let mut window = FakeWindow::default();
        let mut ctx = ModeContext::new(ModeId(8), &mut window);

        for _ in 0..100 {
            menu.update(0.037, &mut ctx);
            assert!((0.0..1.0).contains(&menu.bounce));
        }
    }

    #[test]
    fn draw_marks_only_the_selected_choice() {
        let mut menu = MenuMode::pause_menu(GAME);
        let metrics = MonospaceMetrics::default();
        let mut frame = Frame::new(WINDOW, &metrics);

        menu.draw(&mut frame);

        let labels: Vec<&str> = frame.overlay.iter().map(|item| item.text.as_str()).collect();
        assert_eq!(labels, vec!["PAUSED", SELECTOR, SELECTOR, "RESUME", "QUIT"]);
        let resume = &frame.overlay[3];
        assert_eq!(resume.color, SELECTED_COLOR);
        assert!(frame.overlay[1].anchor.x < resume.anchor.x);
        assert!(frame.overlay[2].anchor.x > -resume.anchor.x);
    }
}

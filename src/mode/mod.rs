//! Foreground application states and the stack the host keeps them in.
//!
//! Only the top mode receives events, updates and draws. Modes never swap
//! themselves in or out directly; they queue a [`ModeRequest`] on the
//! [`ModeContext`] and the [`ModeStack`] applies it once the call returns.

pub mod main_mode;
pub mod menu_mode;

use glam::UVec2;

use crate::input::InputEvent;
use crate::rendering::frame::Frame;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModeId(u64);

/// Capability to bring a paused mode back to the foreground. The stack stays
/// the owner of the mode; this only names it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResumeHandle(ModeId);

pub enum ModeRequest {
    Push(Box<dyn Mode>),
    /// Pops every mode above the one named by the handle.
    Resume(ResumeHandle),
    /// Empties the stack, which ends the application.
    Quit,
}

/// Window operations a mode may ask of the host.
pub trait WindowControl {
    fn set_relative_mouse(&mut self, enabled: bool);
}

pub struct ModeContext<'a> {
    current: ModeId,
    requests: Vec<ModeRequest>,
    window: &'a mut dyn WindowControl,
}

impl<'a> ModeContext<'a> {
    pub fn new(current: ModeId, window: &'a mut dyn WindowControl) -> Self {
        Self {
            current,
            requests: Vec::new(),
            window,
        }
    }

    /// A handle that resumes the mode currently being called.
    pub fn resume_handle(&self) -> ResumeHandle {
        ResumeHandle(self.current)
    }

    pub fn push(&mut self, mode: Box<dyn Mode>) {
        self.requests.push(ModeRequest::Push(mode));
    }

    pub fn resume(&mut self, handle: ResumeHandle) {
        self.requests.push(ModeRequest::Resume(handle));
    }

    pub fn quit(&mut self) {
        self.requests.push(ModeRequest::Quit);
    }

    pub fn set_relative_mouse(&mut self, enabled: bool) {
        self.window.set_relative_mouse(enabled);
    }

    pub fn into_requests(self) -> Vec<ModeRequest> {
        self.requests
    }
}

pub trait Mode {
    /// Called for each input event, possibly many times per frame or never.
    /// Returns `true` if the event was handled.
    fn handle_event(
        &mut self,
        event: &InputEvent,
        window_size: UVec2,
        ctx: &mut ModeContext,
    ) -> bool;

    /// Called once per frame after events, with the elapsed time in seconds.
    fn update(&mut self, elapsed: f32, ctx: &mut ModeContext);

    /// Called once per frame after update.
    fn draw(&mut self, frame: &mut Frame);

    /// A mode to draw underneath this one.
    fn background(&self) -> Option<ResumeHandle> {
        None
    }
}

#[derive(Default)]
pub struct ModeStack {
    modes: Vec<(ModeId, Box<dyn Mode>)>,
    next_id: u64,
}

impl ModeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mode: Box<dyn Mode>) -> ModeId {
        let id = ModeId(self.next_id);
        self.next_id += 1;
        self.modes.push((id, mode));
        log::debug!("Pushed mode {:?}, stack depth {}", id, self.modes.len());
        id
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    #[cfg(test)]
    pub fn top(&self) -> Option<ModeId> {
        self.modes.last().map(|(id, _)| *id)
    }

    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        window_size: UVec2,
        window: &mut dyn WindowControl,
    ) -> bool {
        let Some((id, mode)) = self.modes.last_mut() else {
            return false;
        };

        let mut ctx = ModeContext::new(*id, window);
        let handled = mode.handle_event(event, window_size, &mut ctx);
        self.apply(ctx.into_requests());
        handled
    }

    pub fn update(&mut self, elapsed: f32, window: &mut dyn WindowControl) {
        let Some((id, mode)) = self.modes.last_mut() else {
            return;
        };

        let mut ctx = ModeContext::new(*id, window);
        mode.update(elapsed, &mut ctx);
        self.apply(ctx.into_requests());
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let Some(top) = self.modes.len().checked_sub(1) else {
            return;
        };

        let background = self.modes[top]
            .1
            .background()
            .and_then(|handle| self.position(handle.0))
            .filter(|&index| index != top);

        if let Some(index) = background {
            frame.foreground = false;
            self.modes[index].1.draw(frame);
        }

        frame.foreground = true;
        self.modes[top].1.draw(frame);
    }

    fn position(&self, id: ModeId) -> Option<usize> {
        self.modes.iter().position(|(mode_id, _)| *mode_id == id)
    }

    fn apply(&mut self, requests: Vec<ModeRequest>) {
        for request in requests {
            match request {
                ModeRequest::Push(mode) => {
                    self.push(mode);
                }
                ModeRequest::Resume(ResumeHandle(id)) => match self.position(id) {
                    Some(index) => {
                        self.modes.truncate(index + 1);
                        log::debug!("Resumed mode {:?}, stack depth {}", id, self.modes.len());
                    }
                    None => log::warn!("Cannot resume mode {:?}, it is no longer on the stack", id),
                },
                ModeRequest::Quit => {
                    log::debug!("Quit requested, dropping {} modes", self.modes.len());
                    self.modes.clear();
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::rendering::frame::MonospaceMetrics;

    #[derive(Default)]
    pub(crate) struct FakeWindow {
        pub relative_mouse: Vec<bool>,
    }

    impl WindowControl for FakeWindow {
        fn set_relative_mouse(&mut self, enabled: bool) {
            self.relative_mouse.push(enabled);
        }
    }

    /// Records calls and optionally answers with a request.
    struct Probe {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        on_event: Option<fn(&mut ModeContext)>,
        background: Option<ResumeHandle>,
    }

    impl Probe {
        fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name,
                log: log.clone(),
                on_event: None,
                background: None,
            }
        }

        fn on_event(mut self, on_event: fn(&mut ModeContext)) -> Self {
            self.on_event = Some(on_event);
            self
        }
    }

    impl Mode for Probe {
        fn handle_event(&mut self, _: &InputEvent, _: UVec2, ctx: &mut ModeContext) -> bool {
            self.log.borrow_mut().push(format!("{} event", self.name));
            if let Some(on_event) = self.on_event {
                on_event(ctx);
            }
            true
        }

        fn update(&mut self, _: f32, _: &mut ModeContext) {
            self.log.borrow_mut().push(format!("{} update", self.name));
        }

        fn draw(&mut self, frame: &mut Frame) {
            self.log
                .borrow_mut()
                .push(format!("{} draw foreground={}", self.name, frame.foreground));
        }

        fn background(&self) -> Option<ResumeHandle> {
            self.background
        }
    }

    const MOTION: InputEvent = InputEvent::MouseMotion {
        xrel: 1.0,
        yrel: 0.0,
    };

    #[test]
    fn only_top_mode_receives_calls() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = ModeStack::new();
        let mut window = FakeWindow::default();
        stack.push(Box::new(Probe::new("game", &log)));
        stack.push(Box::new(Probe::new("menu", &log)));

        stack.handle_event(&MOTION, UVec2::new(800, 600), &mut window);
        stack.update(0.016, &mut window);
        let metrics = MonospaceMetrics::default();
        stack.draw(&mut Frame::new(UVec2::new(800, 600), &metrics));

        assert_eq!(
            *log.borrow(),
            vec!["menu event", "menu update", "menu draw foreground=true"]
        );
    }

    #[test]
    fn background_mode_is_drawn_first_and_not_foreground() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = ModeStack::new();
        let game = stack.push(Box::new(Probe::new("game", &log)));
        let mut menu = Probe::new("menu", &log);
        menu.background = Some(ResumeHandle(game));
        stack.push(Box::new(menu));

        let metrics = MonospaceMetrics::default();
        stack.draw(&mut Frame::new(UVec2::new(800, 600), &metrics));

        assert_eq!(
            *log.borrow(),
            vec!["game draw foreground=false", "menu draw foreground=true"]
        );
    }

    #[test]
    fn resume_pops_back_to_handle_owner() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = ModeStack::new();
        let mut window = FakeWindow::default();
        let game = stack.push(Box::new(Probe::new("game", &log)));
        stack.push(Box::new(Probe::new("overlay", &log)));
        // The first mode pushed always gets id 0
        let menu = Probe::new("menu", &log)
            .on_event(|ctx: &mut ModeContext| ctx.resume(ResumeHandle(ModeId(0))));
        stack.push(Box::new(menu));

        stack.handle_event(&MOTION, UVec2::new(800, 600), &mut window);

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top(), Some(game));
    }

    #[test]
    fn push_request_activates_new_mode() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = ModeStack::new();
        let mut window = FakeWindow::default();
        let game = Probe::new("game", &log).on_event(|ctx: &mut ModeContext| {
            let log = Rc::new(RefCell::new(Vec::new()));
            ctx.push(Box::new(Probe::new("pushed", &log)))
        });
        let game = stack.push(Box::new(game));

        stack.handle_event(&MOTION, UVec2::new(800, 600), &mut window);

        assert_eq!(stack.len(), 2);
        assert_ne!(stack.top(), Some(game));
    }

    #[test]
    fn quit_empties_the_stack() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = ModeStack::new();
        let mut window = FakeWindow::default();
        stack.push(Box::new(Probe::new("game", &log)));
        let menu = Probe::new("menu", &log).on_event(|ctx: &mut ModeContext| ctx.quit());
        stack.push(Box::new(menu));

        stack.handle_event(&MOTION, UVec2::new(800, 600), &mut window);

        assert!(stack.is_empty());
        assert!(!stack.handle_event(&MOTION, UVec2::new(800, 600), &mut window));
    }

    #[test]
    fn resuming_a_dropped_mode_is_ignored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = ModeStack::new();
        let mut window = FakeWindow::default();
        let menu = Probe::new("menu", &log)
            .on_event(|ctx: &mut ModeContext| ctx.resume(ResumeHandle(ModeId(99))));
        stack.push(Box::new(menu));

        stack.handle_event(&MOTION, UVec2::new(800, 600), &mut window);

        assert_eq!(stack.len(), 1);
    }
}

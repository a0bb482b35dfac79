//! Refresh and redraw loop
//!
//! The scheduler owns the runtime offsets, the current snapshot and layout.
//! Screen, clock and collector are injected so the loop can be driven tick by
//! tick without a terminal or a network.

use crate::collect::Collector;
use crate::config::MapperConfig;
use crate::layout::{compute_layout, Layout, Offsets};
use crate::render::compose;
use crate::snapshot::Snapshot;
use crate::terminal::Frame;
use crossterm::event::KeyCode;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Input the loop reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Key(KeyCode),
    Resize(u16, u16),
}

/// Where frames go and where input comes from
pub trait Screen {
    fn size(&self) -> io::Result<(u16, u16)>;
    fn present(&mut self, frame: &Frame) -> io::Result<()>;
    /// Zero-wait; `None` when nothing is pending
    fn poll_input(&mut self) -> io::Result<Option<Input>>;
}

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced
#[cfg(test)]
pub struct ManualClock {
    start: Instant,
    elapsed: std::cell::Cell<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: std::cell::Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Init,
    LayoutStale,
    Steady,
    Terminated,
}

pub struct Scheduler<S: Screen, C: Clock, K: Collector> {
    config: MapperConfig,
    screen: S,
    clock: C,
    collector: K,
    state: SchedulerState,
    offsets: Offsets,
    snapshot: Snapshot,
    layout: Option<Layout>,
    last_size: (u16, u16),
    last_refresh: Instant,
    force_refresh: bool,
    layout_computations: usize,
}

impl<S: Screen, C: Clock, K: Collector> Scheduler<S, C, K> {
    pub fn new(config: MapperConfig, screen: S, clock: C, collector: K) -> Self {
        let offsets = Offsets::from_config(&config);
        let snapshot = Snapshot::empty(&config.routes);
        let last_refresh = clock.now();
        Self {
            config,
            screen,
            clock,
            collector,
            state: SchedulerState::Init,
            offsets,
            snapshot,
            layout: None,
            last_size: (0, 0),
            last_refresh,
            force_refresh: false,
            layout_computations: 0,
        }
    }

    /// Tick until quit; terminal I/O errors end the loop
    pub fn run(&mut self) -> io::Result<()> {
        while self.tick()? != SchedulerState::Terminated {}
        tracing::info!("dashboard stopped");
        Ok(())
    }

    /// One pass: refresh if stale, re-layout if needed, then handle one input
    /// or sleep one quantum
    pub fn tick(&mut self) -> io::Result<SchedulerState> {
        if self.state == SchedulerState::Terminated {
            return Ok(self.state);
        }

        if self.state == SchedulerState::Init {
            self.refresh();
            self.state = SchedulerState::LayoutStale;
        }

        let size = self.screen.size()?;
        if size != self.last_size {
            self.state = SchedulerState::LayoutStale;
        }

        let stale = self.clock.now().saturating_duration_since(self.last_refresh)
            >= self.config.refresh_interval;
        if self.force_refresh || stale {
            self.refresh();
            if self.state == SchedulerState::Steady {
                self.redraw()?;
            }
        }

        if self.state == SchedulerState::LayoutStale {
            self.relayout(size);
            self.redraw()?;
            self.state = SchedulerState::Steady;
        }

        match self.screen.poll_input()? {
            Some(input) => self.handle_input(input),
            None => self.clock.sleep(self.config.tick),
        }

        Ok(self.state)
    }

    fn refresh(&mut self) {
        let fresh = self.collector.collect(&self.config.routes);
        let previous = std::mem::replace(&mut self.snapshot, fresh);
        tracing::debug!(
            replaced_after_secs = previous.fetched_at.elapsed().as_secs(),
            "snapshot replaced"
        );
        self.last_refresh = self.clock.now();
        self.force_refresh = false;
    }

    fn relayout(&mut self, size: (u16, u16)) {
        let (width, height) = size;
        self.layout = compute_layout(width, height, &self.config, self.offsets);
        self.last_size = size;
        self.layout_computations += 1;

        match &self.layout {
            Some(layout) => tracing::debug!(
                width,
                height,
                panel = layout.panel.is_some(),
                count = self.layout_computations,
                "layout recomputed"
            ),
            None => tracing::debug!(width, height, "terminal too small for the map"),
        }
    }

    fn redraw(&mut self) -> io::Result<()> {
        let (width, height) = self.last_size;
        let frame = compose(width, height, self.layout.as_ref(), &self.config, &self.snapshot);
        self.screen.present(&frame)
    }

    fn handle_input(&mut self, input: Input) {
        let code = match input {
            Input::Resize(..) => {
                self.state = SchedulerState::LayoutStale;
                return;
            }
            Input::Key(code) => code,
        };

        let offsets = &mut self.offsets;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.state = SchedulerState::Terminated;
                return;
            }
            KeyCode::Char('r') => {
                self.force_refresh = true;
                return;
            }
            KeyCode::Up | KeyCode::Char('k') => offsets.top = offsets.top.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => offsets.top = offsets.top.saturating_add(1),
            KeyCode::Left | KeyCode::Char('h') => offsets.left = offsets.left.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => offsets.left = offsets.left.saturating_add(1),
            KeyCode::Char('0') => *offsets = Offsets::from_config(&self.config),
            _ => return,
        }
        self.state = SchedulerState::LayoutStale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Place, RouteStatus};
    use std::collections::VecDeque;

    struct ScriptedScreen {
        size: (u16, u16),
        inputs: VecDeque<Input>,
        presented: usize,
        last_frame: Vec<String>,
    }

    impl ScriptedScreen {
        fn new(width: u16, height: u16) -> Self {
            Self {
                size: (width, height),
                inputs: VecDeque::new(),
                presented: 0,
                last_frame: Vec::new(),
            }
        }
    }

    impl Screen for ScriptedScreen {
        fn size(&self) -> io::Result<(u16, u16)> {
            Ok(self.size)
        }

        fn present(&mut self, frame: &Frame) -> io::Result<()> {
            let (_, h) = frame.size();
            self.last_frame = (0..h).map(|y| frame.row_text(y)).collect();
            self.presented += 1;
            Ok(())
        }

        fn poll_input(&mut self) -> io::Result<Option<Input>> {
            let input = self.inputs.pop_front();
            if let Some(Input::Resize(w, h)) = input {
                self.size = (w, h);
            }
            Ok(input)
        }
    }

    /// Odd route ids are down
    #[derive(Default)]
    struct FakeCollector {
        calls: usize,
    }

    impl Collector for FakeCollector {
        fn collect(&mut self, routes: &[u32]) -> Snapshot {
            self.calls += 1;
            let mut snapshot = Snapshot::empty(routes);
            let place = Place {
                city: Some("Oslo".into()),
                region: None,
                country: Some("NO".into()),
            };
            for status in snapshot.routes.iter_mut() {
                if status.id % 2 == 0 {
                    *status = RouteStatus::up(status.id, format!("192.0.2.{}", status.id), &place);
                }
            }
            snapshot
        }
    }

    type TestScheduler = Scheduler<ScriptedScreen, ManualClock, FakeCollector>;

    fn scheduler(width: u16, height: u16) -> TestScheduler {
        Scheduler::new(
            MapperConfig::default(),
            ScriptedScreen::new(width, height),
            ManualClock::new(),
            FakeCollector::default(),
        )
    }

    #[test]
    fn first_tick_collects_lays_out_and_draws() {
        let mut s = scheduler(80, 24);
        assert_eq!(s.tick().unwrap(), SchedulerState::Steady);
        assert_eq!(s.collector.calls, 1);
        assert_eq!(s.layout_computations, 1);
        assert_eq!(s.screen.presented, 1);
        assert!(s.layout.is_some());
    }

    #[test]
    fn resize_recomputes_layout_exactly_once() {
        let mut s = scheduler(80, 24);
        s.tick().unwrap();
        assert_eq!(s.layout_computations, 1);

        s.screen.inputs.push_back(Input::Resize(20, 10));
        s.tick().unwrap();
        for _ in 0..5 {
            s.tick().unwrap();
        }

        assert_eq!(s.layout_computations, 2);
        let map = s.layout.unwrap().map;
        assert_eq!((map.width, map.height), (16, 2));
        assert_eq!(s.screen.last_frame.len(), 10);
    }

    #[test]
    fn steady_ticks_do_not_relayout_or_redraw() {
        let mut s = scheduler(120, 40);
        for _ in 0..10 {
            s.tick().unwrap();
        }
        assert_eq!(s.layout_computations, 1);
        assert_eq!(s.screen.presented, 1);
        assert_eq!(s.collector.calls, 1);
    }

    #[test]
    fn refreshes_once_interval_elapses() {
        let mut s = scheduler(80, 24);
        s.tick().unwrap();

        // The tick itself slept 250ms
        s.clock.advance(Duration::from_secs(299));
        s.tick().unwrap();
        assert_eq!(s.collector.calls, 1);

        s.clock.advance(Duration::from_secs(1));
        s.tick().unwrap();
        assert_eq!(s.collector.calls, 2);
        assert_eq!(s.layout_computations, 1);
        assert_eq!(s.screen.presented, 2);
    }

    #[test]
    fn r_forces_refresh_on_next_tick() {
        let mut s = scheduler(80, 24);
        s.screen.inputs.push_back(Input::Key(KeyCode::Char('r')));
        s.tick().unwrap();
        assert_eq!(s.collector.calls, 1);
        s.tick().unwrap();
        assert_eq!(s.collector.calls, 2);
        s.tick().unwrap();
        assert_eq!(s.collector.calls, 2);
    }

    #[test]
    fn q_and_esc_terminate() {
        for key in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut s = scheduler(80, 24);
            s.screen.inputs.push_back(Input::Key(key));
            assert_eq!(s.tick().unwrap(), SchedulerState::Terminated);
            assert_eq!(s.tick().unwrap(), SchedulerState::Terminated);
            assert_eq!(s.collector.calls, 1);
        }
    }

    #[test]
    fn run_returns_after_quit() {
        let mut s = scheduler(80, 24);
        s.screen.inputs.extend([
            Input::Key(KeyCode::Char('x')),
            Input::Key(KeyCode::Char('q')),
        ]);
        s.run().unwrap();
        assert_eq!(s.state, SchedulerState::Terminated);
    }

    #[test]
    fn offset_keys_move_the_map_and_relayout() {
        let mut s = scheduler(120, 40);
        s.tick().unwrap();
        let before = s.layout.unwrap().map;

        s.screen.inputs.extend([
            Input::Key(KeyCode::Down),
            Input::Key(KeyCode::Char('l')),
        ]);
        s.tick().unwrap();
        s.tick().unwrap();
        s.tick().unwrap();

        assert_eq!(s.offsets, Offsets { top: 1, left: 2 });
        let after = s.layout.unwrap().map;
        assert_eq!((after.top, after.left), (before.top + 1, before.left + 1));
        assert_eq!(s.layout_computations, 3);

        s.screen.inputs.push_back(Input::Key(KeyCode::Char('0')));
        s.tick().unwrap();
        s.tick().unwrap();
        assert_eq!(s.offsets, Offsets::from_config(&MapperConfig::default()));
    }

    #[test]
    fn offsets_never_go_negative() {
        let mut s = scheduler(80, 24);
        s.screen.inputs.extend([
            Input::Key(KeyCode::Up),
            Input::Key(KeyCode::Left),
            Input::Key(KeyCode::Left),
        ]);
        for _ in 0..4 {
            s.tick().unwrap();
        }
        assert_eq!(s.offsets, Offsets { top: 0, left: 0 });
    }

    #[test]
    fn failed_routes_still_listed() {
        let mut s = scheduler(80, 24);
        s.tick().unwrap();
        assert_eq!(s.snapshot.routes.len(), 4);
        assert_eq!(s.snapshot.routes_up(), 2);

        let panel_rows: Vec<&String> = s
            .screen
            .last_frame
            .iter()
            .filter(|row| row.contains("DOWN") || row.contains("192.0.2."))
            .collect();
        assert_eq!(panel_rows.len(), 4);
    }

    #[test]
    fn tiny_terminal_draws_blank_frame() {
        let mut s = scheduler(3, 1);
        s.tick().unwrap();
        assert!(s.layout.is_none());
        assert_eq!(s.screen.last_frame, vec!["   ".to_string()]);
    }
}

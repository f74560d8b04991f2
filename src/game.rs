use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::{
    io,
    time::{Duration, Instant},
};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Flex, Layout, Margin, Rect},
    style::Style,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, BorderType, Borders, Clear, Paragraph,
    },
    Frame,
};
use tui_big_text::{BigText, PixelSize};

use crate::{
    game_theme::GameTheme,
    helpers::{centered_rect, centered_rect_with_percentage},
    sim::{FallDown, Steer, HEIGHT, WIDTH},
};

/// Simulation ticks (and render passes) per second.
pub const TICK_RATE: u64 = 100;

// Braille packs 2x4 dots per cell, so the 80x140 field needs 40x35 cells
// plus the border.
const FIELD_COLS: u16 = 42;
const FIELD_ROWS: u16 = 37;

pub const MIN_COLS: u16 = 48;
pub const MIN_ROWS: u16 = FIELD_ROWS + 3;

/// Terminals without the kitty protocol never report key releases; in that
/// case a key only counts as held while autorepeat keeps refreshing it.
const REPEAT_GRACE: Duration = Duration::from_millis(150);

#[derive(Debug)]
struct KeyHold {
    down: bool,
    last_seen: Instant,
}

impl KeyHold {
    fn new() -> Self {
        Self {
            down: false,
            last_seen: Instant::now(),
        }
    }

    fn press(&mut self) {
        self.down = true;
        self.last_seen = Instant::now();
    }

    fn release(&mut self) {
        self.down = false;
    }

    fn active(&self, release_events: bool) -> bool {
        if release_events {
            self.down
        } else {
            self.down && self.last_seen.elapsed() < REPEAT_GRACE
        }
    }
}

#[derive(Debug)]
struct InputTracker {
    left: KeyHold,
    right: KeyHold,
    release_events: bool,
}

impl InputTracker {
    fn new(release_events: bool) -> Self {
        Self {
            left: KeyHold::new(),
            right: KeyHold::new(),
            release_events,
        }
    }

    fn press(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('a') => self.left.press(),
            KeyCode::Right | KeyCode::Char('d') => self.right.press(),
            _ => {}
        }
    }

    fn release(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('a') => self.left.release(),
            KeyCode::Right | KeyCode::Char('d') => self.right.release(),
            _ => {}
        }
    }

    // Left wins when both directions are active.
    fn steer(&self) -> Steer {
        if self.left.active(self.release_events) {
            Steer::Left
        } else if self.right.active(self.release_events) {
            Steer::Right
        } else {
            Steer::Neutral
        }
    }
}

#[derive(Debug)]
pub struct Game {
    // one FallDown per run; restart swaps in a fresh one
    sim: FallDown,
    theme: GameTheme,
    input: InputTracker,
    is_paused: bool,
    should_exit: bool,
}

impl Game {
    pub fn new(release_events: bool) -> Self {
        Self {
            sim: FallDown::new(),
            theme: GameTheme::Monokai,
            input: InputTracker::new(release_events),
            is_paused: false,
            should_exit: false,
        }
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// One pass of the frame loop: drain input, then advance the sim once.
    /// Returns false once the player asked to quit.
    pub fn game_loop(&mut self) -> io::Result<bool> {
        self.handle_events()?;
        if self.should_exit {
            return Ok(false);
        }
        if !self.is_paused {
            // Keeps ticking after a win; the flag is one-way and the motion
            // is purely cosmetic by then.
            self.sim.tick(self.input.steer());
        }
        Ok(true)
    }

    pub fn handle_events(&mut self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key_event) => self.handle_key_event(key_event),
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event.kind {
            // Command keys react to the initial press only, so autorepeat
            // cannot spam pause toggles or restarts.
            KeyEventKind::Press => match key_event.code {
                KeyCode::Esc | KeyCode::Char('q') => self.should_exit = true,
                KeyCode::Char('p') => self.is_paused = !self.is_paused,
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('t') => self.cycle_theme(),
                code => self.input.press(code),
            },
            KeyEventKind::Repeat => self.input.press(key_event.code),
            KeyEventKind::Release => self.input.release(key_event.code),
        }
    }

    fn restart(&mut self) {
        self.sim = FallDown::new();
        self.is_paused = false;
    }

    fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            GameTheme::Monokai => GameTheme::Dracula,
            GameTheme::Dracula => GameTheme::Nord,
            GameTheme::Nord => GameTheme::HighContrast,
            GameTheme::HighContrast => GameTheme::Monokai,
        };
    }

    pub fn draw(&self, frame: &mut Frame) {
        let colors = self.theme.colors();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Fill(1),   // playfield
                Constraint::Length(3), // controls bar
            ])
            .split(frame.area());

        let field = centered_rect(FIELD_COLS, FIELD_ROWS, layout[0].width, layout[0].height);

        // Ratatui only rewrites cells a widget touches, so without this
        // Clear the previous frame's dots bleed back in as ghosts.
        frame.render_widget(Clear, field);

        let block = Block::default()
            .title(" terminal.falldown ")
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .style(Style::default().fg(colors.border).bg(colors.background))
            .title_alignment(Alignment::Center);

        if self.sim.won() {
            frame.render_widget(block, field);
            self.draw_win_banner(frame, field);
        } else {
            let canvas = Canvas::default()
                .block(block)
                .marker(Marker::Braille)
                .x_bounds([0.0, WIDTH])
                .y_bounds([0.0, HEIGHT])
                .paint(|ctx| {
                    // Canvas y points up, the sim's y points down.
                    for line in self.sim.gap_lines() {
                        let y = HEIGHT - line.y;
                        ctx.draw(&CanvasLine {
                            x1: line.x1,
                            y1: y,
                            x2: line.x2,
                            y2: y,
                            color: colors.line,
                        });
                        if line.x3 < line.x4 {
                            ctx.draw(&CanvasLine {
                                x1: line.x3,
                                y1: y,
                                x2: line.x4,
                                y2: y,
                                color: colors.line,
                            });
                        }
                    }

                    let ball = self.sim.ball();
                    let cy = HEIGHT - ball.y;
                    let reach = ball.r.round() as i32;
                    let mut fill = Vec::new();
                    for dy in -reach..=reach {
                        for dx in -reach..=reach {
                            if ((dx * dx + dy * dy) as f64) < ball.r * ball.r {
                                fill.push((ball.x + dx as f64, cy + dy as f64));
                            }
                        }
                    }
                    ctx.draw(&Points {
                        coords: &fill,
                        color: ball.color,
                    });
                    ctx.draw(&Circle {
                        x: ball.x,
                        y: cy,
                        radius: ball.r,
                        color: ball.color,
                    });
                });
            frame.render_widget(canvas, field);
        }

        let controls = Paragraph::new(" ←/→ steer | p pause | r restart | q quit ")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(colors.border)),
            )
            .style(Style::default().fg(colors.text))
            .alignment(Alignment::Center);
        frame.render_widget(controls, layout[1]);

        if self.is_paused {
            self.draw_pause_popup(frame);
        }
    }

    fn draw_win_banner(&self, frame: &mut Frame, field: Rect) {
        let colors = self.theme.colors();
        let inner = field.inner(Margin::new(1, 1));

        let [banner_area, hint_area] =
            Layout::vertical([Constraint::Length(7), Constraint::Length(1)])
                .flex(Flex::Center)
                .areas(inner);

        let banner = BigText::builder()
            .pixel_size(PixelSize::Sextant)
            .style(Style::default().fg(colors.accent))
            .lines(vec!["YOU".into(), "WIN !".into()])
            .alignment(Alignment::Center)
            .build();
        frame.render_widget(banner, banner_area);

        let hint = Paragraph::new("r to fall again, q to quit")
            .style(Style::default().fg(colors.text))
            .alignment(Alignment::Center);
        frame.render_widget(hint, hint_area);
    }

    fn draw_pause_popup(&self, frame: &mut Frame) {
        let colors = self.theme.colors();
        let area = frame.area();
        let popup_area = centered_rect(26, 3, area.width, area.height);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new("p to resume")
            .block(
                Block::default()
                    .title(" paused ")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .style(Style::default().fg(colors.accent))
                    .title_alignment(Alignment::Center),
            )
            .style(Style::default().fg(colors.text))
            .alignment(Alignment::Center);
        frame.render_widget(popup, popup_area);
    }

    pub fn draw_resize_warning(&self, frame: &mut Frame) {
        let colors = self.theme.colors();
        let area = frame.area();
        let popup_area = centered_rect_with_percentage(60, 20, area.width, area.height);
        let warning = Paragraph::new(format!(
            "terminal too small\nneeds at least {MIN_COLS}x{MIN_ROWS}"
        ))
        .block(
            Block::default()
                .title(" warning ")
                .borders(Borders::ALL)
                .border_type(BorderType::Thick),
        )
        .style(Style::default().fg(colors.accent))
        .alignment(Alignment::Center);
        frame.render_widget(warning, popup_area);
    }
}

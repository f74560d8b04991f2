use std::{
    io,
    thread::sleep,
    time::{Duration, Instant},
};

use crossterm::{
    event::{
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use ratatui::DefaultTerminal;

mod game;
mod game_theme;
mod helpers;
mod sim;

use crate::game::{Game, MIN_COLS, MIN_ROWS, TICK_RATE};

struct App {
    game: Game,
}

impl App {
    fn new(release_events: bool) -> Self {
        Self {
            game: Game::new(release_events),
        }
    }

    fn run(&mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
        let frame_budget = Duration::from_millis(1000 / TICK_RATE);

        loop {
            let frame_start = Instant::now();

            let size = terminal.size()?;
            if size.width < MIN_COLS || size.height < MIN_ROWS {
                // Keep polling so quit still works while the warning is up.
                self.game.handle_events()?;
                if self.game.should_exit() {
                    return Ok(());
                }
                terminal.draw(|frame| self.game.draw_resize_warning(frame))?;
                sleep(Duration::from_millis(100));
                continue;
            }

            if !self.game.game_loop()? {
                return Ok(());
            }
            terminal.draw(|frame| self.game.draw(frame))?;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_budget {
                sleep(frame_budget - elapsed);
            }
        }
    }
}

fn main() -> io::Result<()> {
    let terminal = ratatui::init();

    // Key-release reporting needs the kitty keyboard protocol; fall back to
    // autorepeat tracking on terminals that lack it.
    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    let mut stdout = io::stdout();
    if release_events {
        stdout.execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
    }

    let mut app = App::new(release_events);
    let app_result = app.run(terminal);

    if release_events {
        let _ = stdout.execute(PopKeyboardEnhancementFlags);
    }
    ratatui::restore();

    match &app_result {
        Ok(()) => println!("Thanks for playing terminal.falldown! ⏬"),
        Err(e) => eprintln!("Game ended with error: {}", e),
    }

    app_result
}

use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::style::Color;

/// Playfield width in field units.
pub const WIDTH: f64 = 80.0;
/// Playfield height in field units.
pub const HEIGHT: f64 = 140.0;
/// Top of the playable corridor; lines are recycled once they scroll one
/// spacing above this.
pub const PLAY_MIN_Y: f64 = 20.0;

/// Round to two decimals. Edge coordinates are compared across frames, so
/// they are kept at a fixed precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub color: Color,
}

impl Ball {
    pub const RADIUS: f64 = 3.0;
    pub const MOVE_SPEED: f64 = 0.9;
    pub const FALL_SPEED: f64 = 0.5;

    const DEFAULT_X: f64 = 5.0;
    const DEFAULT_Y: f64 = 5.0;
    const DEFAULT_COLOR: Color = Color::Rgb(255, 95, 135);

    pub fn new() -> Self {
        Self {
            x: Self::DEFAULT_X,
            y: Self::DEFAULT_Y,
            r: Self::RADIUS,
            color: Self::DEFAULT_COLOR,
        }
    }

    /// Bottom of the bounding circle, rounded to two decimals.
    pub fn bottom_edge(&self) -> f64 {
        round2(self.y + self.r)
    }

    pub fn left_edge(&self) -> f64 {
        round2(self.x - self.r)
    }

    pub fn right_edge(&self) -> f64 {
        round2(self.x + self.r)
    }

    /// Commit a new position. Each provided axis is clamped so the whole
    /// circle stays inside the field; an omitted axis is left untouched.
    pub fn reposition(&mut self, x: Option<f64>, y: Option<f64>) {
        if let Some(x) = x {
            self.x = x.clamp(self.r, WIDTH - self.r - 1.0);
        }
        if let Some(y) = y {
            self.y = y.clamp(self.r, HEIGHT - self.r - 1.0);
        }
    }

    pub fn shift_x(&mut self, speed: f64) {
        self.reposition(Some(self.x + speed), None);
    }

    pub fn shift_y(&mut self, speed: f64) {
        self.reposition(None, Some(self.y + speed));
    }

    /// Sit the ball on top of a line: bottom edge exactly on the line's y.
    pub fn rest_on(&mut self, line: &GapLine) {
        self.y = line.y - self.r;
    }
}

/// One horizontal barrier. Solid from `x1..x2` and from `x3..x4`; the ball
/// can only pass through the opening between `x2` and `x3`.
#[derive(Debug, Clone)]
pub struct GapLine {
    pub x1: f64,
    pub x2: f64,
    pub x3: f64,
    pub x4: f64,
    pub y: f64,
}

impl GapLine {
    pub const GAP_WIDTH: f64 = Ball::RADIUS * 4.0;
    pub const UP_SPEED: f64 = 0.1;

    /// Build a line at `y` with a uniformly random integer gap start in
    /// `[gap_width, WIDTH - gap_width]` inclusive. The gap can end flush
    /// with the right wall, leaving a zero-length right segment.
    pub fn generate(y: f64, gap_width: f64, rng: &mut impl Rng) -> Self {
        let gap_start = rng.random_range(gap_width as i64..=(WIDTH - gap_width) as i64) as f64;
        Self {
            x1: 0.0,
            x2: gap_start,
            x3: gap_start + gap_width,
            x4: WIDTH,
            y,
        }
    }

    pub fn scroll_up(&mut self, speed: f64) {
        self.y -= speed;
    }

    /// True when the ball is about to cross this line over solid track.
    ///
    /// Height: the ball's bottom edge is within one radius of the line.
    /// Horizontal: a deliberately loose OR. It only fails when both edges
    /// sit strictly inside the gap, so any overlap with a solid segment
    /// counts as standing on it.
    pub fn touches(&self, ball: &Ball) -> bool {
        let over_solid = ball.left_edge() < self.x2 || ball.right_edge() > self.x3;
        let at_line = round2(ball.bottom_edge() - self.y).abs() < ball.r;
        over_solid && at_line
    }
}

/// Horizontal input for one tick. When both keys are down the input layer
/// resolves to `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Neutral,
    Right,
}

impl Steer {
    pub fn dx(self) -> f64 {
        match self {
            Steer::Left => -1.0,
            Steer::Neutral => 0.0,
            Steer::Right => 1.0,
        }
    }
}

/// The whole simulation: one ball, a top-to-bottom window of gap lines, and
/// a one-way win flag. Fully deterministic for a given seed.
#[derive(Debug)]
pub struct FallDown {
    ball: Ball,
    gap_lines: VecDeque<GapLine>,
    win: bool,
    rng: StdRng,
}

impl FallDown {
    pub const LINE_GAP: f64 = Ball::RADIUS * 4.0;

    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        assert!(
            GapLine::GAP_WIDTH * 2.0 <= WIDTH,
            "gap width {} does not fit the field twice over",
            GapLine::GAP_WIDTH
        );

        let mut rng = StdRng::seed_from_u64(seed);
        let mut gap_lines = VecDeque::new();
        let mut y = PLAY_MIN_Y;
        while y < HEIGHT + Self::LINE_GAP {
            gap_lines.push_back(GapLine::generate(y, GapLine::GAP_WIDTH, &mut rng));
            y += Self::LINE_GAP;
        }

        Self {
            ball: Ball::new(),
            gap_lines,
            win: false,
            rng,
        }
    }

    /// Advance one frame: scroll and recycle lines, rest the ball on any
    /// touching line, apply the fall, apply steering, then check for a win.
    pub fn tick(&mut self, steer: Steer) {
        self.scroll_gap_lines();
        self.drop_ball();
        self.ball.shift_x(steer.dx() * Ball::MOVE_SPEED);
        self.check_win();
    }

    fn scroll_gap_lines(&mut self) {
        for line in &mut self.gap_lines {
            line.scroll_up(GapLine::UP_SPEED);
        }

        // Lines stay sorted by y, so only the front can go stale. Each stale
        // line moves to the bottom of the window as a fresh random line.
        while self
            .gap_lines
            .front()
            .is_some_and(|line| line.y < PLAY_MIN_Y - Self::LINE_GAP)
        {
            self.gap_lines.pop_front();
            if let Some(last_y) = self.gap_lines.back().map(|line| line.y) {
                self.gap_lines.push_back(GapLine::generate(
                    last_y + Self::LINE_GAP,
                    GapLine::GAP_WIDTH,
                    &mut self.rng,
                ));
            }
        }
    }

    fn drop_ball(&mut self) {
        // Every line is tested, oldest first; the last touching line wins.
        for line in &self.gap_lines {
            if line.touches(&self.ball) {
                self.ball.rest_on(line);
            }
        }
        self.ball.shift_y(Ball::FALL_SPEED);
    }

    fn check_win(&mut self) {
        if self.ball.y >= HEIGHT - self.ball.r * 2.0 {
            self.win = true;
        }
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn gap_lines(&self) -> impl Iterator<Item = &GapLine> {
        self.gap_lines.iter()
    }

    pub fn won(&self) -> bool {
        self.win
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line_with_gap(gap_start: f64, y: f64) -> GapLine {
        GapLine {
            x1: 0.0,
            x2: gap_start,
            x3: gap_start + GapLine::GAP_WIDTH,
            x4: WIDTH,
            y,
        }
    }

    /// Chase the gap of the nearest line below the ball, with a small dead
    /// band so the ball settles well inside the opening.
    fn steer_toward_next_gap(sim: &FallDown) -> Steer {
        let ball = sim.ball();
        let Some(target) = sim.gap_lines().find(|line| line.y > ball.y) else {
            return Steer::Neutral;
        };
        let center = (target.x2 + target.x3) / 2.0;
        if ball.x < center - 1.0 {
            Steer::Right
        } else if ball.x > center + 1.0 {
            Steer::Left
        } else {
            Steer::Neutral
        }
    }

    #[test]
    fn edges_round_to_two_decimals() {
        let mut ball = Ball::new();
        ball.reposition(Some(5.123), Some(10.007));
        assert_eq!(ball.left_edge(), 2.12);
        assert_eq!(ball.right_edge(), 8.12);
        assert_eq!(ball.bottom_edge(), 13.01);
    }

    #[test]
    fn reposition_leaves_an_omitted_axis_alone() {
        let mut ball = Ball::new();
        ball.reposition(Some(40.0), None);
        assert_eq!(ball.x, 40.0);
        assert_eq!(ball.y, 5.0);
        ball.reposition(None, Some(70.0));
        assert_eq!(ball.x, 40.0);
        assert_eq!(ball.y, 70.0);
    }

    #[test]
    fn resting_puts_the_bottom_edge_on_the_line() {
        let line = line_with_gap(30.0, 100.0);
        let mut ball = Ball::new();
        ball.rest_on(&line);
        assert_eq!(ball.bottom_edge(), line.y);
    }

    #[test]
    fn touch_needs_the_height_band_and_solid_overlap() {
        let line = line_with_gap(30.0, 100.5);

        // Right edge (43) reaches past the gap end (42): standing on track.
        let mut ball = Ball::new();
        ball.reposition(Some(40.0), Some(100.0));
        assert!(line.touches(&ball));
        // Pure predicate, same answer every time.
        assert!(line.touches(&ball));

        // Both edges strictly inside [30, 42]: free to fall.
        ball.reposition(Some(36.0), None);
        assert!(!line.touches(&ball));

        // Solid overlap but nowhere near the line's height.
        ball.reposition(Some(40.0), Some(80.0));
        assert!(!line.touches(&ball));
    }

    #[test]
    fn initial_lines_cover_the_field_top_to_bottom() {
        let sim = FallDown::with_seed(7);
        let lines: Vec<&GapLine> = sim.gap_lines().collect();
        let expected = ((HEIGHT - PLAY_MIN_Y) / FallDown::LINE_GAP) as usize + 1;
        assert_eq!(lines.len(), expected);
        assert_eq!(lines[0].y, PLAY_MIN_Y);
        for pair in lines.windows(2) {
            assert_eq!(pair[1].y - pair[0].y, FallDown::LINE_GAP);
        }
    }

    #[test]
    fn long_runs_keep_the_line_window_in_place() {
        let mut sim = FallDown::with_seed(42);
        let count = sim.gap_lines().count();
        for _ in 0..5_000 {
            sim.tick(Steer::Neutral);
        }
        assert_eq!(sim.gap_lines().count(), count);
        let first = sim.gap_lines().next().unwrap();
        let last = sim.gap_lines().last().unwrap();
        assert!(first.y >= PLAY_MIN_Y - FallDown::LINE_GAP - 1e-6);
        assert!(last.y >= HEIGHT - FallDown::LINE_GAP - 1e-6);
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = FallDown::with_seed(5);
        let mut b = FallDown::with_seed(5);
        for _ in 0..500 {
            a.tick(Steer::Neutral);
            b.tick(Steer::Neutral);
        }
        assert_eq!(a.ball().x, b.ball().x);
        assert_eq!(a.ball().y, b.ball().y);
        let gaps_a: Vec<f64> = a.gap_lines().map(|line| line.x2).collect();
        let gaps_b: Vec<f64> = b.gap_lines().map(|line| line.x2).collect();
        assert_eq!(gaps_a, gaps_b);
    }

    #[test]
    fn parked_ball_rides_the_lines_and_never_wins() {
        // Gap starts are never closer than GAP_WIDTH to a wall, so a ball
        // hugging the left wall always overlaps solid track and gets carried
        // back up by every line it meets.
        let mut sim = FallDown::with_seed(77);
        for _ in 0..1_000 {
            sim.tick(Steer::Neutral);
        }
        assert!(!sim.won());
        assert!(sim.ball().y < PLAY_MIN_Y * 2.0);
    }

    #[test]
    fn steering_left_never_leaves_the_field() {
        let mut sim = FallDown::with_seed(9);
        for _ in 0..200 {
            sim.tick(Steer::Left);
            assert!(sim.ball().x >= Ball::RADIUS);
        }
        assert_eq!(sim.ball().x, Ball::RADIUS);
    }

    #[test]
    fn steered_ball_falls_to_the_bottom_and_wins() {
        let mut sim = FallDown::with_seed(1234);
        let mut won_at = None;
        for t in 0..20_000 {
            let steer = steer_toward_next_gap(&sim);
            sim.tick(steer);
            if sim.won() {
                won_at = Some(t);
                break;
            }
        }
        assert!(won_at.is_some(), "ball never reached the bottom");
        assert!(sim.ball().y >= HEIGHT - sim.ball().r * 2.0);

        // The flag is one-way: keep running, it must stay set.
        for _ in 0..200 {
            sim.tick(Steer::Neutral);
            assert!(sim.won());
        }
    }

    proptest! {
        #[test]
        fn clamp_commits_the_nearest_bound(x in -60.0f64..140.0, y in -60.0f64..200.0) {
            let mut ball = Ball::new();
            ball.reposition(Some(x), Some(y));

            let (min_x, max_x) = (Ball::RADIUS, WIDTH - Ball::RADIUS - 1.0);
            if x <= min_x {
                prop_assert_eq!(ball.x, min_x);
            } else if x >= max_x {
                prop_assert_eq!(ball.x, max_x);
            } else {
                prop_assert_eq!(ball.x, x);
            }

            let (min_y, max_y) = (Ball::RADIUS, HEIGHT - Ball::RADIUS - 1.0);
            if y <= min_y {
                prop_assert_eq!(ball.y, min_y);
            } else if y >= max_y {
                prop_assert_eq!(ball.y, max_y);
            } else {
                prop_assert_eq!(ball.y, y);
            }
        }

        #[test]
        fn generated_gaps_stay_inside_the_field(seed in any::<u64>(), y in 0.0f64..200.0) {
            let mut rng = StdRng::seed_from_u64(seed);
            let line = GapLine::generate(y, GapLine::GAP_WIDTH, &mut rng);
            prop_assert_eq!(line.x1, 0.0);
            prop_assert_eq!(line.x4, WIDTH);
            prop_assert!(line.x2 >= GapLine::GAP_WIDTH);
            prop_assert!(line.x2 <= WIDTH - GapLine::GAP_WIDTH);
            prop_assert_eq!(line.x3 - line.x2, GapLine::GAP_WIDTH);
            prop_assert_eq!(line.x2.fract(), 0.0);
            prop_assert_eq!(line.y, y);
        }

        #[test]
        fn ticking_preserves_line_count_and_spacing(seed in any::<u64>(), ticks in 0usize..2_000) {
            let mut sim = FallDown::with_seed(seed);
            let count = sim.gap_lines().count();
            for _ in 0..ticks {
                sim.tick(Steer::Neutral);
            }
            prop_assert_eq!(sim.gap_lines().count(), count);
            let ys: Vec<f64> = sim.gap_lines().map(|line| line.y).collect();
            for pair in ys.windows(2) {
                prop_assert!((pair[1] - pair[0] - FallDown::LINE_GAP).abs() < 1e-6);
            }
        }
    }
}

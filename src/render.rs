//! Scene drawing.
//!
//! The scene is composed into a [`Frame`] of characters first and written to
//! the terminal in one pass, so drawing code never touches the terminal and
//! a partially drawn frame is never visible.

use std::io::{self, Write};

use crossterm::{cursor, queue, style::Print};

use crate::config::RunnerConfig;
use crate::game::{GameState, Mode};
use crate::geometry::Rect;

pub const PLAYER_GLYPH: char = '@';
pub const GROUND_GLYPH: char = '_';

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    cols: u16,
    rows: u16,
    cells: Vec<char>,
}

impl Frame {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Frame {
            cols,
            rows,
            cells: vec![' '; cols as usize * rows as usize],
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    pub fn get(&self, col: u16, row: u16) -> Option<char> {
        (col < self.cols && row < self.rows).then(|| self.cells[self.index(col, row)])
    }

    pub fn put(&mut self, col: i32, row: i32, ch: char) {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return;
        }
        let idx = self.index(col as u16, row as u16);
        self.cells[idx] = ch;
    }

    pub fn text(&mut self, col: i32, row: i32, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i32, row, ch);
        }
    }

    /// Writes `text` horizontally centred on `row`.
    pub fn text_centered(&mut self, row: i32, text: &str) {
        let len = text.chars().count() as i32;
        self.text((self.cols as i32 - len) / 2, row, text);
    }

    pub fn row_string(&self, row: u16) -> String {
        let start = row as usize * self.cols as usize;
        self.cells[start..start + self.cols as usize].iter().collect()
    }

    fn index(&self, col: u16, row: u16) -> usize {
        row as usize * self.cols as usize + col as usize
    }
}

/// Maps world pixels onto frame cells.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn new(config: &RunnerConfig, frame: &Frame) -> Self {
        Viewport {
            sx: frame.cols() as f32 / config.world_width,
            sy: frame.rows() as f32 / config.world_height,
        }
    }

    fn row(&self, y: f32) -> i32 {
        (y * self.sy).floor() as i32
    }

    /// Cell span covered by `rect`; never narrower than one cell.
    fn cells(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let c0 = (rect.x * self.sx).floor() as i32;
        let r0 = (rect.y * self.sy).floor() as i32;
        let c1 = ((rect.right() * self.sx).ceil() as i32).max(c0 + 1);
        let r1 = ((rect.bottom() * self.sy).ceil() as i32).max(r0 + 1);
        (c0, r0, c1, r1)
    }
}

fn fill_rect(frame: &mut Frame, view: &Viewport, rect: &Rect, glyph: char) {
    let (c0, r0, c1, r1) = view.cells(rect);
    let (cols, rows) = (frame.cols() as i32, frame.rows() as i32);
    for row in r0.max(0)..r1.min(rows) {
        for col in c0.max(0)..c1.min(cols) {
            frame.put(col, row, glyph);
        }
    }
}

pub fn draw_scene(frame: &mut Frame, state: &GameState, config: &RunnerConfig) {
    let view = Viewport::new(config, frame);
    frame.clear();
    draw_ground(frame, &view, config);
    draw_player(frame, &view, state);
    draw_obstacles(frame, &view, state);
    draw_score(frame, state);
    match state.mode {
        Mode::NotStarted => draw_title(frame),
        Mode::Ended => draw_game_over(frame, state),
        Mode::Running => {}
    }
}

fn draw_ground(frame: &mut Frame, view: &Viewport, config: &RunnerConfig) {
    let row = view.row(config.ground_y).min(frame.rows() as i32 - 1);
    for col in 0..frame.cols() as i32 {
        frame.put(col, row, GROUND_GLYPH);
    }
}

fn draw_player(frame: &mut Frame, view: &Viewport, state: &GameState) {
    fill_rect(frame, view, &state.player.rect(), PLAYER_GLYPH);
}

fn draw_obstacles(frame: &mut Frame, view: &Viewport, state: &GameState) {
    for obstacle in &state.obstacles {
        fill_rect(frame, view, &obstacle.rect(), obstacle.glyph);
    }
}

fn draw_score(frame: &mut Frame, state: &GameState) {
    frame.text(1, 0, &format!("Score: {}", state.score));
    let best = format!("Best: {}", state.best_score);
    frame.text(frame.cols() as i32 - best.chars().count() as i32 - 1, 0, &best);
}

fn draw_title(frame: &mut Frame) {
    let mid = frame.rows() as i32 / 2;
    frame.text_centered(mid - 1, "SINEAI RUNNER");
    frame.text_centered(mid + 1, "Press SPACE to start, Q to quit");
}

fn draw_game_over(frame: &mut Frame, state: &GameState) {
    let mid = frame.rows() as i32 / 2;
    frame.text_centered(mid - 2, "GAME OVER");
    if let Some(message) = &state.message {
        frame.text_centered(mid - 1, message);
    }
    frame.text_centered(mid, &format!("Score: {}  Best: {}", state.score, state.best_score));
    frame.text_centered(mid + 2, "SPACE to restart, Q to quit");
}

/// Writes every row of `frame` to `out` and flushes once.
pub fn flush(frame: &Frame, out: &mut impl Write) -> io::Result<()> {
    for row in 0..frame.rows() {
        queue!(out, cursor::MoveTo(0, row), Print(frame.row_string(row)))?;
    }
    out.flush()
}

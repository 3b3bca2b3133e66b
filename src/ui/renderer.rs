/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Tiles are drawn at their continuous positions, scaled from board
/// units to terminal cells, so the renderer doubles as the animation
/// surface for the step loop.

use std::io::{self, BufWriter, Write};
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use slide2048::domain::geometry::{Geometry, Position};
use slide2048::domain::tile::Tile;
use slide2048::sim::observer::StepObserver;

use super::palette;

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    /// Different from any real glyph, so every position will be diff'd.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// `Color::Reset` backgrounds become `BASE_BG` so every glyph carries
    /// an explicit color.
    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.glyphs = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, glyph: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = glyph;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_rect(&mut self, rect: Rect, bg: Color) {
        for y in rect.y..rect.y + rect.h {
            for x in rect.x..rect.x + rect.w {
                self.set(x, y, Glyph::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Layout ──

/// Terminal columns / rows per board cell, grid line included.
const SLOT_W: usize = 8;
const SLOT_H: usize = 4;

const HUD_ROW: usize = 0;
const BOARD_X: usize = 2;
const BOARD_Y: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Rect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

/// Terminal rectangle covering a tile at `pos`, inside the grid lines.
fn tile_rect(geometry: &Geometry, pos: Position) -> Rect {
    let col = (pos.x / geometry.cell_width * SLOT_W as f64).round().max(0.0) as usize;
    let row = (pos.y / geometry.cell_height * SLOT_H as f64).round().max(0.0) as usize;
    Rect { x: BOARD_X + col + 1, y: BOARD_Y + row + 1, w: SLOT_W - 1, h: SLOT_H - 1 }
}

fn board_rect(geometry: &Geometry) -> Rect {
    Rect { x: BOARD_X, y: BOARD_Y, w: geometry.cols * SLOT_W + 1, h: geometry.rows * SLOT_H + 1 }
}

/// Header numbers shown above the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Hud {
    pub best: u32,
    pub moves: u32,
    pub game_over: bool,
}

fn hud_line(hud: &Hud) -> String {
    format!("slide2048   best {}   moves {}", hud.best, hud.moves)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.glyphs.fill(Glyph::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, geometry: &Geometry, tiles: &[Tile], hud: &Hud) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.glyphs.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_hud(hud);
        self.compose_board(geometry, tiles);
        if hud.game_over {
            self.compose_game_over(geometry);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Glyph::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let glyph = self.front.get(x, y);
                if glyph == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if glyph.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(glyph.fg))?;
                    last_fg = glyph.fg;
                }
                if glyph.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(glyph.bg))?;
                    last_bg = glyph.bg;
                }
                queue!(self.writer, Print(glyph.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, hud: &Hud) {
        self.front.put_str(BOARD_X, HUD_ROW, &hud_line(hud), palette::HUD, Color::Reset);
    }

    fn compose_board(&mut self, geometry: &Geometry, tiles: &[Tile]) {
        let board = board_rect(geometry);
        self.front.fill_rect(board, palette::OUTLINE);
        for cell in geometry.cells() {
            let slot = tile_rect(geometry, geometry.origin_of(cell));
            self.front.fill_rect(slot, palette::BACKGROUND);
        }

        for tile in tiles {
            let rect = tile_rect(geometry, tile.pos);
            let bg = palette::tile_color(tile);
            self.front.fill_rect(rect, bg);
            let text = tile.value.to_string();
            let tx = rect.x + rect.w.saturating_sub(text.len()) / 2;
            self.front.put_str(tx, rect.y + rect.h / 2, &text, palette::FONT, bg);
        }

        let hint_row = board.y + board.h + 1;
        self.front.put_str(BOARD_X, hint_row, "arrows/WASD move   R restart   Q quit", palette::HINT, Color::Reset);
    }

    fn compose_game_over(&mut self, geometry: &Geometry) {
        let board = board_rect(geometry);
        let title = "Game Over!";
        let sub = "Press R to Restart or Q to Quit";
        let w = (sub.len() + 4).min(self.front.width);
        let overlay = Rect { x: board.x + board.w.saturating_sub(w) / 2, y: board.y + board.h.saturating_sub(5) / 2, w, h: 5 };
        self.front.fill_rect(overlay, palette::OVERLAY);
        let cx = |s: &str| overlay.x + overlay.w.saturating_sub(s.len()) / 2;
        self.front.put_str(cx(title), overlay.y + 1, title, palette::OVERLAY_TEXT, palette::OVERLAY);
        self.front.put_str(cx(sub), overlay.y + 3, sub, palette::OVERLAY_TEXT, palette::OVERLAY);
    }
}

// ── Step observer: one frame per iteration ──

/// Renders every step-loop iteration and sleeps one frame tick.
///
/// `on_step` cannot fail, so the first terminal error is kept and
/// returned by `finish`; later frames are skipped.
pub struct TerminalObserver<'a> {
    renderer: &'a mut Renderer,
    geometry: Geometry,
    hud: Hud,
    frame: Duration,
    error: Option<io::Error>,
}

impl<'a> TerminalObserver<'a> {
    pub fn new(renderer: &'a mut Renderer, geometry: Geometry, hud: Hud, frame: Duration) -> Self {
        TerminalObserver { renderer, geometry, hud, frame, error: None }
    }

    pub fn finish(self) -> io::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl StepObserver for TerminalObserver<'_> {
    fn on_step(&mut self, _iteration: usize, tiles: &[Tile]) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.renderer.render(&self.geometry, tiles, &self.hud) {
            self.error = Some(e);
            return;
        }
        thread::sleep(self.frame);
    }
}

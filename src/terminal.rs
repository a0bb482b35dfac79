use crate::colors::Role;
use crate::layout::Rect;
use crate::scheduler::{Input, Screen};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, Event, KeyEventKind},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

/// A single cell in the frame buffer
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub role: Option<Role>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            role: None,
            bold: false,
        }
    }
}

/// Off-screen buffer the renderers draw into
pub struct Frame {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
        }
    }

    #[cfg(test)]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Set a character; positions off the frame are ignored
    pub fn set(&mut self, x: i32, y: i32, ch: char, role: Option<Role>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, role, bold };
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.buffer.get(y as usize)?.get(x as usize)
    }

    /// Plain text of one row
    #[cfg(test)]
    pub fn row_text(&self, y: u16) -> String {
        self.buffer
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Drawing view clipped to `rect`
    pub fn region(&mut self, rect: Rect) -> Region<'_> {
        Region { frame: self, rect }
    }

    /// Print the frame to stdout with ANSI colors (for print mode)
    pub fn print_to_stdout(&self) {
        for row in &self.buffer {
            let mut line = String::new();
            for cell in row {
                if cell.role.is_none() && !cell.bold {
                    line.push(cell.ch);
                    continue;
                }
                if cell.bold {
                    line.push_str("\x1b[1m");
                }
                if let Some(role) = cell.role {
                    line.push_str(ansi_code(role));
                }
                line.push(cell.ch);
                line.push_str("\x1b[0m");
            }
            println!("{}", line.trim_end());
        }
    }
}

fn ansi_code(role: Role) -> &'static str {
    match role {
        Role::Ok => "\x1b[92m",
        Role::Warn => "\x1b[93m",
        Role::Error => "\x1b[91m",
        Role::Neutral => "\x1b[96m",
    }
}

/// Mutable view of a frame restricted to one rectangle.
///
/// Coordinates are relative to the rectangle's top-left corner; anything
/// outside the rectangle is silently dropped.
pub struct Region<'a> {
    frame: &'a mut Frame,
    rect: Rect,
}

impl Region<'_> {
    pub fn width(&self) -> u16 {
        self.rect.width
    }

    pub fn height(&self) -> u16 {
        self.rect.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.rect.width as i32 && y < self.rect.height as i32
    }

    pub fn put(&mut self, x: i32, y: i32, ch: char, role: Role) {
        self.put_cell(x, y, ch, Some(role), false);
    }

    /// Put a character in the terminal's default colour
    pub fn put_plain(&mut self, x: i32, y: i32, ch: char) {
        self.put_cell(x, y, ch, None, false);
    }

    pub fn put_bold(&mut self, x: i32, y: i32, ch: char, role: Role) {
        self.put_cell(x, y, ch, Some(role), true);
    }

    fn put_cell(&mut self, x: i32, y: i32, ch: char, role: Option<Role>, bold: bool) {
        if self.contains(x, y) {
            self.frame.set(
                self.rect.left as i32 + x,
                self.rect.top as i32 + y,
                ch,
                role,
                bold,
            );
        }
    }

    /// Write a string left to right; each character is clipped on its own
    pub fn put_str(&mut self, x: i32, y: i32, s: &str, role: Role) {
        for (i, ch) in s.chars().enumerate() {
            self.put(x + i as i32, y, ch, role);
        }
    }
}

/// Terminal session: raw mode, alternate screen, frame presentation
pub struct Terminal {
    alternate_screen: bool,
}

impl Terminal {
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        }
        Ok(Self { alternate_screen })
    }
}

impl Screen for Terminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        size()
    }

    /// Render the entire frame to screen
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, Clear(ClearType::All))?;

        for (y, row) in frame.buffer.iter().enumerate() {
            queue!(stdout, MoveTo(0, y as u16))?;

            for cell in row {
                if cell.bold {
                    queue!(stdout, SetAttribute(Attribute::Bold))?;
                }

                if let Some(role) = cell.role {
                    queue!(stdout, SetForegroundColor(role.color()), Print(cell.ch), ResetColor)?;
                } else {
                    queue!(stdout, Print(cell.ch))?;
                }

                if cell.bold {
                    queue!(stdout, SetAttribute(Attribute::Reset))?;
                }
            }
        }

        stdout.flush()
    }

    /// Check for input (non-blocking)
    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        if !poll(Duration::from_millis(0))? {
            return Ok(None);
        }
        match read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(Input::Key(key.code))),
            Event::Resize(w, h) => Ok(Some(Input::Resize(w, h))),
            _ => Ok(None),
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ignores_out_of_bounds_writes() {
        let mut frame = Frame::new(4, 2);
        frame.set(-1, 0, 'a', None, false);
        frame.set(4, 0, 'b', None, false);
        frame.set(0, 2, 'c', None, false);
        frame.set(3, 1, 'd', Some(Role::Ok), true);
        assert_eq!(frame.row_text(0), "    ");
        assert_eq!(frame.row_text(1), "   d");
        assert_eq!(frame.get(3, 1).unwrap().role, Some(Role::Ok));
    }

    #[test]
    fn region_clips_to_its_rect() {
        let mut frame = Frame::new(10, 3);
        {
            let mut region = frame.region(Rect::new(1, 2, 1, 4));
            region.put_str(-1, 0, "abcdef", Role::Warn);
            region.put(0, 1, 'z', Role::Warn);
        }
        assert_eq!(frame.row_text(1), "  bcde    ");
        assert_eq!(frame.row_text(2), "          ");
    }

    #[test]
    fn region_beyond_frame_is_clipped_by_frame() {
        let mut frame = Frame::new(3, 1);
        frame.region(Rect::new(0, 2, 1, 5)).put_str(0, 0, "xyz", Role::Ok);
        assert_eq!(frame.row_text(0), "  x");
    }
}

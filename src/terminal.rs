//! Interactive terminal operator
//!
//! Single keystrokes are read in raw mode, one key per call. Free text and
//! ratings are read as ordinary lines.

use crate::error::CogError;
use crate::operator::Operator;
use crate::stimulus::{Response, Stimulus};
use crate::types::Color;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{self, Attribute, Stylize},
    terminal::{self, ClearType},
};
use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;
use std::time::Duration;

/// RAII guard for raw terminal mode
struct RawMode {
    was_raw: bool,
}

impl RawMode {
    fn enable() -> io::Result<Self> {
        let was_raw = terminal::is_raw_mode_enabled()?;
        if !was_raw {
            terminal::enable_raw_mode()?;
        }
        Ok(Self { was_raw })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if !self.was_raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Operator backed by the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalOperator;

impl TerminalOperator {
    pub fn new() -> Self {
        Self
    }

    /// Block until one key is pressed
    fn read_key(&self) -> Result<KeyEvent, CogError> {
        let _raw = RawMode::enable()?;
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Err(CogError::Terminal("interrupted".to_string()));
                }
                return Ok(key);
            }
        }
    }

    fn print(&self, text: &str) -> Result<(), CogError> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

fn key_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// `n` declines a test before it starts
fn skips_test(key: &KeyEvent) -> bool {
    key_char(key) == Some('n')
}

fn ink(color: Color) -> style::Color {
    match color {
        Color::Red => style::Color::Red,
        Color::Green => style::Color::Green,
        Color::Yellow => style::Color::Yellow,
        Color::Blue => style::Color::Blue,
        Color::Magenta => style::Color::Magenta,
        Color::Cyan => style::Color::Cyan,
        Color::White => style::Color::White,
        Color::Black => style::Color::Black,
    }
}

impl Operator for TerminalOperator {
    fn announce(&mut self, message: &str) -> Result<(), CogError> {
        self.print(&format!("{}\n", message))
    }

    fn confirm_start(&mut self, description: &str, duration: Duration) -> Result<bool, CogError> {
        self.print(&format!(
            "\n{}\nRuns for {} seconds. Press any key to start, (n) to skip.\n",
            description.bold(),
            duration.as_secs()
        ))?;
        let key = self.read_key()?;
        Ok(!skips_test(&key))
    }

    fn present(&mut self, stimulus: &Stimulus) -> Result<Response, CogError> {
        let mut stdout = io::stdout();
        queue!(
            stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        match stimulus {
            Stimulus::Problem { lhs, op, rhs } => {
                write!(stdout, "{} {} {} = ?", lhs, op.symbol(), rhs)?;
            }
            Stimulus::Digit { digit, position } => {
                write!(stdout, "#{:<4} {}", position, digit.to_string().bold())?;
            }
            Stimulus::ColorWord { word, ink: color } => {
                let text = word
                    .name()
                    .to_uppercase()
                    .with(ink(*color))
                    .attribute(Attribute::Bold);
                write!(stdout, "{}", text)?;
            }
        }
        stdout.flush()?;

        let key = self.read_key()?;
        execute!(stdout, cursor::MoveToNextLine(1))?;
        Ok(key_char(&key).map_or(Response::Unreadable, Response::Key))
    }

    fn choose(&mut self, prompt: &str, keys: &[char]) -> Result<char, CogError> {
        self.print(&format!("{} ", prompt))?;
        loop {
            if let Some(c) = key_char(&self.read_key()?) {
                if keys.contains(&c) {
                    self.print(&format!("{}\n", c))?;
                    return Ok(c);
                }
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, CogError> {
        self.print(&format!("{}: ", prompt))?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn rate(&mut self, prompt: &str, range: RangeInclusive<i64>) -> Result<i64, CogError> {
        loop {
            let answer = self.read_line(prompt)?;
            match answer.parse::<i64>() {
                Ok(value) if range.contains(&value) => return Ok(value),
                _ => self.announce(&format!(
                    "Please enter a number from {} to {}.",
                    range.start(),
                    range.end()
                ))?,
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, CogError> {
        let answer = self.choose(&format!("{} (y/n)", prompt), &['y', 'n'])?;
        Ok(answer == 'y')
    }
}

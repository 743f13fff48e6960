//! Operator boundary
//!
//! The session engine never touches the terminal directly. Every prompt goes
//! through [`Operator`], which blocks until the person at the keyboard
//! answers. Only one call is ever outstanding.

use crate::error::CogError;
use crate::stimulus::{Response, Stimulus};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Input/output capability of the person taking the session
pub trait Operator {
    /// Show an informational message
    fn announce(&mut self, message: &str) -> Result<(), CogError>;

    /// Offer to start a test; `false` skips it before any trial runs
    fn confirm_start(&mut self, description: &str, duration: Duration) -> Result<bool, CogError>;

    /// Display a stimulus and wait for one keystroke
    fn present(&mut self, stimulus: &Stimulus) -> Result<Response, CogError>;

    /// Ask for one of the given keys
    fn choose(&mut self, prompt: &str, keys: &[char]) -> Result<char, CogError>;

    /// Ask for a line of free text
    fn read_line(&mut self, prompt: &str) -> Result<String, CogError>;

    /// Ask for an integer within `range`
    fn rate(&mut self, prompt: &str, range: RangeInclusive<i64>) -> Result<i64, CogError>;

    /// Ask a yes/no question
    fn confirm(&mut self, prompt: &str) -> Result<bool, CogError>;
}

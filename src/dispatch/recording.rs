//! Host double that records every call

use super::{Host, MouseButton};
use crate::action::{Command, KeySequence};
use crate::gesture::Rect;
use crate::profile::Context;
use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Invoke(Command, Vec<Value>),
    Keys(String),
    Move(i32, i32),
    Button(MouseButton, bool),
    Scroll(i32, i32),
}

#[derive(Debug)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
    pub context: Option<Context>,
    pub bounds: Rect,
    pub position: Option<(i32, i32)>,
    failing: HashSet<Command>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            context: Some(Context::Global),
            bounds: Rect::new(0, 0, 1920, 1080),
            position: None,
            failing: HashSet::new(),
        }
    }

    pub fn fail_on(&mut self, command: Command) {
        self.failing.insert(command);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.clone()
    }

    /// Invoked commands only, in order
    pub fn commands(&self) -> Vec<Command> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Invoke(command, _) => Some(*command),
                _ => None,
            })
            .collect()
    }
}

impl Host for RecordingHost {
    fn name(&self) -> &str {
        "recording"
    }

    fn context(&self) -> Option<Context> {
        self.context
    }

    fn invoke(&mut self, command: Command, params: &[Value]) -> Result<()> {
        if self.failing.contains(&command) {
            bail!("host refused {}", command.id());
        }
        self.calls.push(HostCall::Invoke(command, params.to_vec()));
        Ok(())
    }

    fn send_keys(&mut self, keys: &KeySequence) -> Result<()> {
        self.calls.push(HostCall::Keys(keys.to_string()));
        Ok(())
    }

    fn pointer_move(&mut self, x: i32, y: i32) -> Result<()> {
        self.position = Some((x, y));
        self.calls.push(HostCall::Move(x, y));
        Ok(())
    }

    fn pointer_position(&self) -> Option<(i32, i32)> {
        self.position
    }

    fn pointer_button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        self.calls.push(HostCall::Button(button, pressed));
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.calls.push(HostCall::Scroll(dx, dy));
        Ok(())
    }

    fn desktop_bounds(&self) -> Rect {
        self.bounds
    }
}

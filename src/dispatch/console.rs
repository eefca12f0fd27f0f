//! Console host - logs every dispatched action
//!
//! Useful for trying out profiles without a host application: the engine
//! runs against real controllers and every command lands in the log.

use super::{Host, MouseButton};
use crate::action::{Command, KeySequence};
use crate::gesture::Rect;
use crate::profile::Context;
use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info};

pub struct ConsoleHost {
    name: String,
    context: Context,
    bounds: Rect,
    position: (i32, i32),
    /// Execution counter for debugging
    execution_count: u64,
}

impl ConsoleHost {
    pub fn new(name: impl Into<String>, context: Context, bounds: Rect) -> Self {
        let (x, y) = bounds.center();
        Self {
            name: name.into(),
            context,
            bounds,
            position: (x as i32, y as i32),
            execution_count: 0,
        }
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    fn log(&mut self, what: &str, detail: String) {
        self.execution_count += 1;
        info!(
            "🎮 [{}] {} → {} {} [{}] [exec #{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            self.name,
            what,
            detail,
            self.context,
            self.execution_count
        );
    }
}

impl Host for ConsoleHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> Option<Context> {
        Some(self.context)
    }

    fn invoke(&mut self, command: Command, params: &[Value]) -> Result<()> {
        let params_str = if params.is_empty() {
            "(no params)".to_string()
        } else {
            params
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        self.log(command.id(), params_str);
        Ok(())
    }

    fn send_keys(&mut self, keys: &KeySequence) -> Result<()> {
        self.log("keys", keys.to_string());
        Ok(())
    }

    fn pointer_move(&mut self, x: i32, y: i32) -> Result<()> {
        // Too chatty for info
        self.position = (x, y);
        debug!("Pointer at ({}, {})", x, y);
        Ok(())
    }

    fn pointer_position(&self) -> Option<(i32, i32)> {
        Some(self.position)
    }

    fn pointer_button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        let state = if pressed { "down" } else { "up" };
        self.log("pointer", format!("{:?} {} at {:?}", button, state, self.position));
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        debug!("Scroll ({}, {})", dx, dy);
        Ok(())
    }

    fn desktop_bounds(&self) -> Rect {
        self.bounds
    }
}

use serde::{Deserialize, Serialize};

/// Discrete player commands, already mapped from keys or buttons by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    MoveUp,
    MoveDown,
    Confirm,
    ToggleMute,
    ToggleNoteStyle,
    Quit,
    /// Chooses a level on the select screen; ignored while it is locked.
    SelectLevel(usize),
    /// Starts the following level from the pass screen.
    NextLevel,
    /// Abandons the current attempt and returns to level select.
    Back,
}

/// Commands for a single frame, in arrival order with repeats removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFrame {
    commands: Vec<Command>,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        if !self.commands.contains(&command) {
            self.commands.push(command);
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<Command> for InputFrame {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        let mut frame = Self::new();
        for command in iter {
            frame.push(command);
        }
        frame
    }
}

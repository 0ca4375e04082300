//! Text commands for replaying layout edits against a [`TileController`].
//!
//! Leaf indices always refer to the left-to-right leaf order of the layout
//! as it is when the command runs, so later commands see the effect of
//! earlier ones.

use std::fmt;
use std::str::FromStr;

use indoc::indoc;
use rand::Rng;
use thiserror::Error;

use crate::controller::TileController;
use crate::layout::{InsertPosition, NodeId, ParsePositionError};

pub const SCRIPT_HELP: &str = indoc! {"
    Commands (leaf indices follow the current left-to-right order):
      split <leaf> <v|h>                  split a tile into two halves
      remove <leaf>                       remove a tile, its sibling takes its place
      insert <target> <dragging> <pos>    drop a copy of <dragging> on <target>
      drag <leaf> <dx> <dy>               drag a tile by an offset and release it
      cancel-drag <leaf> <dx> <dy>        drag a tile, cancel, then release it
    Positions: left, right, top, bottom, replace
"};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("invalid orientation `{0}` (expected v or h)")]
    InvalidOrientation(String),
    #[error(transparent)]
    Position(#[from] ParsePositionError),
    #[error("leaf index {index} out of range ({count} leaves)")]
    LeafOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Split {
        leaf: usize,
        is_vertical: bool,
    },
    Remove {
        leaf: usize,
    },
    Insert {
        target: usize,
        dragging: usize,
        position: InsertPosition,
    },
    Drag {
        leaf: usize,
        dx: i32,
        dy: i32,
    },
    CancelDrag {
        leaf: usize,
        dx: i32,
        dy: i32,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Split { .. } => "split",
            Command::Remove { .. } => "remove",
            Command::Insert { .. } => "insert",
            Command::Drag { .. } => "drag",
            Command::CancelDrag { .. } => "cancel-drag",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Command::Split { leaf, is_vertical } => {
                let axis = if *is_vertical { "v" } else { "h" };
                write!(f, "{name} {leaf} {axis}")
            }
            Command::Remove { leaf } => write!(f, "{name} {leaf}"),
            Command::Insert {
                target,
                dragging,
                position,
            } => write!(f, "{name} {target} {dragging} {position}"),
            Command::Drag { leaf, dx, dy } | Command::CancelDrag { leaf, dx, dy } => {
                write!(f, "{name} {leaf} {dx} {dy}")
            }
        }
    }
}

fn arity(command: &'static str, args: &[&str], expected: usize) -> Result<(), ScriptError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ScriptError::Arity {
            command,
            expected,
            got: args.len(),
        })
    }
}

fn number<T: FromStr>(raw: &str) -> Result<T, ScriptError> {
    raw.parse()
        .map_err(|_| ScriptError::InvalidNumber(raw.to_string()))
}

fn orientation(raw: &str) -> Result<bool, ScriptError> {
    match raw.to_ascii_lowercase().as_str() {
        "v" | "vertical" => Ok(true),
        "h" | "horizontal" => Ok(false),
        _ => Err(ScriptError::InvalidOrientation(raw.to_string())),
    }
}

impl FromStr for Command {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ScriptError::Empty);
        };
        let args: Vec<&str> = words.collect();
        match head.to_ascii_lowercase().as_str() {
            "split" => {
                arity("split", &args, 2)?;
                Ok(Command::Split {
                    leaf: number(args[0])?,
                    is_vertical: orientation(args[1])?,
                })
            }
            "remove" => {
                arity("remove", &args, 1)?;
                Ok(Command::Remove {
                    leaf: number(args[0])?,
                })
            }
            "insert" => {
                arity("insert", &args, 3)?;
                Ok(Command::Insert {
                    target: number(args[0])?,
                    dragging: number(args[1])?,
                    position: args[2].parse()?,
                })
            }
            "drag" => {
                arity("drag", &args, 3)?;
                Ok(Command::Drag {
                    leaf: number(args[0])?,
                    dx: number(args[1])?,
                    dy: number(args[2])?,
                })
            }
            "cancel-drag" => {
                arity("cancel-drag", &args, 3)?;
                Ok(Command::CancelDrag {
                    leaf: number(args[0])?,
                    dx: number(args[1])?,
                    dy: number(args[2])?,
                })
            }
            _ => Err(ScriptError::UnknownCommand(head.to_string())),
        }
    }
}

pub fn parse_script<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Command>, ScriptError> {
    lines.iter().map(|line| line.as_ref().parse()).collect()
}

fn resolve<R: Rng>(controller: &TileController<R>, index: usize) -> Result<NodeId, ScriptError> {
    let leaves = controller.leaves();
    leaves
        .get(index)
        .copied()
        .ok_or(ScriptError::LeafOutOfRange {
            index,
            count: leaves.len(),
        })
}

/// Run one command. Returns whether the layout changed.
pub fn apply<R: Rng>(
    controller: &mut TileController<R>,
    command: &Command,
) -> Result<bool, ScriptError> {
    tracing::debug!(%command, "applying command");
    let changed = match *command {
        Command::Split { leaf, is_vertical } => {
            let leaf = resolve(controller, leaf)?;
            controller.split_leaf(leaf, is_vertical)
        }
        Command::Remove { leaf } => {
            let leaf = resolve(controller, leaf)?;
            controller.remove_leaf(leaf)
        }
        Command::Insert {
            target,
            dragging,
            position,
        } => {
            let target = resolve(controller, target)?;
            let dragging = resolve(controller, dragging)?;
            controller.insert_relative(target, dragging, position)
        }
        Command::Drag { leaf, dx, dy } => {
            let leaf = resolve(controller, leaf)?;
            controller.on_drag_start(leaf);
            controller.on_drag(dx, dy);
            controller.on_drag_end()
        }
        Command::CancelDrag { leaf, dx, dy } => {
            let leaf = resolve(controller, leaf)?;
            controller.on_drag_start(leaf);
            controller.on_drag(dx, dy);
            controller.on_drag_cancel();
            controller.on_drag_end()
        }
    };
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::prelude::Rect;

    fn controller() -> TileController {
        TileController::seeded(
            Rect {
                x: 0,
                y: 0,
                width: 40,
                height: 20,
            },
            3,
        )
    }

    #[test]
    fn parses_every_command() {
        let script = [
            "split 0 v",
            "remove 1",
            "insert 0 1 Top",
            "drag 2 -5 7",
            "cancel-drag 0 1 1",
        ];
        let commands = parse_script(&script).expect("valid script");
        assert_eq!(
            commands,
            vec![
                Command::Split {
                    leaf: 0,
                    is_vertical: true
                },
                Command::Remove { leaf: 1 },
                Command::Insert {
                    target: 0,
                    dragging: 1,
                    position: InsertPosition::Top
                },
                Command::Drag {
                    leaf: 2,
                    dx: -5,
                    dy: 7
                },
                Command::CancelDrag {
                    leaf: 0,
                    dx: 1,
                    dy: 1
                },
            ]
        );
        assert_eq!(commands[2].to_string(), "insert 0 1 top");
    }

    #[test]
    fn reports_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ScriptError::Empty));
        assert_eq!(
            "grow 1".parse::<Command>(),
            Err(ScriptError::UnknownCommand("grow".to_string()))
        );
        assert_eq!(
            "split 0".parse::<Command>(),
            Err(ScriptError::Arity {
                command: "split",
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            "remove x".parse::<Command>(),
            Err(ScriptError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            "split 0 d".parse::<Command>(),
            Err(ScriptError::InvalidOrientation("d".to_string()))
        );
        assert!(matches!(
            "insert 0 0 middle".parse::<Command>(),
            Err(ScriptError::Position(_))
        ));
    }

    #[test]
    fn apply_resolves_leaf_indices() {
        let mut controller = controller();
        let commands = parse_script(&["split 0 v", "split 1 h"]).expect("valid script");
        for command in &commands {
            assert!(apply(&mut controller, command).expect("in range"));
        }
        assert_eq!(controller.leaves().len(), 3);

        let out_of_range = Command::Remove { leaf: 3 };
        assert_eq!(
            apply(&mut controller, &out_of_range),
            Err(ScriptError::LeafOutOfRange { index: 3, count: 3 })
        );
    }

    #[test]
    fn cancelled_drag_changes_nothing() {
        let mut controller = controller();
        apply(
            &mut controller,
            &Command::Split {
                leaf: 0,
                is_vertical: true,
            },
        )
        .expect("in range");
        let root = controller.root();
        let cancelled = Command::CancelDrag {
            leaf: 0,
            dx: 20,
            dy: 0,
        };
        assert_eq!(apply(&mut controller, &cancelled), Ok(false));
        assert_eq!(controller.root(), root);
        assert!(!controller.is_dragging());
    }
}

//! Line commands read from stdin.

use anyhow::{anyhow, bail, Context};
use client_core::PointerButton;

pub const DEFAULT_DRAG_STEPS: u32 = 1;

pub const HELP: &str = "\
commands:
  start                                   open a session (or resend the camera snapshot)
  end                                     close the session
  orbit <dx> <dy>                         rotate the camera
  pan <dx> <dy>                           translate the camera
  drag <primary|secondary|id> <x0> <y0> <x1> <y1> [steps]
  endpoint <url>                          set the renderer endpoint
  max-spp <value>                         set the sample budget (digits only)
  save                                    export the canvas as PNG
  status                                  print session state
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    End,
    Drag {
        button: PointerButton,
        from: (f64, f64),
        to: (f64, f64),
        steps: u32,
    },
    Endpoint(String),
    MaxSpp(String),
    Save,
    Status,
    Help,
    Quit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb {
        "start" => Command::Start,
        "end" => Command::End,
        "save" => Command::Save,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "orbit" | "pan" => {
            let [dx, dy] = args.as_slice() else {
                bail!("usage: {verb} <dx> <dy>");
            };
            let button = if verb == "orbit" {
                PointerButton::Primary
            } else {
                PointerButton::Secondary
            };
            Command::Drag {
                button,
                from: (0.0, 0.0),
                to: (number(dx)?, number(dy)?),
                steps: DEFAULT_DRAG_STEPS,
            }
        }
        "drag" => {
            let (button, coords, steps) = match args.as_slice() {
                [button, x0, y0, x1, y1] => (button, [x0, y0, x1, y1], DEFAULT_DRAG_STEPS),
                [button, x0, y0, x1, y1, steps] => (
                    button,
                    [x0, y0, x1, y1],
                    steps
                        .parse::<u32>()
                        .ok()
                        .filter(|steps| *steps > 0)
                        .ok_or_else(|| anyhow!("steps must be a positive integer"))?,
                ),
                _ => bail!("usage: drag <button> <x0> <y0> <x1> <y1> [steps]"),
            };
            let [x0, y0, x1, y1] = coords;
            Command::Drag {
                button: parse_button(button)?,
                from: (number(x0)?, number(y0)?),
                to: (number(x1)?, number(y1)?),
                steps,
            }
        }
        "endpoint" => match args.as_slice() {
            [url] => Command::Endpoint((*url).to_string()),
            _ => bail!("usage: endpoint <url>"),
        },
        "max-spp" => Command::MaxSpp(args.concat()),
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

/// Intermediate pointer positions for a drag, ending exactly on `to`.
pub fn drag_path(from: (f64, f64), to: (f64, f64), steps: u32) -> Vec<(f64, f64)> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|step| {
            let t = f64::from(step) / f64::from(steps);
            (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
        })
        .collect()
}

fn parse_button(raw: &str) -> anyhow::Result<PointerButton> {
    match raw {
        "primary" | "left" => Ok(PointerButton::Primary),
        "secondary" | "right" => Ok(PointerButton::Secondary),
        other => other
            .parse::<i16>()
            .map(PointerButton::from_id)
            .with_context(|| format!("unknown pointer button '{other}'")),
    }
}

fn number(raw: &str) -> anyhow::Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| anyhow!("'{raw}' is not a number"))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;

//! Protocol command definition and parsing.
//!
//! Every line the frontend submits starts with a 4-character case-sensitive
//! opcode. MAXV/MAXC/GETV/GETC take space-delimited tokens; the remaining
//! opcodes take comma-delimited fields whose first field carries the channel
//! token (`CH<n>`, bare `<n>` accepted).

use thiserror::Error;

use crate::instrument::channel::Channel;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `MAXV <v>` — set the session max voltage rating
    SetMaxVoltage { volts: f64 },
    /// `MAXC <c>` — set the session max current rating, in mA
    SetMaxCurrent { milliamps: f64 },
    /// `SETV CH<n>, <v>` — drive a voltage setpoint, respond with the readback
    SetVoltage { channel: Channel, volts: f64 },
    /// `SETC CH<n>, <c>` — drive a current setpoint, respond with the readback
    SetCurrent { channel: Channel, milliamps: f64 },
    /// `GETV <n>` — read a channel's voltage
    GetVoltage { channel: Channel },
    /// `GETC <n>` — read a channel's current
    GetCurrent { channel: Channel },
    /// `TSTV CH<n>, <v>, <min>, <max>` — drive, measure, pass/fail
    TestVoltage {
        channel: Channel,
        volts: f64,
        minimum: f64,
        maximum: f64,
    },
    /// `TSTC CH<n>, <c>, <min>, <max>` — drive, measure, pass/fail
    TestCurrent {
        channel: Channel,
        milliamps: f64,
        minimum: f64,
        maximum: f64,
    },
    /// `TSCO` — continuity check through the meter
    TestContinuity,
    /// `TSTR` — resistance reading through the meter
    TestResistance,
    /// `PRBV CH<n>, <start>, <end>, <step>` — stepped voltage sweep
    SweepVoltage {
        channel: Channel,
        start: f64,
        end: f64,
        step: f64,
    },
    /// `PRBC CH<n>, <start>, <end>, <step>` — stepped current sweep
    SweepCurrent {
        channel: Channel,
        start: f64,
        end: f64,
        step: f64,
    },
}

impl Command {
    /// Instrument commands require the safety envelope to be configured
    /// first. MAXV/MAXC configure it and TSTR only touches the meter.
    pub fn requires_configured_limits(&self) -> bool {
        !matches!(
            self,
            Command::SetMaxVoltage { .. }
                | Command::SetMaxCurrent { .. }
                | Command::TestResistance
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Error processing {opcode} command: Invalid command format. Expected '{expected}'.")]
    BadFormat {
        opcode: &'static str,
        expected: &'static str,
    },

    #[error("Error processing {opcode} command: Invalid input values.")]
    BadNumber { opcode: &'static str },

    #[error("Error processing {opcode} command: channel must be 1, 2, or 3")]
    BadChannel { opcode: &'static str },

    #[error("Error processing command '{line}': command not found")]
    UnknownOpcode { line: String },
}

/// Parse one protocol line into a typed command.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let opcode = match line.get(..4) {
        Some(opcode) => opcode,
        None => {
            return Err(ParseError::UnknownOpcode {
                line: line.to_string(),
            });
        }
    };

    match opcode {
        "MAXV" => Ok(Command::SetMaxVoltage {
            volts: parse_scalar(line, "MAXV", "MAXV <voltage>")?,
        }),
        "MAXC" => Ok(Command::SetMaxCurrent {
            milliamps: parse_scalar(line, "MAXC", "MAXC <current>")?,
        }),
        "SETV" => {
            let (channel, values) = parse_channel_fields(line, "SETV", 1, "SETV CH<n>, <voltage>")?;
            Ok(Command::SetVoltage {
                channel,
                volts: values[0],
            })
        }
        "SETC" => {
            let (channel, values) = parse_channel_fields(line, "SETC", 1, "SETC CH<n>, <current>")?;
            Ok(Command::SetCurrent {
                channel,
                milliamps: values[0],
            })
        }
        "GETV" => Ok(Command::GetVoltage {
            channel: parse_channel_line(line, "GETV", "GETV <channel>")?,
        }),
        "GETC" => Ok(Command::GetCurrent {
            channel: parse_channel_line(line, "GETC", "GETC <channel>")?,
        }),
        "TSTV" => {
            let (channel, values) = parse_channel_fields(
                line,
                "TSTV",
                3,
                "TSTV CH<n>, <voltage>, <minimum>, <maximum>",
            )?;
            Ok(Command::TestVoltage {
                channel,
                volts: values[0],
                minimum: values[1],
                maximum: values[2],
            })
        }
        "TSTC" => {
            let (channel, values) = parse_channel_fields(
                line,
                "TSTC",
                3,
                "TSTC CH<n>, <current>, <minimum>, <maximum>",
            )?;
            Ok(Command::TestCurrent {
                channel,
                milliamps: values[0],
                minimum: values[1],
                maximum: values[2],
            })
        }
        "TSCO" => Ok(Command::TestContinuity),
        "TSTR" => Ok(Command::TestResistance),
        "PRBV" => {
            let (channel, values) =
                parse_channel_fields(line, "PRBV", 3, "PRBV CH<n>, <start>, <end>, <step>")?;
            Ok(Command::SweepVoltage {
                channel,
                start: values[0],
                end: values[1],
                step: values[2],
            })
        }
        "PRBC" => {
            let (channel, values) =
                parse_channel_fields(line, "PRBC", 3, "PRBC CH<n>, <start>, <end>, <step>")?;
            Ok(Command::SweepCurrent {
                channel,
                start: values[0],
                end: values[1],
                step: values[2],
            })
        }
        _ => Err(ParseError::UnknownOpcode {
            line: line.to_string(),
        }),
    }
}

/// `<OPCODE> <value>` with space-delimited tokens.
fn parse_scalar(line: &str, opcode: &'static str, expected: &'static str) -> Result<f64, ParseError> {
    let mut tokens = line.split_whitespace();
    let _opcode = tokens.next();
    let value = tokens
        .next()
        .ok_or(ParseError::BadFormat { opcode, expected })?;
    if tokens.next().is_some() {
        return Err(ParseError::BadFormat { opcode, expected });
    }

    value
        .parse()
        .map_err(|_| ParseError::BadNumber { opcode })
}

/// `<OPCODE> <channel>` with space-delimited tokens.
fn parse_channel_line(
    line: &str,
    opcode: &'static str,
    expected: &'static str,
) -> Result<Channel, ParseError> {
    let mut tokens = line.split_whitespace();
    let _opcode = tokens.next();
    let channel = tokens
        .next()
        .ok_or(ParseError::BadFormat { opcode, expected })?;
    if tokens.next().is_some() {
        return Err(ParseError::BadFormat { opcode, expected });
    }

    parse_channel_token(channel, opcode)
}

/// `<OPCODE> CH<n>, <v1>[, <v2>...]` — comma-delimited fields, channel token
/// inside the first field.
fn parse_channel_fields(
    line: &str,
    opcode: &'static str,
    value_count: usize,
    expected: &'static str,
) -> Result<(Channel, Vec<f64>), ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != value_count + 1 {
        return Err(ParseError::BadFormat { opcode, expected });
    }

    let mut head = fields[0].split_whitespace();
    let _opcode = head.next();
    let channel = head
        .next()
        .ok_or(ParseError::BadFormat { opcode, expected })?;
    if head.next().is_some() {
        return Err(ParseError::BadFormat { opcode, expected });
    }
    let channel = parse_channel_token(channel, opcode)?;

    let values = fields[1..]
        .iter()
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseError::BadNumber { opcode })
        })
        .collect::<Result<Vec<f64>, ParseError>>()?;

    Ok((channel, values))
}

fn parse_channel_token(token: &str, opcode: &'static str) -> Result<Channel, ParseError> {
    let digits = token.strip_prefix("CH").unwrap_or(token);
    let number = digits
        .parse::<u32>()
        .map_err(|_| ParseError::BadNumber { opcode })?;
    Channel::from_number(number).ok_or(ParseError::BadChannel { opcode })
}

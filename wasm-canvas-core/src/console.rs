//! Classification of lines printed by the running module
use nom::{
    branch::alt,
    character::complete::{alpha1, char, multispace0},
    sequence::{delimited, preceded, terminated},
    IResult,
};

/// Level tag at the start of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Debug,
    Info,
    Warn,
    Error,
    Untagged,
}

/// Read the level tag of a line like `[INFO] ready` or `warn: low memory`
pub fn classify(line: &str) -> LineLevel {
    match level_tag(line) {
        Ok((_, tag)) => match tag.to_ascii_lowercase().as_str() {
            "trace" | "debug" => LineLevel::Debug,
            "info" => LineLevel::Info,
            "warn" | "warning" => LineLevel::Warn,
            "err" | "error" => LineLevel::Error,
            _ => LineLevel::Untagged,
        },
        Err(_) => LineLevel::Untagged,
    }
}

/// Whether a line should be kept out of the store when info lines are suppressed
pub fn is_informational(line: &str) -> bool {
    classify(line) == LineLevel::Info
}

fn level_tag(input: &str) -> IResult<&str, &str> {
    preceded(
        multispace0,
        alt((
            delimited(char('['), alpha1, char(']')),
            terminated(alpha1, char(':')),
        )),
    )(input)
}

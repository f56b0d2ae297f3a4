//! Query classification
//!
//! Turns one line of user input into a `Query`: the exit sentinel, one of
//! the five actions with its operand, or nothing recognizable.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The word that ends a session, compared case-insensitively
pub const EXIT_KEYWORD: &str = "exit";

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<command>\S+)(?:\s+(?P<argument>.*))?$").expect("Invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Solve,
    Simplify,
    Derivative,
    Integral,
    Evaluate,
}

impl Action {
    /// Trigger order: when several keywords occur in one query the first one
    /// in this list wins, wherever it appears in the text.
    pub const PRECEDENCE: [Action; 5] = [
        Action::Solve,
        Action::Simplify,
        Action::Derivative,
        Action::Integral,
        Action::Evaluate,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Action::Solve => "solve",
            Action::Simplify => "simplify",
            Action::Derivative => "derivative",
            Action::Integral => "integral",
            Action::Evaluate => "evaluate",
        }
    }

    pub fn success_label(self) -> &'static str {
        match self {
            Action::Solve => "Solution",
            Action::Simplify => "Simplified",
            Action::Derivative => "Derivative",
            Action::Integral => "Integral",
            Action::Evaluate => "Evaluated",
        }
    }

    pub fn failure_label(self) -> &'static str {
        match self {
            Action::Solve => "Error solving equation",
            Action::Simplify => "Error simplifying expression",
            Action::Derivative => "Error computing derivative",
            Action::Integral => "Error computing integral",
            Action::Evaluate => "Error evaluating expression",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::PRECEDENCE
            .into_iter()
            .find(|action| action.keyword().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How trigger keywords are located in a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A keyword anywhere in the text selects the action
    #[default]
    Keyword,
    /// The first word must be the keyword; the rest is the operand
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Exit,
    Command { action: Action, operand: String },
    Unrecognized,
}

impl Query {
    pub fn classify(line: &str, mode: MatchMode) -> Self {
        let text = line.trim();
        if text.eq_ignore_ascii_case(EXIT_KEYWORD) {
            return Query::Exit;
        }

        match mode {
            MatchMode::Keyword => classify_keyword(text),
            MatchMode::Strict => classify_strict(text),
        }
    }
}

fn classify_keyword(text: &str) -> Query {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();

    for action in Action::PRECEDENCE {
        if let Some(start) = lowered.find(action.keyword()) {
            let end = start + action.keyword().len();
            let operand = format!("{}{}", &text[..start], &text[end..]);
            return Query::Command {
                action,
                operand: operand.trim().to_string(),
            };
        }
    }
    Query::Unrecognized
}

fn classify_strict(text: &str) -> Query {
    let Some(caps) = COMMAND_RE.captures(text) else {
        return Query::Unrecognized;
    };
    let Some(action) = Action::from_keyword(&caps["command"]) else {
        return Query::Unrecognized;
    };
    let operand = caps
        .name("argument")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Query::Command { action, operand }
}

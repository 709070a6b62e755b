use std::fmt;

/// The first field found to differ between a canonical event and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Marker { expected: String, found: Option<String> },
    Summary { expected: String, found: String },
    Description,
    RecurrencePresence { expected: bool },
    Recurrence { expected: Vec<String>, found: Vec<String> },
    Start { expected: String, found: String },
    End { expected: String, found: String },
}

impl Mismatch {
    /// Name of the differing field.
    pub fn field(&self) -> &'static str {
        match self {
            Mismatch::Marker { .. } => "marker",
            Mismatch::Summary { .. } => "summary",
            Mismatch::Description => "description",
            Mismatch::RecurrencePresence { .. } => "recurrence presence",
            Mismatch::Recurrence { .. } => "recurrence",
            Mismatch::Start { .. } => "start",
            Mismatch::End { .. } => "end",
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Marker { expected, found } => write!(
                f,
                "marker: expected {}, found {}",
                expected,
                found.as_deref().unwrap_or("none")
            ),
            Mismatch::Summary { expected, found } => {
                write!(f, "summary: {:?} -> {:?}", found, expected)
            }
            Mismatch::Description => write!(f, "description"),
            Mismatch::RecurrencePresence { expected: true } => {
                write!(f, "recurrence presence: now recurring")
            }
            Mismatch::RecurrencePresence { expected: false } => {
                write!(f, "recurrence presence: no longer recurring")
            }
            Mismatch::Recurrence { expected, found } => {
                write!(f, "recurrence: {} -> {}", found.join(","), expected.join(","))
            }
            Mismatch::Start { expected, found } => write!(f, "start: {} -> {}", found, expected),
            Mismatch::End { expected, found } => write!(f, "end: {} -> {}", found, expected),
        }
    }
}

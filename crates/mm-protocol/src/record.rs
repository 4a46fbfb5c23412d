//! Protocol record grammar: the `@@`-prefixed vocabulary workers speak to
//! the coordinator over their pipe.
use std::fmt;

/// A single parsed `@@...` control record.
///
/// `Unknown` preserves the raw tag and body of a record the coordinator
/// doesn't recognise, so forward-compatible records round-trip through
/// [`Record::encode`] without data loss even though dispatch (`mm-coordinator`)
/// drops them silently per the decoding contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Ready,
    Solving,
    Finished,
    Partial,
    ProblemStart(u64),
    ProblemEnd(u64),
    SolutionStart,
    SolutionEnd,
    Text(String),
    Time(f64),
    Heartbeat(u64),
    Progress { m: u32, k: u32, positions: u64 },
    Combo(String),
    Debug(String),
    Error(String),
    Unknown(String),
}

/// Two-byte marker that opens a protocol record within a frame.
pub const MARKER: &str = "@@";

impl Record {
    /// Render this record as the text that follows the `@@` marker, e.g.
    /// `PROGRESS:1+0:3`. The caller is responsible for prefixing `@@` and a
    /// trailing newline when writing to a pipe.
    pub fn encode(&self) -> String {
        match self {
            Record::Ready => "READY".to_string(),
            Record::Solving => "SOLVING".to_string(),
            Record::Finished => "FINISHED".to_string(),
            Record::Partial => "PARTIAL".to_string(),
            Record::ProblemStart(idx) => format!("PROBLEM_START:{idx}"),
            Record::ProblemEnd(idx) => format!("PROBLEM_END:{idx}"),
            Record::SolutionStart => "SOLUTION_START".to_string(),
            Record::SolutionEnd => "SOLUTION_END".to_string(),
            Record::Text(body) => format!("TEXT:{body}"),
            Record::Time(secs) => format!("TIME:{secs}"),
            Record::Heartbeat(secs) => format!("HEARTBEAT:{secs}"),
            Record::Progress { m, k, positions } => format!("PROGRESS:{m}+{k}:{positions}"),
            Record::Combo(label) => format!("COMBO:{label}"),
            Record::Debug(text) => format!("DEBUG:{text}"),
            Record::Error(text) => format!("ERROR:{text}"),
            Record::Unknown(rest) => rest.clone(),
        }
    }

    /// Write this record as a complete, newline-terminated line.
    pub fn write_line(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "{MARKER}{}", self.encode())
    }

    /// Parse the text that follows an `@@` marker (no marker, no newline).
    pub fn parse(tag_and_body: &str) -> Record {
        let (tag, body) = match tag_and_body.split_once(':') {
            Some((t, b)) => (t, Some(b)),
            None => (tag_and_body, None),
        };
        match (tag, body) {
            ("READY", _) => Record::Ready,
            ("SOLVING", _) => Record::Solving,
            ("FINISHED", _) => Record::Finished,
            ("PARTIAL", _) => Record::Partial,
            ("SOLUTION_START", _) => Record::SolutionStart,
            ("SOLUTION_END", _) => Record::SolutionEnd,
            ("PROBLEM_START", Some(b)) => b
                .parse()
                .map(Record::ProblemStart)
                .unwrap_or_else(|_| Record::Unknown(tag_and_body.to_string())),
            ("PROBLEM_END", Some(b)) => b
                .parse()
                .map(Record::ProblemEnd)
                .unwrap_or_else(|_| Record::Unknown(tag_and_body.to_string())),
            ("TEXT", Some(b)) => Record::Text(b.to_string()),
            ("TEXT", None) => Record::Text(String::new()),
            ("TIME", Some(b)) => b
                .parse()
                .map(Record::Time)
                .unwrap_or_else(|_| Record::Unknown(tag_and_body.to_string())),
            ("HEARTBEAT", Some(b)) => b
                .parse()
                .map(Record::Heartbeat)
                .unwrap_or_else(|_| Record::Unknown(tag_and_body.to_string())),
            ("PROGRESS", Some(b)) => {
                Self::parse_progress(b).unwrap_or_else(|| Record::Unknown(tag_and_body.to_string()))
            }
            ("COMBO", Some(b)) => Record::Combo(b.to_string()),
            ("DEBUG", Some(b)) => Record::Debug(b.to_string()),
            ("DEBUG", None) => Record::Debug(String::new()),
            ("ERROR", Some(b)) => Record::Error(b.to_string()),
            ("ERROR", None) => Record::Error(String::new()),
            _ => Record::Unknown(tag_and_body.to_string()),
        }
    }

    fn parse_progress(body: &str) -> Option<Record> {
        let (depth, positions) = body.split_once(':')?;
        let (m, k) = depth.split_once('+')?;
        Some(Record::Progress {
            m: m.parse().ok()?,
            k: k.parse().ok()?,
            positions: positions.parse().ok()?,
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MARKER}{}", self.encode())
    }
}

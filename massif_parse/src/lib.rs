//! Valgrind Massif output parser library.
//!
//! This library parses the text files written by `valgrind --tool=massif`
//! from any `Read`-able source (or any source of lines) and provides
//! structured access to the profiled run and its memory snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use massif_parse::Massif;
//!
//! let file = File::open("massif.out.1234").unwrap();
//! let massif = Massif::parse(file).unwrap();
//!
//! println!("Command: {:?}", massif.command_line());
//! println!("Snapshots: {}", massif.snapshots.len());
//! ```

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Read};
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Line that opens each snapshot block, and separates the snapshot number
/// from the snapshot's variables.
pub const SNAPSHOT_SEPARATOR: &str = "#-----------";

/// Value of `heap_tree` for snapshots without a heap tree.
const EMPTY_HEAP_TREE: &str = "empty";

const SNAPSHOT_CONTEXT: &str = "snapshot";

/// Errors that can occur during Massif parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("[line {line}] {kind}")]
    Format { line: usize, kind: FormatErrorKind },
}

impl ParseError {
    /// The 1-based line a format error was reported on.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Format { line, .. } => Some(*line),
            ParseError::Io(_) => None,
        }
    }
}

/// The cause of a format error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatErrorKind {
    #[error("got line {got:?}, expected {expected:?}")]
    UnexpectedLine { got: String, expected: &'static str },

    #[error("got {got:?}, expected variable \"{expected}=...\"")]
    MissingEquals { got: String, expected: &'static str },

    #[error("got variable {got:?}, but looking for variable {expected:?}")]
    WrongVariable { got: String, expected: &'static str },

    #[error("variable {name:?} has non-integer value {value:?}: {source}")]
    InvalidInteger {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unexpected end of file while parsing {context}")]
    UnexpectedEof { context: &'static str },

    #[error("trailing unparsable content starting on this line")]
    TrailingContent,
}

/// Result type for Massif parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

// ============================================================================
// Document types
// ============================================================================

/// A single memory measurement taken during the profiled run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot number as written by Massif. Not checked for uniqueness.
    pub index: i64,
    /// Time of the snapshot, in the file's `time_unit`.
    pub time: String,
    /// Useful heap bytes.
    pub memory_heap: i64,
    /// Heap bytes lost to allocator overhead and alignment.
    pub memory_heap_extra: i64,
    /// Stack bytes.
    pub memory_stack: i64,
    /// Verbatim heap tree, or empty for `heap_tree=empty` snapshots.
    #[serde(default)]
    pub heap_tree: String,
}

impl Snapshot {
    /// Heap, heap overhead and stack bytes combined.
    pub fn total_bytes(&self) -> i64 {
        self.memory_heap
            .saturating_add(self.memory_heap_extra)
            .saturating_add(self.memory_stack)
    }

    /// Whether this snapshot carries a heap tree.
    pub fn is_detailed(&self) -> bool {
        !self.heap_tree.is_empty()
    }
}

/// A parsed Massif file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Massif {
    /// Value of the `desc:` line (usually the Massif options used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The profiled program, first word of the `cmd:` line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    /// Remaining words of the `cmd:` line.
    ///
    /// The command line is split on whitespace only, so quoted arguments
    /// containing spaces come back as several entries.
    #[serde(default)]
    pub args: Vec<String>,
    /// Value of the `time_unit:` line (`i`, `ms` or `B`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    /// Snapshots in file order.
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl Massif {
    /// Parse a Massif file from any `Read`-able source.
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        Self::parse_buffered(BufReader::new(reader))
    }

    /// Parse a Massif file from a buffered source.
    ///
    /// Bytes that are not valid UTF-8 (e.g. Latin-1 paths in a heap tree)
    /// are replaced with U+FFFD rather than failing the parse.
    pub fn parse_buffered<B: BufRead>(reader: B) -> Result<Self> {
        Self::parse_lines(LossyLines { reader })
    }

    /// Parse a Massif file from a sequence of lines without terminators.
    pub fn parse_lines<I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        Parser::new(lines.into_iter()).parse()
    }

    /// The snapshot with the largest useful heap size. The earliest one
    /// wins on ties.
    pub fn peak_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .fold(None, |peak: Option<&Snapshot>, snapshot| match peak {
                Some(p) if p.memory_heap >= snapshot.memory_heap => Some(p),
                _ => Some(snapshot),
            })
    }

    /// Snapshots that carry a heap tree.
    pub fn detailed_snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter().filter(|s| s.is_detailed())
    }

    /// The profiled command, rejoined with single spaces.
    pub fn command_line(&self) -> Option<String> {
        let binary = self.binary.as_deref()?;
        let words: Vec<&str> = std::iter::once(binary)
            .chain(self.args.iter().map(String::as_str))
            .collect();
        Some(words.join(" "))
    }
}

impl FromStr for Massif {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s.as_bytes())
    }
}

// ============================================================================
// Line cursor
// ============================================================================

/// Splits a byte stream on `\n`, dropping `\r\n` terminators and decoding
/// each line lossily.
struct LossyLines<B> {
    reader: B,
}

impl<B: BufRead> Iterator for LossyLines<B> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Forward-only view over a line source that remembers the current line.
struct LineCursor<I> {
    lines: I,
    current: String,
    line: usize,
    at_eof: bool,
}

impl<I: Iterator<Item = io::Result<String>>> LineCursor<I> {
    fn new(lines: I) -> Self {
        Self {
            lines,
            current: String::new(),
            line: 0,
            at_eof: false,
        }
    }

    /// Move to the next line. Once the source is exhausted this is a no-op
    /// and the current line stays empty.
    fn advance(&mut self) -> Result<()> {
        if self.at_eof {
            return Ok(());
        }
        match self.lines.next() {
            Some(line) => {
                self.current = line?;
                self.line += 1;
            }
            None => {
                self.current.clear();
                self.at_eof = true;
            }
        }
        Ok(())
    }

    fn current(&self) -> &str {
        &self.current
    }

    fn line(&self) -> usize {
        self.line
    }

    fn at_end(&self) -> bool {
        self.at_eof
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Per-call parser state: the cursor plus the document built so far.
struct Parser<I> {
    cursor: LineCursor<I>,
    massif: Massif,
}

impl<I: Iterator<Item = io::Result<String>>> Parser<I> {
    fn new(lines: I) -> Self {
        Self {
            cursor: LineCursor::new(lines),
            massif: Massif::default(),
        }
    }

    fn parse(mut self) -> Result<Massif> {
        self.scan(None)?;
        self.parse_header()?;

        while self.cursor.current() == SNAPSHOT_SEPARATOR {
            let snapshot = self.parse_snapshot()?;
            self.massif.snapshots.push(snapshot);
        }

        if !self.cursor.at_end() {
            return Err(self.format_error(FormatErrorKind::TrailingContent));
        }

        debug!(
            "parsed {} snapshots from {} lines",
            self.massif.snapshots.len(),
            self.cursor.line()
        );
        Ok(self.massif)
    }

    fn format_error(&self, kind: FormatErrorKind) -> ParseError {
        ParseError::Format {
            line: self.cursor.line(),
            kind,
        }
    }

    /// Advance the cursor. With a context, running out of input is an error
    /// because another line is still required.
    fn scan(&mut self, context: Option<&'static str>) -> Result<()> {
        self.cursor.advance()?;
        match context {
            Some(context) if self.cursor.at_end() => {
                Err(self.format_error(FormatErrorKind::UnexpectedEof { context }))
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------------

    fn parse_header(&mut self) -> Result<()> {
        self.massif.description = self.parse_header_field("desc")?;

        if let Some(command) = self.parse_header_field("cmd")? {
            let mut words = command.split_whitespace().map(str::to_string);
            self.massif.binary = words.next();
            self.massif.args = words.collect();
        }

        self.massif.time_unit = self.parse_header_field("time_unit")?;
        Ok(())
    }

    /// Consume a `<field>: <value>` line if the current line is one.
    fn parse_header_field(&mut self, field: &str) -> Result<Option<String>> {
        let value = match self
            .cursor
            .current()
            .strip_prefix(field)
            .and_then(|rest| rest.strip_prefix(": "))
        {
            Some(value) => value.to_string(),
            None => return Ok(None),
        };
        debug!("header {}: {:?}", field, value);
        self.scan(None)?;
        Ok(Some(value))
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    fn parse_snapshot(&mut self) -> Result<Snapshot> {
        let context = Some(SNAPSHOT_CONTEXT);

        self.eat_line(SNAPSHOT_SEPARATOR, context)?;
        let index = self.parse_integer_variable("snapshot")?;
        self.scan(context)?;
        self.eat_line(SNAPSHOT_SEPARATOR, context)?;

        let time = self.parse_variable("time")?;
        self.scan(context)?;
        let memory_heap = self.parse_integer_variable("mem_heap_B")?;
        self.scan(context)?;
        let memory_heap_extra = self.parse_integer_variable("mem_heap_extra_B")?;
        self.scan(context)?;
        let memory_stack = self.parse_integer_variable("mem_stacks_B")?;
        self.scan(context)?;

        let heap_tree = if self.parse_variable("heap_tree")? == EMPTY_HEAP_TREE {
            self.scan(None)?;
            String::new()
        } else {
            // The cursor still sits on the heap_tree line.
            self.parse_heap_tree()?
        };

        debug!(
            "snapshot {} at time {}: heap={} extra={} stacks={} detailed={}",
            index,
            time,
            memory_heap,
            memory_heap_extra,
            memory_stack,
            !heap_tree.is_empty()
        );

        Ok(Snapshot {
            index,
            time,
            memory_heap,
            memory_heap_extra,
            memory_stack,
            heap_tree,
        })
    }

    /// Require the current line to be exactly `expected`, then move past it.
    fn eat_line(&mut self, expected: &'static str, context: Option<&'static str>) -> Result<()> {
        if self.cursor.current() != expected {
            return Err(self.format_error(FormatErrorKind::UnexpectedLine {
                got: self.cursor.current().to_string(),
                expected,
            }));
        }
        self.scan(context)
    }

    /// Read the value of a `name=value` line. Does not advance.
    fn parse_variable(&self, name: &'static str) -> Result<String> {
        let line = self.cursor.current();
        let Some((parsed_name, value)) = line.split_once('=') else {
            return Err(self.format_error(FormatErrorKind::MissingEquals {
                got: line.to_string(),
                expected: name,
            }));
        };
        if parsed_name != name {
            return Err(self.format_error(FormatErrorKind::WrongVariable {
                got: parsed_name.to_string(),
                expected: name,
            }));
        }
        Ok(value.to_string())
    }

    fn parse_integer_variable(&self, name: &'static str) -> Result<i64> {
        let value = self.parse_variable(name)?;
        match value.parse::<i64>() {
            Ok(n) => Ok(n),
            Err(source) => Err(self.format_error(FormatErrorKind::InvalidInteger {
                name,
                value,
                source,
            })),
        }
    }

    /// Collect lines verbatim up to the next separator or end of input,
    /// leaving the separator as the current line.
    fn parse_heap_tree(&mut self) -> Result<String> {
        let mut tree: Vec<String> = Vec::new();
        loop {
            self.cursor.advance()?;
            if self.cursor.at_end() || self.cursor.current() == SNAPSHOT_SEPARATOR {
                break;
            }
            tree.push(self.cursor.current().to_string());
        }
        trace!("heap tree of {} lines", tree.len());
        Ok(tree.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A truncated "detailed" heap.
    const DETAILED_HEAP: &str = "n6: 1123587 (heap allocation functions) malloc/new/new[], --alloc-fns, etc.
 n2: 639061 0x10F42A: void std::__cxx11::basic_string<char, std::char_traits<char>, std::allocator<char> >::_M_construct<char*>(char*, char*, std::forward_iterator_tag) (basic_string.tcc:219)
  n1: 637595 0x119232: _M_construct_aux<char*> (basic_string.h:247)
   n1: 637595 0x119232: _M_construct<char*> (basic_string.h:266)
    n1: 637595 0x119232: basic_string (basic_string.h:451)
 n0: 12558 in 28 places, all below massif's threshold (1.00%)";

    const EXAMPLE: &str = include_str!("../testdata/example.massif");

    fn empty_snapshot(index: i64) -> String {
        [
            SNAPSHOT_SEPARATOR,
            format!("snapshot={}", index).as_str(),
            SNAPSHOT_SEPARATOR,
            "time=0",
            "mem_heap_B=0",
            "mem_heap_extra_B=0",
            "mem_stacks_B=0",
            "heap_tree=empty",
        ]
        .join("\n")
    }

    fn parse(data: &str) -> Result<Massif> {
        Massif::parse(Cursor::new(data))
    }

    fn format_error(result: Result<Massif>) -> (usize, FormatErrorKind) {
        match result {
            Err(ParseError::Format { line, kind }) => (line, kind),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn parse_header_only() {
        let data = [
            "desc: --massif-out-file=/outs/blah.massif",
            "cmd: /some/foo/command --first-option --second-option",
            "time_unit: i",
        ]
        .join("\n");
        let massif = parse(&data).unwrap();

        assert_eq!(
            massif,
            Massif {
                description: Some("--massif-out-file=/outs/blah.massif".to_string()),
                binary: Some("/some/foo/command".to_string()),
                args: vec!["--first-option".to_string(), "--second-option".to_string()],
                time_unit: Some("i".to_string()),
                snapshots: vec![],
            }
        );
    }

    #[test]
    fn parse_partial_header() {
        let massif = parse("cmd: ./app\ntime_unit: ms").unwrap();

        assert_eq!(massif.description, None);
        assert_eq!(massif.binary.as_deref(), Some("./app"));
        assert!(massif.args.is_empty());
        assert_eq!(massif.time_unit.as_deref(), Some("ms"));
    }

    #[test]
    fn empty_input_is_empty_document() {
        let massif = parse("").unwrap();
        assert_eq!(massif, Massif::default());
    }

    #[test]
    fn blank_command_has_no_binary() {
        let massif = parse("cmd: ").unwrap();
        assert_eq!(massif.binary, None);
        assert!(massif.args.is_empty());
    }

    #[test]
    fn command_line_keeps_quotes_as_words() {
        let massif = parse("cmd: prog \"two words\"").unwrap();
        assert_eq!(massif.args, vec!["\"two", "words\""]);
        assert_eq!(massif.command_line().as_deref(), Some("prog \"two words\""));
    }

    #[test]
    fn parse_single_empty_snapshot() {
        let massif = parse(&empty_snapshot(0)).unwrap();

        assert_eq!(massif.description, None);
        assert_eq!(
            massif.snapshots,
            vec![Snapshot {
                index: 0,
                time: "0".to_string(),
                memory_heap: 0,
                memory_heap_extra: 0,
                memory_stack: 0,
                heap_tree: String::new(),
            }]
        );
    }

    #[test]
    fn parse_single_detailed_snapshot() {
        let data = [
            SNAPSHOT_SEPARATOR,
            "snapshot=2",
            SNAPSHOT_SEPARATOR,
            "time=1",
            "mem_heap_B=2",
            "mem_heap_extra_B=3",
            "mem_stacks_B=4",
            "heap_tree=detailed",
            DETAILED_HEAP,
        ]
        .join("\n");
        let massif = parse(&data).unwrap();

        assert_eq!(massif.snapshots.len(), 1);
        let snapshot = &massif.snapshots[0];
        assert_eq!(snapshot.index, 2);
        assert_eq!(snapshot.time, "1");
        assert_eq!(snapshot.memory_heap, 2);
        assert_eq!(snapshot.memory_heap_extra, 3);
        assert_eq!(snapshot.memory_stack, 4);
        assert_eq!(snapshot.heap_tree, DETAILED_HEAP);
        assert_eq!(snapshot.total_bytes(), 9);
    }

    #[test]
    fn parse_three_snapshots() {
        let data = [
            empty_snapshot(0).as_str(),
            SNAPSHOT_SEPARATOR,
            "snapshot=1",
            SNAPSHOT_SEPARATOR,
            "time=103242501",
            "mem_heap_B=1123587",
            "mem_heap_extra_B=89197",
            "mem_stacks_B=0",
            "heap_tree=detailed",
            format!("{}1", DETAILED_HEAP).as_str(),
            SNAPSHOT_SEPARATOR,
            "snapshot=2",
            SNAPSHOT_SEPARATOR,
            "time=161677632",
            "mem_heap_B=1616423",
            "mem_heap_extra_B=140569",
            "mem_stacks_B=0",
            "heap_tree=peak",
            format!("{}2", DETAILED_HEAP).as_str(),
        ]
        .join("\n");
        let massif = parse(&data).unwrap();

        let indexes: Vec<i64> = massif.snapshots.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(massif.snapshots[0].heap_tree, "");
        assert_eq!(massif.snapshots[1].time, "103242501");
        assert_eq!(massif.snapshots[1].memory_heap, 1123587);
        assert_eq!(massif.snapshots[1].heap_tree, format!("{}1", DETAILED_HEAP));
        assert_eq!(massif.snapshots[2].memory_heap_extra, 140569);
        assert_eq!(massif.snapshots[2].heap_tree, format!("{}2", DETAILED_HEAP));
        assert_eq!(massif.detailed_snapshots().count(), 2);
    }

    #[test]
    fn heap_tree_is_verbatim() {
        let data = format!(
            "{}\n{}\n",
            empty_snapshot(0).replace("heap_tree=empty", "heap_tree=detailed"),
            "  indented  \n\n#----------- not a separator"
        );
        let massif = parse(&data).unwrap();

        assert_eq!(
            massif.snapshots[0].heap_tree,
            "  indented  \n\n#----------- not a separator"
        );
    }

    #[test]
    fn detailed_tag_without_tree_lines() {
        let data = format!(
            "{}\n{}",
            empty_snapshot(0).replace("heap_tree=empty", "heap_tree=detailed"),
            empty_snapshot(1)
        );
        let massif = parse(&data).unwrap();

        assert_eq!(massif.snapshots.len(), 2);
        assert_eq!(massif.snapshots[0].heap_tree, "");
        assert_eq!(massif.snapshots[1].index, 1);
    }

    #[test]
    fn crlf_line_endings() {
        let data = empty_snapshot(4).replace('\n', "\r\n") + "\r\n";
        let massif = parse(&data).unwrap();

        assert_eq!(massif.snapshots.len(), 1);
        assert_eq!(massif.snapshots[0].index, 4);
    }

    #[test]
    fn parse_example_file() {
        let massif: Massif = EXAMPLE.parse().unwrap();

        assert_eq!(
            massif.description.as_deref(),
            Some("--massif-out-file=./example.massif")
        );
        assert_eq!(massif.binary.as_deref(), Some("example_binary"));
        assert_eq!(
            massif.args,
            vec!["--option-one", "--option-two", "--flag=value"]
        );
        assert_eq!(massif.time_unit.as_deref(), Some("i"));
        assert_eq!(massif.snapshots.len(), 4);
        assert_eq!(
            massif.snapshots[1].heap_tree,
            "Note: This heap is snipped.\n\
             n6: 1123587 (heap allocation functions) malloc/new/new[], --alloc-fns, etc.\n \
             n0: 12558 in 28 places, all below massif's threshold (1.00%)"
        );
        assert_eq!(massif.snapshots[3].heap_tree, "");

        let peak = massif.peak_snapshot().unwrap();
        assert_eq!(peak.index, 3);
        assert_eq!(peak.time, "273947848");
        assert_eq!(peak.memory_heap, 22066184);
    }

    #[test]
    fn peak_prefers_earliest_on_ties() {
        let data = format!("{}\n{}", empty_snapshot(7), empty_snapshot(8));
        let massif = parse(&data).unwrap();
        assert_eq!(massif.peak_snapshot().unwrap().index, 7);
        assert!(Massif::default().peak_snapshot().is_none());
    }

    #[test]
    fn truncated_snapshot_fails() {
        let data = empty_snapshot(0).replace("\nheap_tree=empty", "");
        let result = parse(&data);

        let err = result.unwrap_err();
        assert_eq!(err.line(), Some(7));
        assert_eq!(
            err.to_string(),
            "[line 7] unexpected end of file while parsing snapshot"
        );
    }

    #[test]
    fn truncated_before_second_separator_fails() {
        let data = [SNAPSHOT_SEPARATOR, "snapshot=0"].join("\n");
        let (line, kind) = format_error(parse(&data));

        assert_eq!(line, 2);
        assert_eq!(kind, FormatErrorKind::UnexpectedEof { context: "snapshot" });
    }

    #[test]
    fn lone_separator_fails() {
        let (line, kind) = format_error(parse(SNAPSHOT_SEPARATOR));
        assert_eq!(line, 1);
        assert_eq!(kind, FormatErrorKind::UnexpectedEof { context: "snapshot" });
    }

    #[test]
    fn missing_second_separator_fails() {
        let data = [SNAPSHOT_SEPARATOR, "snapshot=0", "time=0"].join("\n");
        let (line, kind) = format_error(parse(&data));

        assert_eq!(line, 3);
        assert_eq!(
            kind,
            FormatErrorKind::UnexpectedLine {
                got: "time=0".to_string(),
                expected: SNAPSHOT_SEPARATOR,
            }
        );
    }

    #[test]
    fn out_of_order_variable_fails() {
        let data = [
            SNAPSHOT_SEPARATOR,
            "snapshot=0",
            SNAPSHOT_SEPARATOR,
            "time=0",
            "mem_heap_extra_B=0",
            "mem_heap_B=0",
        ]
        .join("\n");
        let (line, kind) = format_error(parse(&data));

        assert_eq!(line, 5);
        assert_eq!(
            kind,
            FormatErrorKind::WrongVariable {
                got: "mem_heap_extra_B".to_string(),
                expected: "mem_heap_B",
            }
        );
    }

    #[test]
    fn variable_without_equals_fails() {
        let data = [SNAPSHOT_SEPARATOR, "snapshot 0"].join("\n");
        let (line, kind) = format_error(parse(&data));

        assert_eq!(line, 2);
        assert_eq!(
            kind,
            FormatErrorKind::MissingEquals {
                got: "snapshot 0".to_string(),
                expected: "snapshot",
            }
        );
    }

    #[test]
    fn non_integer_value_fails() {
        let data = empty_snapshot(0).replace("mem_heap_B=0", "mem_heap_B=12k");
        let (line, kind) = format_error(parse(&data));

        assert_eq!(line, 5);
        assert!(matches!(
            kind,
            FormatErrorKind::InvalidInteger { name: "mem_heap_B", ref value, .. } if value == "12k"
        ));
    }

    #[test]
    fn line_numbers_count_heap_tree_lines() {
        let data = [
            SNAPSHOT_SEPARATOR,
            "snapshot=0",
            SNAPSHOT_SEPARATOR,
            "time=0",
            "mem_heap_B=0",
            "mem_heap_extra_B=0",
            "mem_stacks_B=0",
            "heap_tree=detailed",
            "n1: 10 a",
            " n1: 10 b",
            "  n0: 10 c",
            SNAPSHOT_SEPARATOR,
            "snapshot=1",
            SNAPSHOT_SEPARATOR,
            "time=5",
            "mem_heap_B=oops",
        ]
        .join("\n");
        let (line, _) = format_error(parse(&data));
        assert_eq!(line, 16);
    }

    #[test]
    fn trailing_content_after_header_fails() {
        let data = "desc: x\ncmd: y\ntime_unit: i\ngarbage";
        let (line, kind) = format_error(parse(data));

        assert_eq!(line, 4);
        assert_eq!(kind, FormatErrorKind::TrailingContent);
    }

    #[test]
    fn trailing_content_after_snapshot_fails() {
        let data = format!("{}\noops", empty_snapshot(0));
        let (line, kind) = format_error(parse(&data));

        assert_eq!(line, 9);
        assert_eq!(kind, FormatErrorKind::TrailingContent);
    }

    #[test]
    fn header_fields_out_of_order_fail() {
        let (line, kind) = format_error(parse("time_unit: i\ndesc: late"));
        assert_eq!(line, 2);
        assert_eq!(kind, FormatErrorKind::TrailingContent);
    }

    #[test]
    fn separator_with_trailing_text_is_not_a_separator() {
        let data = format!("{} \nsnapshot=0", SNAPSHOT_SEPARATOR);
        let (line, kind) = format_error(parse(&data));
        assert_eq!(line, 1);
        assert_eq!(kind, FormatErrorKind::TrailingContent);
    }

    #[test]
    fn invalid_utf8_in_heap_tree_is_kept() {
        let mut data = empty_snapshot(0)
            .replace("heap_tree=empty", "heap_tree=detailed")
            .into_bytes();
        data.extend_from_slice(b"\nn0: 10 0x1: f (caf\xE9.c:3)\r\n");
        let massif = Massif::parse(Cursor::new(data)).unwrap();

        assert_eq!(massif.snapshots.len(), 1);
        assert_eq!(
            massif.snapshots[0].heap_tree,
            "n0: 10 0x1: f (caf\u{FFFD}.c:3)"
        );
    }

    #[test]
    fn io_error_is_not_a_format_error() {
        let lines = vec![
            Ok("desc: x".to_string()),
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire")),
        ];
        let result = Massif::parse_lines(lines);

        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[test]
    fn independent_parses_run_concurrently() {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| EXAMPLE.parse::<Massif>().unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().snapshots.len(), 4);
            }
        });
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let massif = parse(&format!("time_unit: B\n{}", empty_snapshot(0))).unwrap();
        let json = serde_json::to_value(&massif).unwrap();

        assert!(json.get("description").is_none());
        assert_eq!(json["time_unit"], "B");
        assert_eq!(json["snapshots"][0]["memory_heap_extra"], 0);
        assert_eq!(json["snapshots"][0]["heap_tree"], "");

        let back: Massif = serde_json::from_value(json).unwrap();
        assert_eq!(back, massif);
    }
}

//! The diagnostics object collects the errors and warnings produced by
//! semantic analysis, in the order they were found.
//!
//! Messages are kept instead of being written immediately, so the caller
//! decides where and whether the report is printed.
//!
//! This implementation is NOT thread-safe.
use failure::Fail;
use std::{fmt, io};
use termcolor::{Color, WriteColor};
use utils::color::ColorOutput;

#[derive(Default)]
pub struct Diagnostics {
    messages: Vec<Message>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error or a warning. `line` is `None` for messages that
    /// cannot be attributed to a source line.
    pub fn emit(&mut self, level: MessageLevel, line: Option<usize>, kind: Box<dyn Fail>) {
        self.messages.push(Message { level, line, kind });
    }

    pub fn error(&mut self, line: Option<usize>, kind: impl Fail) {
        self.emit(MessageLevel::Error, line, Box::new(kind))
    }

    pub fn warning(&mut self, line: Option<usize>, kind: impl Fail) {
        self.emit(MessageLevel::Warning, line, Box::new(kind))
    }

    /// True when an error message was emitted, false
    /// if only warnings were emitted.
    pub fn errored(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.at_level(level).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.at_level(MessageLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.at_level(MessageLevel::Warning)
    }

    fn at_level(&self, level: MessageLevel) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |msg| msg.level == level)
    }

    pub fn write_report(&self, writer: &mut dyn WriteColor) -> io::Result<()> {
        if self.messages.is_empty() {
            let mut output = ColorOutput::new(writer);
            output.heading(Some(Color::Green));
            return writeln!(output.writer(), "No type errors found!");
        }

        self.write_section(writer, MessageLevel::Error)?;
        self.write_section(writer, MessageLevel::Warning)
    }

    fn write_section(&self, writer: &mut dyn WriteColor, level: MessageLevel) -> io::Result<()> {
        if self.count(level) == 0 {
            return Ok(());
        }

        let mut output = ColorOutput::new(writer);
        output.heading(level.color());
        writeln!(output.writer(), "{}:", level.heading())?;
        output.plain();

        for msg in self.at_level(level) {
            writeln!(output.writer(), "  {}", msg)?;
        }
        Ok(())
    }

    pub fn write_statistics(&self, writer: &mut dyn WriteColor) -> io::Result<()> {
        let mut output = ColorOutput::new(writer);
        output.set_bold(true);

        if self.errored() {
            output.set_color(MessageLevel::Error.color());
            writeln!(
                output.writer(),
                "Analysis failed with {}{}",
                match self.count(MessageLevel::Error) {
                    1 => "an error".to_string(),
                    n => format!("{} errors", n),
                },
                match self.count(MessageLevel::Warning) {
                    0 => String::new(),
                    1 => " and a warning".to_string(),
                    n => format!(" and {} warnings", n),
                }
            )
        } else {
            output.set_color(Some(Color::Green));
            writeln!(
                output.writer(),
                "Analysis finished successfully {}",
                match self.count(MessageLevel::Warning) {
                    0 => "without warnings".to_string(),
                    1 => "with a warning".to_string(),
                    n => format!("with {} warnings", n),
                }
            )
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MessageLevel {
    Error,
    Warning,
}

impl MessageLevel {
    pub fn color(self) -> Option<Color> {
        // Don't be confused by the return type. `None` means default color!
        match self {
            MessageLevel::Error => Some(Color::Red),
            MessageLevel::Warning => Some(Color::Yellow),
        }
    }

    fn heading(self) -> &'static str {
        match self {
            MessageLevel::Error => "TYPE ERRORS",
            MessageLevel::Warning => "TYPE WARNINGS",
        }
    }
}

#[derive(Debug)]
pub struct Message {
    pub level: MessageLevel,
    pub line: Option<usize>,
    pub kind: Box<dyn Fail>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[derive(Debug, Fail)]
    enum TestMessage {
        #[fail(display = "something is off with '{}'", name)]
        Off { name: String },
        #[fail(display = "plain")]
        Plain,
    }

    fn render(f: impl Fn(&Diagnostics, &mut Buffer) -> io::Result<()>, diag: &Diagnostics) -> String {
        let mut buf = Buffer::no_color();
        f(diag, &mut buf).unwrap();
        String::from_utf8(buf.into_inner()).unwrap()
    }

    #[test]
    fn message_renders_with_and_without_line() {
        let mut diag = Diagnostics::new();
        diag.error(Some(7), TestMessage::Off { name: "x".to_string() });
        diag.warning(None, TestMessage::Plain);

        let errors: Vec<String> = diag.errors().map(|m| m.to_string()).collect();
        let warnings: Vec<String> = diag.warnings().map(|m| m.to_string()).collect();
        assert_eq!(errors, vec!["Line 7: something is off with 'x'"]);
        assert_eq!(warnings, vec!["plain"]);
    }

    #[test]
    fn counts_by_level_and_keeps_order() {
        let mut diag = Diagnostics::new();
        assert!(!diag.errored());

        diag.warning(Some(1), TestMessage::Plain);
        assert!(!diag.errored());

        diag.error(Some(3), TestMessage::Off { name: "b".to_string() });
        diag.error(Some(2), TestMessage::Off { name: "a".to_string() });
        assert!(diag.errored());
        assert_eq!(diag.count(MessageLevel::Error), 2);
        assert_eq!(diag.count(MessageLevel::Warning), 1);

        let lines: Vec<Option<usize>> = diag.errors().map(|m| m.line).collect();
        assert_eq!(lines, vec![Some(3), Some(2)]);
    }

    #[test]
    fn empty_report() {
        let diag = Diagnostics::new();
        let out = render(|d, w| d.write_report(w), &diag);
        assert_eq!(out, "No type errors found!\n");
    }

    #[test]
    fn report_lists_errors_before_warnings() {
        let mut diag = Diagnostics::new();
        diag.warning(Some(4), TestMessage::Plain);
        diag.error(Some(5), TestMessage::Off { name: "y".to_string() });

        let out = render(|d, w| d.write_report(w), &diag);
        assert_eq!(
            out,
            "TYPE ERRORS:\n  Line 5: something is off with 'y'\nTYPE WARNINGS:\n  Line 4: plain\n"
        );
    }

    #[test]
    fn report_omits_empty_sections() {
        let mut diag = Diagnostics::new();
        diag.warning(None, TestMessage::Plain);

        let out = render(|d, w| d.write_report(w), &diag);
        assert_eq!(out, "TYPE WARNINGS:\n  plain\n");
    }

    #[test]
    fn statistics() {
        let mut diag = Diagnostics::new();
        assert_eq!(
            render(|d, w| d.write_statistics(w), &diag),
            "Analysis finished successfully without warnings\n"
        );

        diag.warning(None, TestMessage::Plain);
        assert_eq!(
            render(|d, w| d.write_statistics(w), &diag),
            "Analysis finished successfully with a warning\n"
        );

        diag.error(Some(1), TestMessage::Plain);
        diag.error(Some(2), TestMessage::Plain);
        assert_eq!(
            render(|d, w| d.write_statistics(w), &diag),
            "Analysis failed with 2 errors and a warning\n"
        );
    }
}

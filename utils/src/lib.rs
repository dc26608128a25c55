pub mod color;

use std::{fs::File, io, path::PathBuf};
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};

#[macro_export]
macro_rules! assert_matches {
    ($expression: expr, $( $pattern: pat )|*) => {{
        match $expression {
            $( $pattern )|* => (),
            expression => panic!(
                r#"assertion failed: `(if let pattern = expression), {}:{}:{}`
pattern: `{}`,
expression: `{:?}`"#,
                file!(),
                line!(),
                column!(),
                stringify!($( $pattern )|*),
                expression
            ),
        }
    }};
}

/// Where reports end up. Files never receive color escape sequences.
#[derive(Debug, Clone)]
pub enum OutputSpecification {
    Stdout,
    File(PathBuf),
}

impl OutputSpecification {
    pub fn writer(&self, color: ColorChoice) -> io::Result<Box<dyn WriteColor>> {
        match self {
            OutputSpecification::Stdout => Ok(Box::new(StandardStream::stdout(color))),
            OutputSpecification::File(path) => Ok(Box::new(NoColor::new(File::create(path)?))),
        }
    }
}

impl Default for OutputSpecification {
    fn default() -> Self {
        OutputSpecification::Stdout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn file_output_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        {
            let mut writer = OutputSpecification::File(path.clone())
                .writer(ColorChoice::Always)
                .unwrap();
            let mut output = color::ColorOutput::new(&mut *writer);
            output.set_bold(true);
            write!(output.writer(), "TYPE ERRORS:").unwrap();
        }
        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "TYPE ERRORS:");
    }

    #[test]
    fn assert_matches_accepts_alternatives() {
        let value: Option<u8> = Some(3);
        assert_matches!(value, Some(1) | Some(3));
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn assert_matches_panics_on_mismatch() {
        let value: Option<u8> = None;
        assert_matches!(value, Some(_));
    }
}

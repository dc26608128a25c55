#![warn(rust_2018_idioms)]
//! `semcheck` runs semantic analysis on a syntax tree produced by an external
//! parser and prints the errors and warnings it finds.
//!
//! The input is a JSON document `{ "program": ..., "tokens": [...] }`, where
//! `tokens` is optional. The process exits with 1 if analysis reported an
//! error or the input could not be read, and with 0 otherwise.
use ast::Program;
use failure::{Error, Fail, ResultExt};
use serde_derive::Deserialize;
use std::{
    fs::File,
    io::{self, Read, Write},
    path::PathBuf,
    process::exit,
};
use structopt::StructOpt;
use symtab::{SymbolTable, TokenEntry};
use termcolor::{Color, ColorChoice, WriteColor};
use type_checking::{CheckerOptions, TypeChecker};
use utils::{color::ColorOutput, OutputSpecification};

#[derive(Debug, Fail)]
pub enum CliError {
    #[fail(display = "cannot open input file {:?}", path)]
    OpenInput { path: PathBuf },
    #[fail(display = "cannot decode syntax tree in {:?}", path)]
    Decode { path: PathBuf },
    #[fail(display = "cannot write report to {:?}", output)]
    WriteOutput { output: OutputSpecification },
}

#[derive(StructOpt)]
#[structopt(name = "semcheck")]
pub struct CliCommand {
    /// JSON file holding the syntax tree to analyze.
    #[structopt(name = "FILE", parse(from_os_str))]
    input: PathBuf,
    /// Write the report to this file instead of stdout.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
    /// Register all method signatures before analyzing any method body, so
    /// calls to methods declared later resolve.
    #[structopt(long = "resolve-forward-calls")]
    resolve_forward_calls: bool,
    /// Statements and expressions nested deeper than this are reported
    /// instead of analyzed.
    #[structopt(long = "max-nesting-depth", default_value = "256")]
    max_nesting_depth: usize,
    /// Do not declare class fields as global variables.
    #[structopt(long = "no-fields")]
    no_fields: bool,
    /// Also list variables that are declared but never used.
    #[structopt(long = "unused")]
    unused: bool,
    /// Also print the token table, if the input carries tokens.
    #[structopt(long = "tokens")]
    tokens: bool,
    /// Print a summary line at the end.
    #[structopt(long = "statistics")]
    statistics: bool,
}

#[derive(Deserialize)]
struct Input {
    program: Program,
    #[serde(default)]
    tokens: Vec<TokenEntry>,
}

fn main() {
    env_logger::init();
    let cmd = CliCommand::from_args();

    match do_main(&cmd) {
        Ok(true) => exit(1),
        Ok(false) => {}
        Err(msg) => exit_with_error(&msg),
    }
}

/// Returns whether analysis reported errors.
fn do_main(cmd: &CliCommand) -> Result<bool, Error> {
    let contents = read_input(&cmd.input).context(CliError::OpenInput {
        path: cmd.input.clone(),
    })?;
    let input = decode_input(&contents).context(CliError::Decode {
        path: cmd.input.clone(),
    })?;

    let mut symtab = SymbolTable::new();
    if !cmd.no_fields {
        declare_class_fields(&mut symtab, &input.program);
    }
    for token in &input.tokens {
        symtab.add_token(&token.kind, &token.lexeme, token.line, token.column);
    }

    let options = CheckerOptions {
        resolve_forward_calls: cmd.resolve_forward_calls,
        max_nesting_depth: cmd.max_nesting_depth,
    };
    let mut checker = TypeChecker::with_options(&mut symtab, options);
    checker.analyze(&input.program);

    let output = match &cmd.output {
        Some(path) => OutputSpecification::File(path.clone()),
        None => OutputSpecification::Stdout,
    };
    write_reports(cmd, &checker, &output).context(CliError::WriteOutput { output })?;

    Ok(checker.has_errors())
}

fn read_input(path: &PathBuf) -> Result<String, Error> {
    let mut f = File::open(path)?;
    let mut contents = String::new();
    f.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Every level of the syntax tree costs several levels of JSON nesting, so
/// serde_json's recursion limit is lifted and the stack grows on demand.
/// Deep trees are bounded by `--max-nesting-depth` during analysis instead.
fn decode_input(contents: &str) -> Result<Input, serde_json::Error> {
    let mut json = serde_json::Deserializer::from_str(contents);
    json.disable_recursion_limit();
    let input = serde::Deserialize::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(input)
}

/// Fields are visible in every method, so they go into the global scope.
fn declare_class_fields(symtab: &mut SymbolTable, program: &Program) {
    for class in &program.classes {
        for (member, field) in class.fields() {
            log::debug!("Declaring field '{}' of class '{}'", field.name, class.name);
            symtab.add_variable(&field.name, &field.ty, member.line());
        }
    }
}

fn write_reports(
    cmd: &CliCommand,
    checker: &TypeChecker<'_>,
    output: &OutputSpecification,
) -> io::Result<()> {
    let mut writer = output.writer(ColorChoice::Auto)?;

    checker.write_report(&mut *writer)?;

    if cmd.unused {
        write_unused(&mut *writer, &checker.symtab().unused_variables())?;
    }

    if cmd.tokens && !checker.symtab().tokens().is_empty() {
        writeln!(writer, "{}", checker.symtab().token_table())?;
    }

    if cmd.statistics {
        checker.diagnostics().write_statistics(&mut *writer)?;
    }

    writer.flush()
}

fn write_unused(writer: &mut dyn WriteColor, unused: &[String]) -> io::Result<()> {
    let mut output = ColorOutput::new(writer);

    if unused.is_empty() {
        output.heading(Some(Color::Green));
        return writeln!(output.writer(), "No unused variables!");
    }

    output.heading(Some(Color::Yellow));
    writeln!(output.writer(), "UNUSED VARIABLES:")?;
    output.plain();
    for entry in unused {
        writeln!(output.writer(), "  {}", entry)?;
    }
    Ok(())
}

/// Print an error in a format intended for end users and terminate
/// the program.
fn exit_with_error(err: &Error) -> ! {
    let mut stderr = io::stderr();
    print_error(&mut stderr, err).ok();
    exit(1);
}

/// Print error objects in a format intended for end users
fn print_error(writer: &mut dyn io::Write, err: &Error) -> Result<(), Error> {
    writeln!(writer, "error: {}", err.as_fail())?;
    for cause in err.iter_causes() {
        writeln!(writer, "caused by: {}", cause)?;
    }
    Ok(())
}

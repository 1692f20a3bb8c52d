use clap::{CommandFactory, Parser};
use std::ffi::OsString;

/// Exit status for any failure, `-1` as seen by the shell.
pub const EXIT_FAILURE: u8 = 255;

/// Outcome of reading the command line.
#[derive(Debug)]
pub enum Cli<A> {
    Run(A),
    /// Usage was printed or parsing failed; exit with this status
    Exit(u8),
}

/// Parse `argv` into `A`; no arguments at all prints usage and exits cleanly.
///
/// Help requests exit with 0, every other parse error with [`EXIT_FAILURE`].
pub fn parse_cli<A: Parser>(
    argv: impl IntoIterator<Item = impl Into<OsString> + Clone>,
) -> Cli<A> {
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    if argv.len() <= 1 {
        let _ = A::command().print_help();
        return Cli::Exit(0);
    }

    match A::try_parse_from(argv) {
        Ok(args) => Cli::Run(args),
        Err(e) => {
            let _ = e.print();
            Cli::Exit(if e.use_stderr() { EXIT_FAILURE } else { 0 })
        }
    }
}

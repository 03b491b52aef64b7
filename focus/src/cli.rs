use clap::{error::ErrorKind, Arg, ArgAction, Command};
use std::ffi::OsString;
use std::process::ExitCode;

const CONTROLS: &str = "\
Controls:
  ?                  toggle help
  Space              start/stop timer
  R                  restart timer
  E                  toggle edit mode
  Esc                exit from any mode
  Q                  quit app";

pub enum Invocation {
    /// Launch the interactive timer.
    Run,
    /// Already handled; exit with this code.
    Exit(ExitCode),
}

pub fn command() -> Command {
    Command::new("focus")
        .version(clap::crate_version!())
        .about("focus - A minimalist pomodoro timer")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("show version information"),
        )
        .after_help(CONTROLS)
}

pub fn parse<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match command().try_get_matches_from(&args) {
        Ok(_) => Invocation::Run,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            Invocation::Exit(ExitCode::SUCCESS)
        }
        Err(_) => {
            let unknown = args
                .get(1)
                .map(|arg| arg.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("Unknown command: {}", unknown);
            Invocation::Exit(ExitCode::FAILURE)
        }
    }
}

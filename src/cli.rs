use clap::Parser;

/// CLI arguments parser using `clap`
///
/// Takes no arguments: a run checks `user.name`, `user.email` and
/// `user.signingkey` in the global Git config and fills in whatever is
/// missing from the GitHub account `gh` is logged in as.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {}

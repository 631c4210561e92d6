use clap::Subcommand;

use super::changed::ChangedArgs;
use super::config::ConfigArgs;
use super::parse::ParseArgs;
use super::run::RunArgs;
use super::translate::TranslateArgs;
use super::watch::WatchArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run scenario files (all scenarios when none are given)
    Run(RunArgs),

    /// List scenarios whose content changed since they last passed
    Changed(ChangedArgs),

    /// Preview how one step line translates
    Translate(TranslateArgs),

    /// Dump the parsed test cases of a scenario file
    Parse(ParseArgs),

    /// Watch the scenario directory and run changed files
    Watch(WatchArgs),

    /// Inspect or validate the translation configuration
    Config(ConfigArgs),

    /// Show build and configuration information
    Info,
}

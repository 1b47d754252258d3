//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod auth;
pub mod boards;
pub mod config_cmd;
pub mod dashboard;
pub mod status;
pub mod util;
pub mod vms;

use boardstack_core::Session;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Dispatch a backend-bound command, then surface its notifications and
/// any redirect to the login boundary.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let result = match cmd {
        Command::Boards(args) => boards::handle(session, args, global, format).await,
        Command::Vms(args) => vms::handle(session, args, global, format).await,
        Command::Status => status::handle(session, global, format).await,
        Command::Dashboard(args) => dashboard::handle(session, &args, global, format).await,
        Command::Login(args) => auth::login(session, args).await,
        Command::Logout => auth::logout(session, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal("command does not need a session".into()))
        }
    };

    output::print_notifications(
        &session.notifications().snapshot(),
        global.quiet,
        output::should_color(global.color),
    );

    if let Some(redirect) = session.last_redirect() {
        return Err(CliError::SessionExpired {
            location: redirect.location,
        });
    }
    result
}

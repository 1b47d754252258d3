//! Login and logout.

use std::io::{BufRead, IsTerminal};

use dialoguer::Input;
use secrecy::SecretString;

use boardstack_core::Session;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn read_username(arg: Option<String>) -> Result<String, CliError> {
    if let Some(username) = arg {
        return Ok(username);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "pass --username when not running interactively".into(),
        });
    }
    Input::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(prompt_err)
}

fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Password: ").map_err(prompt_err)?
    };
    Ok(SecretString::from(password))
}

pub async fn login(session: &Session, args: LoginArgs) -> Result<(), CliError> {
    let username = read_username(args.username)?;
    let password = read_password(args.password_stdin)?;
    if username.is_empty() {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "cannot be empty".into(),
        });
    }
    session.login(&username, &password).await?;
    Ok(())
}

pub fn logout(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.logout()?;
    if !global.quiet {
        eprintln!("Logged out");
    }
    Ok(())
}

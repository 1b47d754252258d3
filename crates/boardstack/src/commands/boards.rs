//! Board post command handlers.

use tabled::Tabled;

use boardstack_core::{Board, BoardCreateRequest, BoardUpdateRequest, Session, VmRequest};

use crate::cli::{
    BoardCreateArgs, BoardsArgs, BoardsCommand, GlobalOpts, OutputFormat, VmRequestArgs,
};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct BoardRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "VM")]
    vm: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Board> for BoardRow {
    fn from(b: &Board) -> Self {
        Self {
            id: b.id,
            title: b.title.clone(),
            author: b.author.clone(),
            vm: b
                .vm_request
                .as_ref()
                .map_or_else(|| "-".into(), |vm| vm.name.clone()),
            created: b.created_at.clone(),
        }
    }
}

fn detail(b: &Board) -> String {
    let mut pairs = vec![
        ("ID", b.id.to_string()),
        ("Title", b.title.clone()),
        ("Author", b.author.clone()),
        ("Created", b.created_at.clone()),
        ("Updated", b.updated_at.clone()),
    ];
    if let Some(vm) = &b.vm_request {
        pairs.push(("VM", vm.name.clone()));
        pairs.push(("Flavor", vm.flavor.clone()));
        pairs.push(("Image", vm.image.clone()));
        pairs.push(("Network", vm.network.clone()));
        if !vm.security_groups.is_empty() {
            pairs.push(("Security groups", vm.security_groups.join(", ")));
        }
        pairs.push(("Key pair", util::or_dash(vm.key_pair.as_deref())));
    }
    format!("{}\n\n{}", output::detail_lines(&pairs), b.content)
}

fn render_boards(boards: &[Board], global: &GlobalOpts, format: OutputFormat) {
    let out = output::render_list(format, boards, |b| BoardRow::from(b), |b| b.id.to_string());
    output::print_output(&out, global.quiet);
}

// ── Request builders ────────────────────────────────────────────────

fn vm_request(args: VmRequestArgs) -> Result<Option<VmRequest>, CliError> {
    let Some(name) = args.vm_name else {
        return Ok(None);
    };
    let user_data = args
        .user_data_file
        .as_deref()
        .map(|p| util::read_text_file(p, "user-data-file"))
        .transpose()?;

    Ok(Some(VmRequest {
        name,
        flavor: args.flavor.unwrap_or_default(),
        image: args.image.unwrap_or_default(),
        network: args.network.unwrap_or_default(),
        security_groups: args.security_groups,
        key_pair: args.key_pair,
        user_data,
    }))
}

fn create_request(args: BoardCreateArgs) -> Result<BoardCreateRequest, CliError> {
    let content = match (args.content, args.content_file) {
        (Some(content), _) => content,
        (None, Some(path)) => util::read_text_file(&path, "content-file")?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "content".into(),
                reason: "provide --content or --content-file".into(),
            });
        }
    };
    Ok(BoardCreateRequest {
        title: args.title,
        content,
        author: args.author,
        vm_request: vm_request(args.vm)?,
    })
}

fn update_request(
    title: Option<String>,
    content: Option<String>,
    vm: VmRequestArgs,
) -> Result<BoardUpdateRequest, CliError> {
    let vm_request = vm_request(vm)?;
    if title.is_none() && content.is_none() && vm_request.is_none() {
        return Err(CliError::Validation {
            field: "update".into(),
            reason: "nothing to change; pass --title, --content or --vm-name".into(),
        });
    }
    Ok(BoardUpdateRequest {
        title,
        content,
        vm_request,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: BoardsArgs,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        BoardsCommand::List => {
            let boards = session.boards().await?;
            render_boards(&boards, global, format);
            Ok(())
        }

        BoardsCommand::Search { keyword } => {
            let boards = session.search_boards(&keyword).await?;
            render_boards(&boards, global, format);
            Ok(())
        }

        BoardsCommand::Get { id } => {
            let board = session
                .board(id)
                .await
                .map_err(|e| CliError::from(e).not_found_as("post", id, "boards list"))?;
            let out = output::render_single(format, board.as_ref(), detail, |b| b.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BoardsCommand::Create(create) => {
            let request = create_request(create)?;
            let board = session.create_board(&request).await?;
            let out = output::render_single(format, &board, detail, |b| b.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BoardsCommand::Update {
            id,
            title,
            content,
            vm,
        } => {
            let request = update_request(title, content, vm)?;
            let board = session
                .update_board(id, &request)
                .await
                .map_err(|e| CliError::from(e).not_found_as("post", id, "boards list"))?;
            let out = output::render_single(format, &board, detail, |b| b.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BoardsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete post #{id}?"), global.yes)? {
                return Ok(());
            }
            session
                .delete_board(id)
                .await
                .map_err(|e| CliError::from(e).not_found_as("post", id, "boards list"))?;
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn no_vm() -> VmRequestArgs {
        VmRequestArgs {
            vm_name: None,
            flavor: None,
            image: None,
            network: None,
            security_groups: Vec::new(),
            key_pair: None,
            user_data_file: None,
        }
    }

    #[test]
    fn update_carries_vm_request() {
        let vm = VmRequestArgs {
            vm_name: Some("web-01".into()),
            flavor: Some("m1.small".into()),
            image: Some("ubuntu-22.04".into()),
            network: Some("private".into()),
            security_groups: vec!["default".into()],
            ..no_vm()
        };
        let request = update_request(None, None, vm).unwrap();
        assert!(request.title.is_none());
        let vm = request.vm_request.unwrap();
        assert_eq!(vm.name, "web-01");
        assert_eq!(vm.security_groups, ["default"]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = update_request(None, None, no_vm()).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "update"));
    }
}

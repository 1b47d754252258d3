// ── Client-side request validation ──
//
// Mirrors the backend's bean-validation constraints so obviously invalid
// requests fail before a round trip. The backend remains authoritative.

use boardstack_api::{BoardCreateRequest, BoardUpdateRequest, DeployRequest};

use crate::error::CoreError;

pub const TITLE_MAX: usize = 200;
pub const CONTENT_MAX: usize = 5000;
pub const AUTHOR_MAX: usize = 50;

pub const VM_NAME_MIN: usize = 3;
pub const VM_NAME_MAX: usize = 50;
pub const DISK_SIZE_MIN: u32 = 10;
pub const DISK_SIZE_MAX: u32 = 1000;
pub const DESCRIPTION_MAX: usize = 500;
pub const REQUESTED_BY_MAX: usize = 100;

fn required(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(field, "must not be blank"));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn board_create(req: &BoardCreateRequest) -> Result<(), CoreError> {
    required("title", &req.title)?;
    max_len("title", &req.title, TITLE_MAX)?;
    required("content", &req.content)?;
    max_len("content", &req.content, CONTENT_MAX)?;
    required("author", &req.author)?;
    max_len("author", &req.author, AUTHOR_MAX)?;
    Ok(())
}

/// Only the fields present are checked.
pub fn board_update(req: &BoardUpdateRequest) -> Result<(), CoreError> {
    if let Some(title) = &req.title {
        required("title", title)?;
        max_len("title", title, TITLE_MAX)?;
    }
    if let Some(content) = &req.content {
        required("content", content)?;
        max_len("content", content, CONTENT_MAX)?;
    }
    Ok(())
}

pub fn deploy(req: &DeployRequest) -> Result<(), CoreError> {
    let name_len = req.vm_name.chars().count();
    if !(VM_NAME_MIN..=VM_NAME_MAX).contains(&name_len) {
        return Err(CoreError::validation(
            "vmName",
            format!("must be between {VM_NAME_MIN} and {VM_NAME_MAX} characters"),
        ));
    }
    if !req
        .vm_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::validation(
            "vmName",
            "may only contain letters, digits, '-' and '_'",
        ));
    }

    required("instanceType", &req.instance_type)?;
    required("imageId", &req.image_id)?;
    required("networkId", &req.network_id)?;
    required("securityGroup", &req.security_group)?;
    required("keyPair", &req.key_pair)?;

    if !(DISK_SIZE_MIN..=DISK_SIZE_MAX).contains(&req.disk_size) {
        return Err(CoreError::validation(
            "diskSize",
            format!("must be between {DISK_SIZE_MIN} and {DISK_SIZE_MAX} GB"),
        ));
    }
    if let Some(description) = &req.description {
        max_len("description", description, DESCRIPTION_MAX)?;
    }

    required("requestedBy", &req.requested_by)?;
    max_len("requestedBy", &req.requested_by, REQUESTED_BY_MAX)?;
    Ok(())
}

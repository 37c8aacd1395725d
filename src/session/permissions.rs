//! Page permission flags.
//!
//! Looks a (segment, page) pair up in the role permission tree and reports
//! which of the six dashboard actions the role grants there. Anything missing
//! along the way (no tree, no segment, no page) yields all-false flags.

use serde::Serialize;

use crate::session::model::Permission;

/// Action names as they appear in the permission tree.
pub const ACTIONS: [&str; 6] = ["Create", "View", "Update", "Approve", "Delete", "Export"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PagePermissions {
    pub create: bool,
    pub view: bool,
    pub update: bool,
    pub approve: bool,
    pub delete: bool,
    pub export: bool,
}

impl PagePermissions {
    /// Whether `action` (e.g. "Export") is granted.
    pub fn allows(&self, action: &str) -> bool {
        match action {
            "Create" => self.create,
            "View" => self.view,
            "Update" => self.update,
            "Approve" => self.approve,
            "Delete" => self.delete,
            "Export" => self.export,
            _ => false,
        }
    }
}

pub fn page_permissions(permission: Option<&Permission>, segment: &str, page: &str) -> PagePermissions {
    let Some(target) = permission
        .and_then(|p| p.data.iter().find(|s| s.segment == segment))
        .and_then(|s| s.pages.iter().find(|p| p.page == page))
    else {
        return PagePermissions::default();
    };

    let granted = |name: &str| target.actions.iter().any(|a| a.action == name);
    PagePermissions {
        create: granted("Create"),
        view: granted("View"),
        update: granted("Update"),
        approve: granted("Approve"),
        delete: granted("Delete"),
        export: granted("Export"),
    }
}

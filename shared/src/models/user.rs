//! User and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A staff account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub nama: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff roles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Kasir,
    Chef,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Kasir => "kasir",
            UserRole::Chef => "chef",
        }
    }

    /// Permission strings (`resource:action`) granted to this role
    pub fn permission_strings(&self) -> Vec<String> {
        role_permissions(*self)
            .into_iter()
            .flat_map(|p| {
                let resource = p.resource.as_str();
                p.actions
                    .into_iter()
                    .map(move |a| format!("{}:{}", resource, a.as_str()))
            })
            .collect()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "kasir" => Ok(UserRole::Kasir),
            "chef" => Ok(UserRole::Chef),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A permission granting access to a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub actions: Vec<Action>,
}

/// Resources that can be accessed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Barang,
    BahanBaku,
    Produksi,
    Transaksi,
    Modal,
    Laporan,
    Settings,
    User,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Barang => "barang",
            Resource::BahanBaku => "bahan_baku",
            Resource::Produksi => "produksi",
            Resource::Transaksi => "transaksi",
            Resource::Modal => "modal",
            Resource::Laporan => "laporan",
            Resource::Settings => "settings",
            Resource::User => "user",
        }
    }

    pub const ALL: [Resource; 8] = [
        Resource::Barang,
        Resource::BahanBaku,
        Resource::Produksi,
        Resource::Transaksi,
        Resource::Modal,
        Resource::Laporan,
        Resource::Settings,
        Resource::User,
    ];
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
    Export,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Export => "export",
        }
    }
}

/// Permissions granted to each role
pub fn role_permissions(role: UserRole) -> Vec<Permission> {
    use Action::*;

    match role {
        UserRole::Admin => Resource::ALL
            .iter()
            .map(|r| Permission {
                resource: *r,
                actions: vec![View, Create, Edit, Delete, Approve, Export],
            })
            .collect(),
        UserRole::Manager => vec![
            Permission {
                resource: Resource::Barang,
                actions: vec![View, Create, Edit],
            },
            Permission {
                resource: Resource::BahanBaku,
                actions: vec![View, Create, Edit],
            },
            Permission {
                resource: Resource::Produksi,
                actions: vec![View, Approve],
            },
            Permission {
                resource: Resource::Transaksi,
                actions: vec![View, Edit],
            },
            Permission {
                resource: Resource::Modal,
                actions: vec![View, Create, Edit],
            },
            Permission {
                resource: Resource::Laporan,
                actions: vec![View, Export],
            },
            Permission {
                resource: Resource::Settings,
                actions: vec![View],
            },
            Permission {
                resource: Resource::User,
                actions: vec![View],
            },
        ],
        UserRole::Kasir => vec![
            Permission {
                resource: Resource::Barang,
                actions: vec![View],
            },
            Permission {
                resource: Resource::Transaksi,
                actions: vec![View, Create, Edit],
            },
            Permission {
                resource: Resource::Settings,
                actions: vec![View],
            },
        ],
        UserRole::Chef => vec![
            Permission {
                resource: Resource::Barang,
                actions: vec![View],
            },
            Permission {
                resource: Resource::BahanBaku,
                actions: vec![View, Create, Edit],
            },
            Permission {
                resource: Resource::Produksi,
                actions: vec![View, Create, Approve],
            },
            Permission {
                resource: Resource::Settings,
                actions: vec![View],
            },
        ],
    }
}

use strum::{Display, EnumIter, EnumString};

/// 認証基盤から渡される利用者の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
    Admin,
    Librarian,
    CafeStaff,
    #[default]
    Member,
}

/// 役割によって許可が分かれる操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewAllReservations,
    CancelAnyReservation,
}

impl Role {
    pub fn grants(self, permission: Permission) -> bool {
        match permission {
            Permission::ViewAllReservations | Permission::CancelAnyReservation => {
                matches!(self, Role::Admin)
            }
        }
    }
}

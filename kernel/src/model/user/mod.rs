use crate::model::{
    id::UserId,
    role::{Permission, Role},
};
use derive_new::new;

/// リクエストを発行した利用者。識別子と役割は外部の認証基盤が決める
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.grants(permission)
    }

    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

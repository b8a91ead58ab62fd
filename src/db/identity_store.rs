use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::db::entities::user;

/// Lookup capability the auth gate resolves token subjects against.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DbErr>;

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr>;
}

pub struct SeaOrmIdentityStore {
    db: DatabaseConnection,
}

impl SeaOrmIdentityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for SeaOrmIdentityStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(&self.db).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
    }
}

/// Process-local store over a concurrent map.
#[derive(Default)]
pub struct MemoryIdentityStore {
    users: DashMap<i32, user::Model>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mut model: user::Model) {
        model.email = model.email.trim().to_lowercase();
        self.users.insert(model.id, model);
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DbErr> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone()))
    }
}

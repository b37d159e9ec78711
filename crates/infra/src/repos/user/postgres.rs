use super::IUserRepo;
use remindr_domain::{User, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRaw {
    user_uid: Uuid,
    email: String,
    phone: Option<String>,
    entitled: bool,
}

impl From<UserRaw> for User {
    fn from(raw: UserRaw) -> Self {
        Self {
            id: ID::from(raw.user_uid),
            email: raw.email,
            phone: raw.phone,
            entitled: raw.entitled,
        }
    }
}

#[async_trait::async_trait]
impl IUserRepo for PostgresUserRepo {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users(user_uid, email, phone, entitled)
            VALUES($1, $2, $3, $4)
            "#,
        )
        .bind(*user.id.inner_ref())
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.entitled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                phone = $3,
                entitled = $4
            WHERE user_uid = $1
            "#,
        )
        .bind(*user.id.inner_ref())
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.entitled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, user_id: &ID) -> Option<User> {
        sqlx::query_as::<_, UserRaw>("SELECT * FROM users WHERE user_uid = $1")
            .bind(*user_id.inner_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Unable to find user {}: {:?}", user_id, e);
                e
            })
            .ok()?
            .map(User::from)
    }

    async fn delete(&self, user_id: &ID) -> Option<User> {
        sqlx::query_as::<_, UserRaw>("DELETE FROM users WHERE user_uid = $1 RETURNING *")
            .bind(*user_id.inner_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Unable to delete user {}: {:?}", user_id, e);
                e
            })
            .ok()?
            .map(User::from)
    }
}

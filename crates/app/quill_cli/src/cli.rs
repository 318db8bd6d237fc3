use clap::{Args, Parser, Subcommand};
use quill_core::auth::password;
use quill_core::models::auth::{NewCredential, Role};
use quill_core::store::Store;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::{Error, Result};

#[derive(Parser, Debug)]
#[command(name = "quill", about = "Quill operator tools", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the CLI version.
    Version,
    /// Apply pending database migrations.
    Migrate(MigrateCmd),
    /// Create or update an admin account with a password.
    SeedAdmin(SeedAdminCmd),
}

#[derive(Args, Debug)]
pub struct MigrateCmd {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}

#[derive(Args, Debug)]
pub struct SeedAdminCmd {
    #[arg(long, env = "ADMIN_EMAIL")]
    pub email: String,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, env = "ADMIN_NAME", default_value = "管理員")]
    pub name: String,

    /// `admin` or `editor`.
    #[arg(long, env = "ADMIN_ROLE", default_value = "admin")]
    pub role: String,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}

pub fn migrate(cmd: &MigrateCmd) -> Result<()> {
    block_on(async {
        let pool = connect(&cmd.database_url).await?;
        quill_core::migrate::migrate(&pool).await?;
        pool.close().await;
        log::info!("migrations applied");
        Ok(())
    })
}

pub fn seed_admin(cmd: &SeedAdminCmd) -> Result<()> {
    let email = cmd.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Custom(format!("invalid email: {email:?}")));
    }
    password::check_password_length(&cmd.password)?;
    let role = Role::parse(cmd.role.trim())
        .ok_or_else(|| Error::Custom(format!("unknown role {:?} (admin|editor)", cmd.role)))?;
    let name = match cmd.name.trim() {
        "" => "管理員",
        name => name,
    };
    let password_hash = password::hash_password(&cmd.password)?;

    block_on(async {
        let pool = connect(&cmd.database_url).await?;
        quill_core::migrate::migrate(&pool).await?;
        let store = Store::postgres(pool);

        let credential = store
            .upsert_credential(NewCredential {
                email: email.to_string(),
                name: name.to_string(),
                password_hash: Some(password_hash),
                role,
                is_active: true,
                google_id: None,
                avatar: None,
            })
            .await;
        store.close().await;

        let credential = credential?;
        log::info!(
            "{} account ready: {} ({})",
            credential.role,
            credential.email,
            credential.id
        );
        Ok(())
    })
}

async fn connect(database_url: &str) -> Result<PgPool> {
    log::debug!("connecting to PostgreSQL");
    Ok(PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?)
}

fn block_on<F>(future: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}

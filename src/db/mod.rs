mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_admin_user;

use anyhow::{Context, Result};
use bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

/// Handle to the fund database with typed accessors for each collection.
#[derive(Clone)]
pub struct Db {
    database: Database,
}

impl Db {
    pub fn admins(&self) -> Collection<Admin> {
        self.database.collection("admins")
    }

    pub fn members(&self) -> Collection<Member> {
        self.database.collection("members")
    }

    pub fn contributions(&self) -> Collection<Contribution> {
        self.database.collection("contributions")
    }

    pub fn loans(&self) -> Collection<Loan> {
        self.database.collection("loans")
    }
}

/// Connect to MongoDB, verify the server is reachable, and ensure the
/// uniqueness indexes the application relies on.
pub async fn connect(uri: &str, db_name: &str) -> Result<Db> {
    let options = ClientOptions::parse(uri)
        .await
        .context("Invalid MongoDB connection string")?;
    let client = Client::with_options(options).context("Failed to create MongoDB client")?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .context("Failed to reach MongoDB")?;

    let db = Db {
        database: client.database(db_name),
    };
    ensure_indexes(&db).await?;

    info!("Connected to MongoDB database {}", db_name);
    Ok(db)
}

/// Unique indexes on admin usernames and member names. The member index
/// also backstops the application-level duplicate check at the store level.
async fn ensure_indexes(db: &Db) -> Result<()> {
    let unique = IndexOptions::builder().unique(true).build();

    db.admins()
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(unique.clone())
                .build(),
        )
        .await
        .context("Failed to create admins.username index")?;

    db.members()
        .create_index(
            IndexModel::builder()
                .keys(doc! { "memberName": 1 })
                .options(unique)
                .build(),
        )
        .await
        .context("Failed to create members.memberName index")?;

    Ok(())
}

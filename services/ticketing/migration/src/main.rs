use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(campustix_ticketing_migration::Migrator).await;
}

use tikva_storefront::kv::postgres::PostgresKv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let kv = PostgresKv::connect(&database_url).await?;
    kv.migrate().await?;
    println!("Migrations applied");
    Ok(())
}

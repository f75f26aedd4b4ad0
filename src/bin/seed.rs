use chrono::Utc;
use tikva_storefront::kv::postgres::PostgresKv;
use tikva_storefront::kv::{self, KvStore, keys};
use tikva_storefront::models::{Category, ExchangeRates, Product, Role, UserRecord};
use tikva_storefront::services::auth_service::hash_password;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let kv = PostgresKv::connect(&database_url).await?;
    // Ensure migrations are applied.
    kv.migrate().await?;

    seed_rates(&kv).await?;
    seed_catalog(&kv).await?;
    ensure_admin(&kv).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_rates(kv: &PostgresKv) -> anyhow::Result<()> {
    if kv.get(keys::EXCHANGE_RATES).await?.is_none() {
        kv::set_as(kv, keys::EXCHANGE_RATES, &ExchangeRates::default()).await?;
        println!("Seeded default exchange rates");
    } else {
        println!("Exchange rates already present");
    }
    Ok(())
}

async fn seed_catalog(kv: &PostgresKv) -> anyhow::Result<()> {
    let mut created = 0;
    let mut skipped = 0;
    for product in catalog() {
        let key = keys::product(&product.id);
        if kv.get(&key).await?.is_some() {
            skipped += 1;
            continue;
        }
        kv::set_as(kv, &key, &product).await?;
        created += 1;
    }
    println!("Seeded products: {created} created, {skipped} already present");
    Ok(())
}

/// Creates or promotes the admin account named by `ADMIN_EMAIL`, with the
/// password from `ADMIN_PASSWORD`. Both must come from the environment; no
/// credentials live in the code.
async fn ensure_admin(kv: &PostgresKv) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        println!("ADMIN_EMAIL or ADMIN_PASSWORD not set, skipping admin user");
        return Ok(());
    };

    let email = email.trim().to_ascii_lowercase();
    let key = keys::user(&email);
    match kv::get_as::<UserRecord>(kv, &key).await? {
        Some(mut record) => {
            record.role = Role::Admin;
            kv::set_as(kv, &key, &record).await?;
            println!("Promoted existing user {email} to admin");
        }
        None => {
            let record = UserRecord {
                name: "Admin".to_string(),
                email: email.clone(),
                role: Role::Admin,
                registered_at: Utc::now(),
                password_hash: hash_password(&password)?,
            };
            kv::set_as(kv, &key, &record).await?;
            println!("Created admin user {email}");
        }
    }
    Ok(())
}

fn catalog() -> Vec<Product> {
    vec![
        Product {
            id: "1".to_string(),
            name: "Zapatilla Urbana Classic".to_string(),
            category: Category::Zapatillas,
            image: "https://i.ibb.co/M5Vx6tnv/Pisa-Fuerte-este-a-o-1.png".to_string(),
            price: 36000.0,
            box_price: None,
            sizes: Some("36-44".to_string()),
            stock: Some(12),
        },
        Product {
            id: "2".to_string(),
            name: "Skala Frutástica 2 en 1".to_string(),
            category: Category::CremasSkala,
            image: "https://i.ibb.co/CK38vd9V/frutastica.png".to_string(),
            price: 4500.0,
            box_price: Some(24000.0),
            sizes: None,
            stock: Some(30),
        },
        Product {
            id: "3".to_string(),
            name: "Skala Expert Keratina".to_string(),
            category: Category::CremasSkala,
            image: "https://i.ibb.co/x8Ddv3kp/expert.png".to_string(),
            price: 4800.0,
            box_price: Some(25500.0),
            sizes: None,
            stock: Some(24),
        },
        Product {
            id: "4".to_string(),
            name: "Skala Brasil & Ceramidas".to_string(),
            category: Category::CremasSkala,
            image: "https://i.ibb.co/p6NYdNL2/brasil.png".to_string(),
            price: 4500.0,
            box_price: Some(24000.0),
            sizes: None,
            stock: Some(18),
        },
        Product {
            id: "5".to_string(),
            name: "Perfume Árabe Yara".to_string(),
            category: Category::PerfumesArabes,
            image: "https://i.ibb.co/hK3q1Zp/yara.png".to_string(),
            price: 28000.0,
            box_price: None,
            sizes: None,
            stock: Some(10),
        },
        Product {
            id: "6".to_string(),
            name: "Pasta Dental Carbón Activado".to_string(),
            category: Category::PastaDental,
            image: "https://i.ibb.co/wrT0m2c/carbon.png".to_string(),
            price: 2200.0,
            box_price: Some(11000.0),
            sizes: None,
            stock: Some(60),
        },
    ]
}

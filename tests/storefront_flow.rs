use std::sync::Arc;

use axum::{Router, routing::get};
use chrono::{Duration, Utc};
use tikva_storefront::{
    client::ApiClient,
    config::AppConfig,
    dto::products::{CreateProductRequest, UpdateProductRequest},
    kv::MemoryKv,
    models::{CartLine, CartRecord, Category, Currency, ExchangeRates, Product},
    routes::{create_api_router, health},
    session::StorefrontSession,
    state::AppState,
};
use url::Url;

// Full-stack flows: a real server on an ephemeral port, the REST client, and
// the headless session, all talking over HTTP.

#[tokio::test]
async fn whole_shop_flow() -> anyhow::Result<()> {
    let base = spawn_server().await?;
    let dir = tempfile::tempdir()?;

    // The allow-listed admin provisions the catalog.
    let admin = ApiClient::new(base.clone());
    let auth = admin.signup("Root", "admin@example.com", "admin-secret-1").await?;
    assert!(auth.user.is_admin());

    let product = admin
        .create_product(&CreateProductRequest {
            name: "Zapatilla Urbana".into(),
            category: Category::Zapatillas,
            image: "https://example.com/z.png".into(),
            price: 36000.0,
            box_price: None,
            sizes: Some("36-44".into()),
            stock: Some(12),
        })
        .await?;

    // A customer signs up and shops through the headless session.
    let mut session = StorefrontSession::connect(base.clone(), dir.path().join("cache.json")).await?;
    session.register("Ana", "user@example.com", "secret123").await?;

    let catalog = ApiClient::new(base.clone()).products().await?;
    assert_eq!(catalog.len(), 1);

    session.add_to_cart(product.clone(), 1).await?;
    session.add_to_cart(product.clone(), 1).await?;
    assert_eq!(session.cart().lines().len(), 1);
    assert_eq!(session.cart().lines()[0].quantity, 2);
    assert_eq!(session.total(), 72000.0);

    let rates = admin.exchange_rates().await?;
    let link = session.checkout_link(Currency::Usd, &rates)?;
    assert_eq!(link.host_str(), Some("wa.me"));
    assert_eq!(link.path(), "/5493764145766");
    let text = link
        .query_pairs()
        .find(|(key, _)| key == "text")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    assert!(text.contains("US$60"));
    assert!(text.contains("Ana"));

    // Logout flushes the cart server-side, then clears the session.
    session.logout().await;
    assert_eq!(session.item_count(), 0);
    assert!(session.current_user().is_none());

    let stored = admin.cart("user@example.com").await?.unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].quantity, 2);

    // A fresh session has nothing to resume, but logging back in restores
    // the flushed cart from the server.
    let mut session = StorefrontSession::connect(base, dir.path().join("cache.json")).await?;
    assert!(session.restore().await?.is_none());
    session.login("user@example.com", "secret123").await?;
    assert_eq!(session.item_count(), 2);
    assert_eq!(session.cart().lines()[0].product.id, product.id);

    Ok(())
}

#[tokio::test]
async fn admin_curates_catalog_and_rates_over_the_wire() -> anyhow::Result<()> {
    let base = spawn_server().await?;

    let admin = ApiClient::new(base.clone());
    admin.signup("Root", "admin@example.com", "admin-secret-1").await?;

    let created = admin
        .create_product(&CreateProductRequest {
            name: "Perfume Árabe Yara".into(),
            category: Category::PerfumesArabes,
            image: "https://example.com/yara.png".into(),
            price: 26000.0,
            box_price: None,
            sizes: None,
            stock: Some(5),
        })
        .await?;

    let updated = admin
        .update_product(
            &created.id,
            &UpdateProductRequest {
                price: Some(28000.0),
                stock: Some(8),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.price, 28000.0);
    assert_eq!(updated.stock, Some(8));
    assert_eq!(updated.name, created.name);

    // Shoppers see the new price through the public getter.
    let shopper = ApiClient::new(base.clone());
    assert_eq!(shopper.product(&created.id).await?.price, 28000.0);

    // Repricing the dollar shows up on the public rates endpoint.
    let mut rates = ExchangeRates::default();
    rates.set(Currency::Usd, 1350.0);
    let applied = admin.update_exchange_rates(&rates).await?;
    assert_eq!(applied.factor(Currency::Usd), Some(1350.0));
    assert_eq!(
        shopper.exchange_rates().await?.factor(Currency::Usd),
        Some(1350.0)
    );

    // Delisting removes the product for everyone.
    admin.delete_product(&created.id).await?;
    let err = shopper.product(&created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(shopper.products().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn stale_cart_save_is_refused_over_the_wire() -> anyhow::Result<()> {
    let base = spawn_server().await?;

    let client = ApiClient::new(base);
    client.signup("Ana", "user@example.com", "secret123").await?;

    let fresh = CartRecord {
        items: vec![line("1", 36000.0, 1)],
        saved_at: Utc::now(),
    };
    client.save_cart("user@example.com", &fresh).await?;

    let stale = CartRecord {
        items: vec![],
        saved_at: fresh.saved_at - Duration::minutes(5),
    };
    let err = client.save_cart("user@example.com", &stale).await.unwrap_err();
    assert_eq!(err.status(), Some(409));

    // The stored record still carries the fresh lines.
    let stored = client.cart("user@example.com").await?.unwrap();
    assert_eq!(stored.items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn auth_gates_hold_over_the_wire() -> anyhow::Result<()> {
    let base = spawn_server().await?;

    // Anonymous requests can browse but not write.
    let anonymous = ApiClient::new(base.clone());
    assert!(anonymous.products().await?.is_empty());
    assert_eq!(anonymous.health().await?.status, "ok");
    let err = anonymous
        .save_cart("user@example.com", &CartRecord::empty())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    let customer = ApiClient::new(base.clone());
    customer.signup("Ana", "user@example.com", "secret123").await?;

    let err = customer
        .create_product(&CreateProductRequest {
            name: "No".into(),
            category: Category::PastaDental,
            image: String::new(),
            price: 1.0,
            box_price: None,
            sizes: None,
            stock: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let err = customer.cart("other@example.com").await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let err = customer
        .signin("user@example.com", "not-the-password")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    Ok(())
}

async fn spawn_server() -> anyhow::Result<Url> {
    let config = AppConfig {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "storefront-flow-secret".into(),
        admin_emails: vec!["admin@example.com".into()],
    };
    let state = AppState::new(Arc::new(MemoryKv::new()), config);

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(Url::parse(&format!("http://{addr}/"))?)
}

fn line(id: &str, price: f64, quantity: u32) -> CartLine {
    CartLine {
        product: Product {
            id: id.into(),
            name: format!("Producto {id}"),
            category: Category::Zapatillas,
            image: String::new(),
            price,
            box_price: None,
            sizes: None,
            stock: None,
        },
        quantity,
    }
}

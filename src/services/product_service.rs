use uuid::Uuid;

use crate::audit::log_audit;
use crate::dto::products::{CreateProductRequest, ProductList, UpdateProductRequest};
use crate::error::{AppError, AppResult};
use crate::kv::{self, keys};
use crate::middleware::auth::{AuthUser, ensure_admin};
use crate::models::Product;
use crate::response::{ApiResponse, Meta};
use crate::state::AppState;

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let raw = state.kv.get_by_prefix(keys::PRODUCT_PREFIX).await?;

    let mut products = Vec::with_capacity(raw.len());
    for value in raw {
        // One corrupt record must not take the whole catalog down.
        match serde_json::from_value::<Product>(value) {
            Ok(product) => products.push(product),
            Err(err) => tracing::warn!(error = %err, "skipping unreadable product record"),
        }
    }

    let total = products.len() as i64;
    Ok(ApiResponse::success(
        "Products",
        ProductList { products },
        Some(Meta::total(total)),
    ))
}

pub async fn get_product(state: &AppState, id: &str) -> AppResult<ApiResponse<Product>> {
    let product: Option<Product> = kv::get_as(state.kv.as_ref(), &keys::product(id)).await?;
    match product {
        Some(product) => Ok(ApiResponse::success("Product", product, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        category: payload.category,
        image: payload.image,
        price: payload.price,
        box_price: payload.box_price,
        sizes: payload.sizes,
        stock: payload.stock,
    };
    validate_product(&product)?;

    kv::set_as(state.kv.as_ref(), &keys::product(&product.id), &product).await?;

    if let Err(err) = log_audit(
        state.kv.as_ref(),
        Some(&user.email),
        "product_created",
        Some(&keys::product(&product.id)),
        Some(serde_json::json!({ "name": product.name })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let existing: Option<Product> = kv::get_as(state.kv.as_ref(), &keys::product(id)).await?;
    let mut product = match existing {
        Some(product) => product,
        None => return Err(AppError::NotFound),
    };

    if let Some(name) = payload.name {
        product.name = name;
    }
    if let Some(category) = payload.category {
        product.category = category;
    }
    if let Some(image) = payload.image {
        product.image = image;
    }
    if let Some(price) = payload.price {
        product.price = price;
    }
    if let Some(box_price) = payload.box_price {
        product.box_price = Some(box_price);
    }
    if let Some(sizes) = payload.sizes {
        product.sizes = Some(sizes);
    }
    if let Some(stock) = payload.stock {
        product.stock = Some(stock);
    }
    validate_product(&product)?;

    kv::set_as(state.kv.as_ref(), &keys::product(id), &product).await?;

    if let Err(err) = log_audit(
        state.kv.as_ref(),
        Some(&user.email),
        "product_updated",
        Some(&keys::product(id)),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let removed = state.kv.delete(&keys::product(id)).await?;
    if !removed {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        state.kv.as_ref(),
        Some(&user.email),
        "product_deleted",
        Some(&keys::product(id)),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_product(product: &Product) -> AppResult<()> {
    if product.name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".into()));
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative number".into(),
        ));
    }
    if let Some(box_price) = product.box_price {
        if !box_price.is_finite() || box_price < 0.0 {
            return Err(AppError::Validation(
                "box price must be a non-negative number".into(),
            ));
        }
    }
    if let Some(stock) = product.stock {
        if stock < 0 {
            return Err(AppError::Validation(
                "stock must be a non-negative integer".into(),
            ));
        }
    }
    Ok(())
}

use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    audit::AuditEntry,
    dto::{
        auth::{AuthData, SigninRequest, SignupRequest},
        cart::{CartData, SaveCartRequest, SavedCart},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        rates::{RatesData, UpdateRatesRequest},
    },
    models::{CartLine, CartRecord, Category, Currency, ExchangeRates, Product, Role, UserProfile},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, products, rates},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::signin,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::save_cart,
        rates::get_rates,
        rates::update_rates,
        admin::list_audit
    ),
    components(
        schemas(
            UserProfile,
            Role,
            Product,
            Category,
            Currency,
            ExchangeRates,
            CartLine,
            CartRecord,
            AuditEntry,
            SignupRequest,
            SigninRequest,
            AuthData,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CartData,
            SaveCartRequest,
            SavedCart,
            RatesData,
            UpdateRatesRequest,
            admin::AuditQuery,
            admin::AuditList,
            Meta,
            ApiResponse<AuthData>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartData>,
            ApiResponse<SavedCart>,
            ApiResponse<RatesData>,
            ApiResponse<admin::AuditList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup and signin"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Per-user saved carts"),
        (name = "Rates", description = "Exchange rate table"),
        (name = "Admin", description = "Administrative endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

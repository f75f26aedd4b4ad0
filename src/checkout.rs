use url::Url;

use crate::models::{CartLine, Currency, ExchangeRates, UserProfile};
use crate::pricing::{self, PriceError};

/// WhatsApp number orders are sent to when the caller does not override it.
pub const ORDER_PHONE: &str = "5493764145766";

/// Render the order summary that gets pasted into the WhatsApp conversation.
/// Line and total prices are shown in the buyer's selected currency.
pub fn order_message(
    lines: &[CartLine],
    customer: &UserProfile,
    currency: Currency,
    rates: &ExchangeRates,
) -> Result<String, PriceError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let price = pricing::format_price(line.line_total(), currency, rates)?;
        items.push(format!(
            "• {}\n  Cantidad: {}\n  Precio: {}",
            line.product.name, line.quantity, price
        ));
    }

    let total: f64 = lines.iter().map(CartLine::line_total).sum();
    let total = pricing::format_price(total, currency, rates)?;

    Ok(format!(
        "🛒 *Pedido desde Tikvá*\n\n{}\n\n💰 *Total: {total}*\n\n🚚 *Envío gratis incluido*\n\n👤 *Cliente:* {}\n📧 *Email:* {}",
        items.join("\n\n"),
        customer.name,
        customer.email
    ))
}

/// Build the `wa.me` deep link carrying the order message as the prefilled
/// text.
pub fn order_link(phone: &str, message: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(&format!("https://wa.me/{phone}"), [("text", message)])
}

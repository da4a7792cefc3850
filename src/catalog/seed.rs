use rust_decimal::Decimal;

use super::repo_types::NewProduct;

const DESCRIPTION: &str = "Steam wallet top-up by username, no account login required. \
Funds are delivered through the official donation flow, instantly.";

/// (face value in RUB, price, external link)
const TOP_UPS: [(u32, i64, &str); 10] = [
    (100, 104, "http://t.me/send?start=IVgGf3gqWf9G"),
    (200, 208, "https://t.me/ZEKQZSteamBot?start=200"),
    (300, 312, "https://t.me/ZEKQZSteamBot?start=300"),
    (400, 416, "https://t.me/ZEKQZSteamBot?start=400"),
    (500, 520, "https://t.me/ZEKQZSteamBot?start=500"),
    (600, 624, "https://t.me/ZEKQZSteamBot?start=600"),
    (700, 728, "https://t.me/ZEKQZSteamBot?start=700"),
    (800, 812, "https://t.me/ZEKQZSteamBot?start=800"),
    (900, 916, "https://t.me/ZEKQZSteamBot?start=900"),
    (1000, 1020, "https://t.me/ZEKQZSteamBot?start=1000"),
];

/// Products inserted on first startup.
pub fn default_products() -> Vec<NewProduct> {
    TOP_UPS
        .iter()
        .map(|&(face, price, link)| NewProduct {
            name: format!("Steam top-up {face} RUB, no account login"),
            price: Decimal::from(price),
            description: DESCRIPTION.to_string(),
            external_link: link.to_string(),
        })
        .collect()
}

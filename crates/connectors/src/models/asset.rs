//! Currency to asset mapping
//!
//! Assets are written `CURRENCY/precision`, e.g. `EUR/2`. Providers report
//! bare ISO currency codes, so amounts in an unknown currency cannot be
//! interpreted and the record is skipped by the caller.

const PRECISIONS: &[(&str, u32)] = &[
    ("AUD", 2),
    ("CAD", 2),
    ("CHF", 2),
    ("CZK", 2),
    ("DKK", 2),
    ("EUR", 2),
    ("GBP", 2),
    ("HKD", 2),
    ("JPY", 0),
    ("KRW", 0),
    ("NOK", 2),
    ("NZD", 2),
    ("PLN", 2),
    ("SEK", 2),
    ("SGD", 2),
    ("USD", 2),
    ("BHD", 3),
    ("KWD", 3),
];

/// Number of minor-unit digits for an ISO currency code
pub fn precision(currency: &str) -> Option<u32> {
    let upper = currency.trim().to_ascii_uppercase();
    PRECISIONS
        .iter()
        .find(|(code, _)| *code == upper)
        .map(|(_, p)| *p)
}

/// Asset string for an ISO currency code, or `None` if the currency is unknown
pub fn asset_for(currency: &str) -> Option<String> {
    let upper = currency.trim().to_ascii_uppercase();
    precision(&upper).map(|p| format!("{}/{}", upper, p))
}

/// Currency code of an asset string
pub fn currency_of(asset: &str) -> &str {
    asset.split_once('/').map_or(asset, |(currency, _)| currency)
}

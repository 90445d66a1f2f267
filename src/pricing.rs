/// Tax-inclusive price rounded to cents.
pub fn price_with_tax(price: f64, tax_rate: f64) -> f64 {
    round_cents(price + tax_rate * price)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

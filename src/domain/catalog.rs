use bigdecimal::BigDecimal;

/// A wash plan offered by the platform, priced per kilogram.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCatalogEntry {
    pub id: i32,
    pub name: String,
    pub price_per_kg: BigDecimal,
    pub includes_drying: bool,
    pub includes_ironing: bool,
    pub delivery_hours: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extra {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

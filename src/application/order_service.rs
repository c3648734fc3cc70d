use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::catalog::ServiceCatalogEntry;
use crate::domain::coupon::normalize_code;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    DeliveryMethod, FulfillmentStatus, Order, OrderExtra, OrderListing, PaymentMethod,
    PaymentStatus, PickupDetails, ProviderDashboard, Role, StatusChange,
};
use crate::domain::ports::{Clock, Store};
use crate::domain::pricing::{compute_total, PriceBreakdown};

use super::catalog_service::check_coupon;

#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub service_id: i32,
    pub weight_kg: BigDecimal,
    pub extra_ids: Vec<i32>,
    pub delivery_method: DeliveryMethod,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Quote {
    pub service: ServiceCatalogEntry,
    pub extras: Vec<OrderExtra>,
    pub breakdown: PriceBreakdown,
    /// Normalized code, present only when a valid coupon was applied.
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub quote: QuoteRequest,
    pub pickup: PickupDetails,
}

#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub id: Uuid,
    pub order_number: String,
    pub total: BigDecimal,
}

pub struct OrderService<R: ?Sized> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: Store + ?Sized> OrderService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Price an order without placing it.
    pub fn quote(&self, request: &QuoteRequest) -> Result<Quote, DomainError> {
        let service = self
            .repo
            .find_service(request.service_id)?
            .ok_or(DomainError::ServiceNotFound)?;
        let extras = self.snapshot_extras(&request.extra_ids)?;

        let mut applied_code = None;
        let mut discount = None;
        if let Some(code) = request.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
            let result = check_coupon(self.repo.as_ref(), code, self.clock.now())?;
            if !result.valid {
                return Err(DomainError::Validation(format!(
                    "coupon {}: {}",
                    normalize_code(code),
                    result.message
                )));
            }
            applied_code = Some(normalize_code(code));
            discount = result.discount;
        }

        let breakdown = compute_total(
            &service.price_per_kg,
            &request.weight_kg,
            &extras,
            request.delivery_method,
            discount.as_ref(),
        )?;
        if breakdown.clamped {
            log::warn!(
                "Discounts exceed subtotal {} for service {}, total floored at zero",
                breakdown.subtotal,
                service.id
            );
        }

        Ok(Quote {
            service,
            extras,
            breakdown,
            coupon_code: applied_code,
        })
    }

    /// Price and place an order. Capacity is re-checked at write time.
    pub fn create_order(&self, command: CreateOrderCommand) -> Result<CreatedOrder, DomainError> {
        if command.pickup.address.trim().is_empty() {
            return Err(DomainError::Validation(
                "pickup address is required".to_string(),
            ));
        }
        if self.repo.find_customer(command.customer_id)?.is_none() {
            return Err(DomainError::CustomerNotFound);
        }
        let quote = self.quote(&command.quote)?;
        let now = self.clock.now();
        let id = Uuid::new_v4();
        let order_number = format!(
            "LND-{}-{}",
            now.format("%Y%m%d%H%M%S"),
            id.simple().to_string()[..6].to_uppercase()
        );
        let price = quote.breakdown;

        let order = Order {
            id,
            order_number: order_number.clone(),
            customer_id: command.customer_id,
            provider_id: command.provider_id,
            service_id: quote.service.id,
            weight_kg: command.quote.weight_kg,
            base_price: price.base_price,
            extras_price: price.extras_price,
            pickup_discount: price.pickup_discount,
            coupon_discount: price.coupon_discount,
            discount_code: quote.coupon_code,
            total_price: price.total.clone(),
            fulfillment_status: FulfillmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            delivery_method: command.quote.delivery_method,
            pickup: command.pickup,
            extras: quote.extras,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repo.insert_admitted(&order) {
            log::warn!(
                "Order for provider {} rejected: {}",
                command.provider_id,
                e
            );
            return Err(e);
        }

        log::info!(
            "Order {} ({}) created for customer {} at provider {}",
            order_number,
            id,
            command.customer_id,
            command.provider_id
        );
        Ok(CreatedOrder {
            id,
            order_number,
            total: price.total,
        })
    }

    pub fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::OrderNotFound)
    }

    pub fn advance_status(
        &self,
        id: Uuid,
        target: FulfillmentStatus,
    ) -> Result<StatusChange, DomainError> {
        let change = self.repo.advance_status(id, target, self.clock.now())?;
        if change.changed {
            log::info!("Order {} status updated from {} to {}", id, change.from, change.to);
        }
        Ok(change)
    }

    pub fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
    ) -> Result<(), DomainError> {
        self.repo.set_payment(id, status, method, self.clock.now())?;
        log::info!("Order {} payment status set to {}", id, status.as_str());
        Ok(())
    }

    pub fn list_orders(&self, role: Role, account_id: Uuid) -> Result<OrderListing, DomainError> {
        let summaries = self.repo.list_for(role, account_id)?;
        Ok(OrderListing::partition(summaries))
    }

    /// Status buckets and paid revenue for `day` (today when omitted).
    pub fn dashboard(
        &self,
        provider_id: Uuid,
        day: Option<NaiveDate>,
    ) -> Result<ProviderDashboard, DomainError> {
        if self.repo.find_provider(provider_id)?.is_none() {
            return Err(DomainError::ProviderNotFound);
        }
        let day = day.unwrap_or_else(|| self.clock.now().date_naive());
        let summaries = self.repo.list_for(Role::Provider, provider_id)?;
        Ok(ProviderDashboard::summarize(
            summaries.iter().map(|s| &s.order),
            day,
        ))
    }

    /// Catalog extras priced as of now. Duplicate ids collapse.
    fn snapshot_extras(&self, ids: &[i32]) -> Result<Vec<OrderExtra>, DomainError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let found = self.repo.find_extras(&ids)?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|e| e.id == **id)) {
            return Err(DomainError::ExtraNotFound(*missing));
        }
        Ok(found
            .into_iter()
            .map(|e| OrderExtra {
                extra_id: e.id,
                name: e.name,
                price: e.price,
            })
            .collect())
    }
}

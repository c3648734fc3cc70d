use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::{CreateOrderCommand, OrderService, Quote, QuoteRequest};
use crate::domain::order::{
    Counterparty, DeliveryMethod, FulfillmentStatus, Order, OrderSummary, PaymentMethod,
    PaymentStatus, PickupDetails, Role,
};
use crate::domain::ports::Store;
use crate::errors::AppError;

use super::{money, parse_decimal};

type Orders = web::Data<OrderService<dyn Store>>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteBody {
    pub service_id: i32,
    /// Decimal weight as a string, e.g. "4.5"
    pub weight_kg: String,
    #[serde(default)]
    pub extra_ids: Vec<i32>,
    pub delivery_method: DeliveryMethod,
    pub coupon_code: Option<String>,
}

impl QuoteBody {
    fn into_request(self) -> Result<QuoteRequest, AppError> {
        Ok(QuoteRequest {
            service_id: self.service_id,
            weight_kg: parse_decimal("weight_kg", &self.weight_kg)?,
            extra_ids: self.extra_ids,
            delivery_method: self.delivery_method,
            coupon_code: self.coupon_code,
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PickupBody {
    pub address: String,
    pub neighbourhood: Option<String>,
    pub references: Option<String>,
    pub time_window: Option<String>,
}

impl From<PickupBody> for PickupDetails {
    fn from(body: PickupBody) -> Self {
        PickupDetails {
            address: body.address,
            neighbourhood: body.neighbourhood,
            references: body.references,
            time_window: body.time_window,
        }
    }
}

impl From<&PickupDetails> for PickupBody {
    fn from(details: &PickupDetails) -> Self {
        PickupBody {
            address: details.address.clone(),
            neighbourhood: details.neighbourhood.clone(),
            references: details.references.clone(),
            time_window: details.time_window.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    #[serde(flatten)]
    pub quote: QuoteBody,
    pub pickup: PickupBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderExtraResponse {
    pub extra_id: i32,
    pub name: String,
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub service_id: i32,
    pub service_name: String,
    pub delivery_hours: i32,
    pub extras: Vec<OrderExtraResponse>,
    pub base_price: String,
    pub extras_price: String,
    pub subtotal: String,
    pub pickup_discount: String,
    pub coupon_discount: String,
    pub total_discount: String,
    pub total: String,
    /// True when discounts exceeded the subtotal and the total was floored at zero.
    pub clamped: bool,
    pub coupon_code: Option<String>,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        let price = quote.breakdown.rounded();
        QuoteResponse {
            service_id: quote.service.id,
            service_name: quote.service.name,
            delivery_hours: quote.service.delivery_hours,
            extras: quote
                .extras
                .into_iter()
                .map(|e| OrderExtraResponse {
                    extra_id: e.extra_id,
                    name: e.name,
                    price: money(&e.price),
                })
                .collect(),
            base_price: money(&price.base_price),
            extras_price: money(&price.extras_price),
            subtotal: money(&price.subtotal),
            pickup_discount: money(&price.pickup_discount),
            coupon_discount: money(&price.coupon_discount),
            total_discount: money(&price.total_discount),
            total: money(&price.total),
            clamped: price.clamped,
            coupon_code: quote.coupon_code,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: i32,
    pub weight_kg: String,
    pub base_price: String,
    pub extras_price: String,
    pub pickup_discount: String,
    pub coupon_discount: String,
    pub total_discount: String,
    pub discount_code: Option<String>,
    pub total_price: String,
    pub fulfillment_status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_method: DeliveryMethod,
    pub pickup: PickupBody,
    pub extras: Vec<OrderExtraResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(o: &Order) -> Self {
        OrderResponse {
            id: o.id,
            order_number: o.order_number.clone(),
            customer_id: o.customer_id,
            provider_id: o.provider_id,
            service_id: o.service_id,
            weight_kg: o.weight_kg.to_string(),
            base_price: money(&o.base_price),
            extras_price: money(&o.extras_price),
            pickup_discount: money(&o.pickup_discount),
            coupon_discount: money(&o.coupon_discount),
            total_discount: money(&o.total_discount()),
            discount_code: o.discount_code.clone(),
            total_price: money(&o.total_price),
            fulfillment_status: o.fulfillment_status,
            payment_status: o.payment_status,
            payment_method: o.payment_method,
            delivery_method: o.delivery_method,
            pickup: PickupBody::from(&o.pickup),
            extras: o
                .extras
                .iter()
                .map(|e| OrderExtraResponse {
                    extra_id: e.extra_id,
                    name: e.name.clone(),
                    price: money(&e.price),
                })
                .collect(),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CounterpartyResponse {
    /// "provider" when a customer lists, "customer" when a provider lists.
    pub role: Role,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummaryResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub service_name: String,
    pub delivery_hours: i32,
    pub counterparty: CounterpartyResponse,
}

impl From<&OrderSummary> for OrderSummaryResponse {
    fn from(summary: &OrderSummary) -> Self {
        let counterparty = match &summary.counterparty {
            Counterparty::Provider { name } => CounterpartyResponse {
                role: Role::Provider,
                name: name.clone(),
                phone: None,
            },
            Counterparty::Customer { name, phone } => CounterpartyResponse {
                role: Role::Customer,
                name: name.clone(),
                phone: phone.clone(),
            },
        };
        OrderSummaryResponse {
            order: OrderResponse::from(&summary.order),
            service_name: summary.service_name.clone(),
            delivery_hours: summary.delivery_hours,
            counterparty,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// `customer` or `provider` (`laundry` is accepted as an alias).
    pub role: Role,
    pub account_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub active: Vec<OrderSummaryResponse>,
    pub historical: Vec<OrderSummaryResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: FulfillmentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    pub id: Uuid,
    pub from: FulfillmentStatus,
    pub to: FulfillmentStatus,
    /// False when the order was already in the requested state.
    pub changed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Prices and places an order. The provider's capacity is checked again at
/// write time, so a provider that looked available may still refuse.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid input, coupon or unoffered service"),
        (status = 404, description = "Unknown provider, service or extra"),
        (status = 409, description = "Provider unavailable or at capacity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: Orders,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let command = CreateOrderCommand {
        customer_id: body.customer_id,
        provider_id: body.provider_id,
        quote: body.quote.into_request()?,
        pickup: body.pickup.into(),
    };

    let created = web::block(move || service.create_order(command))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CreateOrderResponse {
        id: created.id,
        order_number: created.order_number,
        total: money(&created.total),
    }))
}

/// POST /orders/quote
///
/// Full price breakdown for an order that is not placed.
#[utoipa::path(
    post,
    path = "/orders/quote",
    request_body = QuoteBody,
    responses(
        (status = 200, description = "Price breakdown", body = QuoteResponse),
        (status = 400, description = "Invalid input or coupon"),
        (status = 404, description = "Unknown service or extra"),
    ),
    tag = "orders"
)]
pub async fn quote_order(
    service: Orders,
    body: web::Json<QuoteBody>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_request()?;

    let quote = web::block(move || service.quote(&request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(QuoteResponse::from(quote)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(service: Orders, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// GET /orders
///
/// Orders visible to an account, split into active and historical
/// (delivered and paid). Newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("role" = Role, Query, description = "Viewer role"),
        ("account_id" = Uuid, Query, description = "Customer or provider id"),
    ),
    responses(
        (status = 200, description = "Orders for the account", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: Orders,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();

    let listing = web::block(move || service.list_orders(params.role, params.account_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        active: listing.active.iter().map(OrderSummaryResponse::from).collect(),
        historical: listing.historical.iter().map(OrderSummaryResponse::from).collect(),
    }))
}

/// PUT /orders/{id}/status
///
/// Moves an order forward in the pipeline or cancels it. Repeating the
/// current status succeeds without writing anything.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status applied", body = StatusChangeResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    service: Orders,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let target = body.into_inner().status;

    let change = web::block(move || service.advance_status(order_id, target))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(StatusChangeResponse {
        id: order_id,
        from: change.from,
        to: change.to,
        changed: change.changed,
    }))
}

/// PATCH /orders/{id}/payment
#[utoipa::path(
    patch,
    path = "/orders/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_payment(
    service: Orders,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();

    let order = web::block(move || {
        service.set_payment_status(order_id, body.payment_status, body.payment_method)?;
        service.get_order(order_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

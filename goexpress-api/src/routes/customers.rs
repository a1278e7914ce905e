/// Customer profile endpoints
///
/// Profiles belong to client users. Administrators manage all of them; a
/// client may read its own profile, shipments and addresses. Another
/// client's profile answers 404, never 403.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use goexpress_shared::{
    auth::{
        authorization::{authorize, Action, Resource, Visibility},
        middleware::Identity,
    },
    models::{
        customer::{
            AddressType, CreateAddress, CreateCustomer, Customer, CustomerAddress, CustomerFilter,
            CustomerStats, CustomerStatus, UpdateCustomer,
        },
        shipment::Shipment,
    },
};
use serde::Deserialize;
use validator::Validate;

use crate::{app::AppState, error::ApiResult, extract::ValidJson};

/// Create customer profile request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    /// Existing client user the profile belongs to
    pub user_id: i64,

    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,

    #[validate(length(min = 1, max = 255, message = "Contact person is required"))]
    pub contact_person: String,

    #[validate(length(min = 1, max = 50, message = "Phone is required"))]
    pub phone: String,

    #[validate(length(max = 50))]
    pub alternate_phone: Option<String>,

    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,

    #[validate(length(max = 100))]
    pub tax_id: Option<String>,

    #[validate(length(max = 100))]
    pub business_type: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Credit limit cannot be negative"))]
    pub credit_limit: f64,

    #[validate(length(max = 100))]
    pub payment_terms: Option<String>,

    pub notes: Option<String>,
}

impl From<CreateCustomerRequest> for CreateCustomer {
    fn from(req: CreateCustomerRequest) -> Self {
        CreateCustomer {
            user_id: req.user_id,
            company_name: req.company_name,
            contact_person: req.contact_person,
            phone: req.phone,
            alternate_phone: req.alternate_phone,
            website: req.website,
            tax_id: req.tax_id,
            business_type: req.business_type,
            credit_limit: req.credit_limit,
            payment_terms: req.payment_terms,
            notes: req.notes,
        }
    }
}

/// Full replacement of a customer profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,

    #[validate(length(min = 1, max = 255, message = "Contact person is required"))]
    pub contact_person: String,

    #[validate(length(min = 1, max = 50, message = "Phone is required"))]
    pub phone: String,

    #[validate(length(max = 50))]
    pub alternate_phone: Option<String>,

    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,

    #[validate(length(max = 100))]
    pub tax_id: Option<String>,

    #[validate(length(max = 100))]
    pub business_type: Option<String>,

    pub status: CustomerStatus,

    #[validate(range(min = 0.0, message = "Credit limit cannot be negative"))]
    pub credit_limit: f64,

    #[validate(length(max = 100))]
    pub payment_terms: Option<String>,

    pub notes: Option<String>,
}

impl From<UpdateCustomerRequest> for UpdateCustomer {
    fn from(req: UpdateCustomerRequest) -> Self {
        UpdateCustomer {
            company_name: req.company_name,
            contact_person: req.contact_person,
            phone: req.phone,
            alternate_phone: req.alternate_phone,
            website: req.website,
            tax_id: req.tax_id,
            business_type: req.business_type,
            status: req.status,
            credit_limit: req.credit_limit,
            payment_terms: req.payment_terms,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    pub address_type: AddressType,

    #[validate(length(min = 1, max = 100, message = "Label is required"))]
    pub label: String,

    #[validate(length(min = 1, max = 255, message = "Address line 1 is required"))]
    pub address_line1: String,

    #[validate(length(max = 255))]
    pub address_line2: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,

    #[validate(length(max = 100))]
    pub state: Option<String>,

    #[validate(length(max = 20))]
    pub postal_code: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,

    #[serde(default)]
    pub is_default: bool,
}

impl From<AddressRequest> for CreateAddress {
    fn from(req: AddressRequest) -> Self {
        CreateAddress {
            address_type: req.address_type,
            label: req.label,
            address_line1: req.address_line1,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            country: req.country,
            is_default: req.is_default,
        }
    }
}

/// List customers, optionally filtered by `status` and `business_type`
pub async fn list_customers(
    State(state): State<AppState>,
    identity: Identity,
    Query(filter): Query<CustomerFilter>,
) -> ApiResult<Json<Vec<Customer>>> {
    authorize(identity.context(), Resource::Customer, Action::List)?;
    Ok(Json(Customer::list(&state.db, &filter).await?))
}

/// Create a profile for an existing client user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the user is not a client
/// - `404 Not Found`: No such user
/// - `409 Conflict`: The user already has a profile
pub async fn create_customer(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    authorize(identity.context(), Resource::Customer, Action::Create)?;

    let customer = Customer::create(&state.db, req.into()).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn customer_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<CustomerStats>> {
    authorize(identity.context(), Resource::Statistics, Action::Read)?;
    Ok(Json(Customer::stats(&state.db).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Customer>> {
    let visibility = authorize(identity.context(), Resource::Customer, Action::Read)?;
    Ok(Json(Customer::find_visible(&state.db, id, visibility).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    authorize(identity.context(), Resource::Customer, Action::Update)?;
    Ok(Json(Customer::update(&state.db, id, req.into()).await?))
}

/// Delete a customer profile; the client user is kept
pub async fn delete_customer(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    authorize(identity.context(), Resource::Customer, Action::Delete)?;

    Customer::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Shipments owned by the customer's user
pub async fn customer_shipments(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Shipment>>> {
    let visibility = authorize(identity.context(), Resource::Customer, Action::Read)?;
    let customer = Customer::find_visible(&state.db, id, visibility).await?;

    let shipments = Shipment::list(&state.db, Visibility::Customer(customer.user_id)).await?;
    Ok(Json(shipments))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<CustomerAddress>>> {
    let visibility = authorize(identity.context(), Resource::CustomerAddress, Action::List)?;
    let customer = Customer::find_visible(&state.db, id, visibility).await?;

    Ok(Json(CustomerAddress::list_for_customer(&state.db, customer.id).await?))
}

/// Add an address to a customer
///
/// A new default address demotes the previous default.
pub async fn add_address(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<AddressRequest>,
) -> ApiResult<(StatusCode, Json<CustomerAddress>)> {
    let visibility = authorize(identity.context(), Resource::CustomerAddress, Action::Create)?;
    let customer = Customer::find_visible(&state.db, id, visibility).await?;

    let address = CustomerAddress::create(&state.db, customer.id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::post,
};

use crate::{
    application::usecases::checkout::CheckoutUseCase,
    auth::SessionUser,
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{payments::PaymentProvider, purchases::PurchaseRepository},
        value_objects::checkout::CheckoutRequestModel,
    },
    infrastructure::{
        axum_http::error_responses::AppError,
        payments::stripe_client::StripeClient,
        postgres::{postgres_connection::PgPoolSquad, repositories::purchases::PurchasePostgres},
    },
};

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Router {
    let purchases_repository = PurchasePostgres::new(Arc::clone(&db_pool));
    let payment_provider = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.currency.clone(),
    );
    let checkout_usecase = CheckoutUseCase::new(
        Arc::new(purchases_repository),
        Arc::new(payment_provider),
        config.base_url.clone(),
    );

    Router::new()
        .route("/checkout-session", post(create_checkout_session))
        .with_state(Arc::new(checkout_usecase))
}

pub async fn create_checkout_session<T, P>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<T, P>>>,
    session_user: SessionUser,
    payload: Result<Json<CheckoutRequestModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    T: PurchaseRepository + Send + Sync + 'static,
    P: PaymentProvider + Send + Sync + 'static,
{
    let Json(model) =
        payload.map_err(|err| AppError::BadRequest(format!("invalid request body: {}", err)))?;

    if model.content_id.is_empty() || model.title.is_empty() || model.price <= 0 {
        return Err(AppError::BadRequest(
            "required checkout fields are missing".to_string(),
        ));
    }

    // The extractor guarantees a session; the identifier itself can still
    // be empty on a malformed token.
    if session_user.user_identifier.is_empty() {
        return Err(AppError::BadRequest(
            "user identifier is unavailable".to_string(),
        ));
    }

    let response = checkout_usecase
        .create_checkout_session(&session_user.user_identifier, model)
        .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::SessionUser;
    use crate::domain::repositories::payments::MockPaymentProvider;
    use crate::domain::repositories::purchases::MockPurchaseRepository;
    use crate::domain::value_objects::checkout::ContentType;

    fn handler_state(
        purchases: MockPurchaseRepository,
        provider: MockPaymentProvider,
    ) -> Arc<CheckoutUseCase<MockPurchaseRepository, MockPaymentProvider>> {
        Arc::new(CheckoutUseCase::new(
            Arc::new(purchases),
            Arc::new(provider),
            "https://store.example".to_string(),
        ))
    }

    fn session_user(user_identifier: &str) -> SessionUser {
        SessionUser {
            user_identifier: user_identifier.to_string(),
            display_name: None,
            email: None,
            avatar_url: None,
        }
    }

    fn request(content_id: &str, price: i32) -> CheckoutRequestModel {
        CheckoutRequestModel {
            content_id: content_id.to_string(),
            price,
            title: "Intro".to_string(),
            content_type: ContentType::Book,
        }
    }

    #[tokio::test]
    async fn non_positive_price_is_a_bad_request() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().times(0);
        let mut provider = MockPaymentProvider::new();
        provider.expect_create_checkout_session().times(0);

        let err = create_checkout_session(
            State(handler_state(purchases, provider)),
            session_user("42"),
            Ok(Json(request("intro-book", 0))),
        )
        .await
        .err()
        .unwrap();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn empty_content_id_is_a_bad_request() {
        let mut provider = MockPaymentProvider::new();
        provider.expect_create_checkout_session().times(0);

        let err = create_checkout_session(
            State(handler_state(MockPurchaseRepository::new(), provider)),
            session_user("42"),
            Ok(Json(request("", 1500))),
        )
        .await
        .err()
        .unwrap();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn empty_user_identifier_is_a_bad_request() {
        let mut provider = MockPaymentProvider::new();
        provider.expect_create_checkout_session().times(0);

        let err = create_checkout_session(
            State(handler_state(MockPurchaseRepository::new(), provider)),
            session_user(""),
            Ok(Json(request("intro-book", 1500))),
        )
        .await
        .err()
        .unwrap();

        assert!(matches!(err, AppError::BadRequest(_)));
    }
}

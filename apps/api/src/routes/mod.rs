pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::feedback;
use crate::interviewers;
use crate::interviews;
use crate::phone_numbers;
use crate::responses;
use crate::state::AppState;
use crate::webhook;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Call lifecycle
        .route(
            "/api/register-call",
            post(responses::handlers::handle_register_call),
        )
        .route("/api/get-call", post(responses::handlers::handle_get_call))
        .route(
            "/api/responses/:callId",
            get(responses::handlers::handle_get_response)
                .delete(responses::handlers::handle_delete_response),
        )
        .route(
            "/api/response-webhook",
            post(webhook::handlers::handle_response_webhook),
        )
        .route(
            "/api/test-webhook",
            get(webhook::handlers::handle_test_webhook_get)
                .post(webhook::handlers::handle_test_webhook_post),
        )
        // Phone numbers
        .route(
            "/api/phone-numbers",
            get(phone_numbers::handlers::handle_list),
        )
        .route(
            "/api/phone-numbers/acquire",
            post(phone_numbers::handlers::handle_acquire),
        )
        .route(
            "/api/phone-numbers/link",
            post(phone_numbers::handlers::handle_link),
        )
        .route(
            "/api/phone-numbers/unlink",
            post(phone_numbers::handlers::handle_unlink),
        )
        .route(
            "/api/phone-numbers/calls",
            get(phone_numbers::handlers::handle_calls),
        )
        .route(
            "/api/phone-numbers/calls/:phoneNumber",
            get(phone_numbers::handlers::handle_calls_for_number),
        )
        .route(
            "/api/phone-numbers/list-agent-calls",
            post(phone_numbers::handlers::handle_list_agent_calls),
        )
        // Interviews
        .route(
            "/api/interviews/:interviewId",
            get(interviews::handlers::handle_get_interview),
        )
        .route(
            "/api/interviews/:interviewId/update",
            post(interviews::handlers::handle_update_interview),
        )
        .route(
            "/api/interviews/:interviewId/respondents",
            get(responses::handlers::handle_get_respondent_emails),
        )
        .route(
            "/api/interviewers/:interviewerId",
            get(interviewers::handlers::handle_get_interviewer),
        )
        // Candidate feedback
        .route("/api/feedback", post(feedback::handle_submit_feedback))
        .with_state(state)
}

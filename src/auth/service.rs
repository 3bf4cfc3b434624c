use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    AuthPayload, ChangePasswordRequest, EmailRequest, LoginRequest, ProfileUpdate,
    RegisterRequest, ResetPasswordRequest, ResetTokenPayload, UserPayload, VerifyOtpRequest,
};
use crate::client::ApiClient;
use crate::response::{normalize, Ack, ApiOutcome};
use crate::validate::{is_valid_email, is_valid_otp};

const INVALID_OTP_MESSAGE: &str = "OTP must be exactly 5 digits";
const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// One method per auth capability of the backend.
///
/// Every method resolves to an [`ApiOutcome`]; nothing here returns `Err`.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn send_registration_otp(&self, email: &str) -> ApiOutcome<Ack> {
        if !is_valid_email(email) {
            warn!("verification code rejected before request: malformed email");
            return ApiOutcome::failure(INVALID_EMAIL_MESSAGE);
        }
        normalize(
            self.client.post("/auth/send-otp", &EmailRequest { email }).await,
            "Failed to send verification code",
        )
    }

    #[instrument(skip(self, request))]
    pub async fn register(&self, request: &RegisterRequest) -> ApiOutcome<AuthPayload> {
        if !is_valid_otp(&request.otp) {
            warn!("registration rejected before request: malformed OTP");
            return ApiOutcome::failure(INVALID_OTP_MESSAGE);
        }
        let outcome = normalize(
            self.client.post("/auth/register", request).await,
            "Registration failed",
        );
        if outcome.success {
            info!(email = %request.email, "user registered");
        }
        outcome
    }

    /// `identifier` may be an email or a username; it is sent as both
    /// candidate keys and the backend discriminates.
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> ApiOutcome<AuthPayload> {
        let body = LoginRequest {
            email: identifier,
            username: identifier,
            password,
        };
        normalize(self.client.post("/auth/login", &body).await, "Login failed")
    }

    /// Always reports success: the caller's contract is that local state can
    /// be dropped whether or not the backend acknowledged the logout.
    pub async fn logout(&self) -> ApiOutcome<Ack> {
        let outcome: ApiOutcome<Ack> =
            normalize(self.client.post_empty("/auth/logout").await, "Logout failed");
        if outcome.success {
            return outcome;
        }
        warn!(message = %outcome.message, "remote logout failed, reporting local success");
        ApiOutcome {
            success: true,
            message: "Logged out successfully".to_string(),
            payload: Some(Ack {}),
        }
    }

    pub async fn get_profile(&self) -> ApiOutcome<UserPayload> {
        normalize(
            self.client.get("/auth/profile").await,
            "Failed to load profile",
        )
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiOutcome<UserPayload> {
        normalize(
            self.client.put("/auth/profile", update).await,
            "Failed to update profile",
        )
    }

    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> ApiOutcome<Ack> {
        let body = ChangePasswordRequest {
            old_password,
            new_password,
        };
        normalize(
            self.client.post("/auth/change-password", &body).await,
            "Failed to change password",
        )
    }

    /// Multipart upload under the `avatar` field; MIME is sniffed from the
    /// filename extension, defaulting to `image/jpeg`.
    pub async fn update_avatar(&self, filename: &str, bytes: Bytes) -> ApiOutcome<UserPayload> {
        normalize(
            self.client
                .post_multipart("/auth/avatar", "avatar", filename, bytes, None)
                .await,
            "Failed to update avatar",
        )
    }

    pub async fn delete_avatar(&self) -> ApiOutcome<UserPayload> {
        normalize(
            self.client.delete("/auth/avatar").await,
            "Failed to delete avatar",
        )
    }

    /// Startup check for a persisted session.
    pub async fn verify_token(&self) -> ApiOutcome<UserPayload> {
        normalize(self.client.get("/auth/verify").await, "Invalid token")
    }

    pub async fn forgot_password_send_otp(&self, email: &str) -> ApiOutcome<Ack> {
        if !is_valid_email(email) {
            warn!("password reset rejected before request: malformed email");
            return ApiOutcome::failure(INVALID_EMAIL_MESSAGE);
        }
        normalize(
            self.client
                .post("/auth/forgot-password/send-otp", &EmailRequest { email })
                .await,
            "Failed to send reset code",
        )
    }

    pub async fn forgot_password_verify_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> ApiOutcome<ResetTokenPayload> {
        if !is_valid_otp(otp) {
            warn!("password reset rejected before request: malformed OTP");
            return ApiOutcome::failure(INVALID_OTP_MESSAGE);
        }
        normalize(
            self.client
                .post(
                    "/auth/forgot-password/verify-otp",
                    &VerifyOtpRequest { email, otp },
                )
                .await,
            "Invalid or expired code",
        )
    }

    pub async fn forgot_password_reset(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> ApiOutcome<Ack> {
        let body = ResetPasswordRequest {
            email,
            reset_token,
            new_password,
        };
        normalize(
            self.client.post("/auth/forgot-password/reset", &body).await,
            "Failed to reset password",
        )
    }
}

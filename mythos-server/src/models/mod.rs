mod account;
mod pending;
mod requests;
mod user;

pub use account::AccountSummary;
pub use pending::PendingAuthorization;
pub use requests::{
    AddAccountRequest, BeginOAuthResponse, CallbackParams, CompleteOAuthRequest,
    DeleteAccountParams, DeleteAccountResponse, HealthResponse, QrParams, UserInfo,
    ValidateResponse,
};
pub use user::User;

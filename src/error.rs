use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in. Run `forum-admin login` first")]
    NotLoggedIn,

    #[error("No response from server: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized. Please check your credentials.")]
    Unauthorized,

    #[error("Server error ({0}). Please try again later.")]
    Server(StatusCode),

    #[error("Request failed ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    InvalidResponse(String),

    #[error("Session store error: {0}")]
    SessionStore(#[from] std::io::Error),
}

#[derive(Debug, serde::Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Map a non-success response. `bad_request` is the message used for a
    /// 400 whose body carries no `message` or `error` field.
    pub fn from_status(status: StatusCode, body: &str, bad_request: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let detail = parsed.message.or(parsed.error);

        match status {
            StatusCode::BAD_REQUEST => {
                ApiError::BadRequest(detail.unwrap_or_else(|| bad_request.to_string()))
            }
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            s if s.is_server_error() => ApiError::Server(s),
            s => ApiError::Status {
                status: s,
                message: detail.unwrap_or_else(|| body.trim().to_string()),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Client-side form validation failures.
#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("Title and body are required")]
    TitleAndBodyRequired,

    #[error("Reply content is required")]
    ReplyRequired,

    #[error("Pricing option needs a name and a price")]
    PricingIncomplete,

    #[error("Discount option needs a name and a percentage")]
    DiscountIncomplete,

    #[error("{field} is required")]
    FieldRequired { field: &'static str },

    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

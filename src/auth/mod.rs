/// Authentication module
///
/// Password hashing, session token (JWT) issuance/validation, refresh token
/// management, and extraction of credentials from requests.

mod claims;
mod extractors;
mod headers;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, TOKEN_ISSUER};
pub use extractors::{AuthenticatedUser, BearerToken, PolkaApiKey};
pub use headers::{get_api_key, get_bearer_token};
pub use jwt::{generate_access_token, make_jwt, validate_jwt, ACCESS_TOKEN_TTL_SECONDS};
pub use password::{hash_password, verify_password, MAX_PASSWORD_BYTES};
pub use refresh_token::{
    generate_refresh_token, lookup_refresh_token, revoke_refresh_token, save_refresh_token,
    validate_refresh_token, RefreshTokenRecord,
};

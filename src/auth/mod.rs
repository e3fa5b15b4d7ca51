/// Authentication engine
///
/// Token codec, verifier, revocation ledger and the session issuance
/// flow, plus the bcrypt password wrapper used by the credential store.

pub mod claims;
pub mod jwt;
pub mod ledger;
pub mod password;
pub mod session;
pub mod verifier;

pub use claims::Claims;
pub use claims::TokenKind;
pub use jwt::decode_token;
pub use jwt::encode_token;
pub use password::hash_password;
pub use password::verify_password;
pub use session::ClientMeta;
pub use session::TokenBundle;
pub use verifier::presented_token;
pub use verifier::verify_token;

pub mod broker;
pub mod identity;
pub mod redirect;

pub use broker::{authentication_url, handle_callback, AuthError};
pub use identity::{IdentityProvider, RedditIdentityProvider};
pub use redirect::redirect_uri;

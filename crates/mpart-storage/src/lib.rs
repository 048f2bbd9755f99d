pub mod local;
pub mod options;
pub mod registry;
pub mod sanitize;
pub mod session;
pub mod traits;

pub use local::LocalClient;
pub use options::{AccessCredentials, AppCredentials, BackendOptions, LocalConfig};
pub use registry::{BackendRegistry, ClientFactory, LOCAL_BACKEND};
pub use traits::StoreClient;

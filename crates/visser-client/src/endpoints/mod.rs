pub mod alphavantage;
pub mod coinapi;
pub mod eia;
pub mod finnhub;
pub mod twitter;
pub mod usda;
pub mod wikipedia;

use crate::transport::Transport;
use std::sync::Arc;

/// Base trait for endpoint implementations
///
/// Every provider wraps one rate limited [`Transport`].
pub trait EndpointBase {
  /// Get a reference to the transport layer
  fn transport(&self) -> &Arc<Transport>;

  /// Base URL requests are sent to
  fn base_url(&self) -> &str {
    self.transport().base_url()
  }
}

/// Macro to implement the EndpointBase trait for endpoint structs
macro_rules! impl_endpoint_base {
  ($struct_name:ident) => {
    impl $crate::endpoints::EndpointBase for $struct_name {
      fn transport(&self) -> &std::sync::Arc<$crate::transport::Transport> {
        &self.transport
      }
    }
  };
}

pub(crate) use impl_endpoint_base;


//! Abstract Source/Runner/Target/Service contracts connectors implement
//! against, and the error taxonomy the pipeline executor dispatches on.

mod error;
mod traits;

pub use error::{ConnectorError, ErrorKind};
pub use traits::{Runner, Service, Source, Target};

mod acl;
mod init_data;

pub use acl::{OperatorAclFactory, OperatorAclService};
pub use init_data::{InitDataMiddlewareFactory, InitDataMiddlewareService};

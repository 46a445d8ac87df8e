pub mod host_validation;
pub use host_validation::{is_domain_host, is_ipv4_host, is_valid_host};

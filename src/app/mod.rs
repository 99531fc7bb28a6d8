pub mod ports;
pub mod validator;
pub mod import_service;
pub mod publish_consumer;
pub mod import_use_case;

#[cfg(test)]
pub(crate) mod testing;

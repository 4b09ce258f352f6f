//! Ports the pipeline talks to.

mod image_list;
mod reporter;
mod transport;

#[cfg(test)]
pub use image_list::MockImageListSource;
pub use image_list::ImageListSource;
#[cfg(test)]
pub use reporter::MockStatusReporter;
pub use reporter::{ReportError, StatusReporter};
#[cfg(test)]
pub use transport::MockRegistryTransport;
pub use transport::RegistryTransport;

//! Pipeline adapters: docker and kubeadm CLIs, status reporters, and
//! in-memory collaborators.

mod docker;
mod http_reporter;
mod kubeadm;
mod memory;
mod store_reporter;

pub use docker::DockerCliTransport;
pub use http_reporter::{DEFAULT_CALLBACK_TIMEOUT, HttpStatusReporter};
pub use kubeadm::KubeadmImageSource;
pub use memory::{RecordingReporter, RecordingTransport, StaticImageList};
pub use store_reporter::StoreStatusReporter;

//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod check;
pub(crate) mod dev;
pub(crate) mod init;
pub(crate) mod new;
pub(crate) mod serve;

pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;
pub(crate) use dev::DevArgs;
pub(crate) use init::InitArgs;
pub(crate) use new::NewArgs;
pub(crate) use serve::ServeArgs;

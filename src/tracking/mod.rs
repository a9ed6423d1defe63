pub(crate) mod backend;
pub(crate) mod coordinator;
pub(crate) mod detector;
pub(crate) mod slot;
pub(crate) mod template;

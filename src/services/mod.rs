pub(crate) mod notify;
pub(crate) mod tools;

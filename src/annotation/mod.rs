pub(crate) mod erase;
pub(crate) mod history;
pub(crate) mod layers;
pub(crate) mod model;
pub(crate) mod store;
pub(crate) mod visibility;

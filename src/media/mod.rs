pub(crate) mod video;

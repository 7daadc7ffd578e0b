pub(crate) mod format;
pub(crate) mod screen;
pub(crate) mod symbols;

pub(crate) mod file_writer;
pub(crate) mod xml;
pub(crate) mod zip;

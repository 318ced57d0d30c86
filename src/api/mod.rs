pub mod image_stream;
pub mod project;
pub mod prow_job;

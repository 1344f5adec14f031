mod common;
mod hmr_test;
mod pipeline_test;

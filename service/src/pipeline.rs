pub mod generic_pipeline;
pub mod pipeline_step;

use crate::{
    bootcamp_deletion::{
        context::BootcampDeletionContext,
        steps::{CleanupCapabilitiesStep, DeleteBootcampStep, EnumerateCapabilitiesStep},
    },
    pipeline::generic_pipeline::Pipeline,
};

impl Pipeline<BootcampDeletionContext> {
    pub fn new() -> Self {
        Self::with_steps(vec![
            Box::new(EnumerateCapabilitiesStep),
            Box::new(CleanupCapabilitiesStep),
            Box::new(DeleteBootcampStep),
        ])
    }
}

impl Default for Pipeline<BootcampDeletionContext> {
    fn default() -> Self {
        Self::new()
    }
}
